use color_eyre::Result;
use libsql::params;

use super::helpers::{query_all, query_optional};
use super::models::ScoreRow;
use super::Db;
use crate::models::{Score, ScoreBoard};

impl Db {
    /// Best scores of a player, keyed by quiz slug.
    pub async fn scoreboard(&self, player: &str) -> Result<ScoreBoard> {
        let conn = self.connect().await?;
        let rows: Vec<ScoreRow> = query_all(
            &conn,
            "SELECT quiz_slug, score, total FROM scores WHERE player = ?",
            params![player],
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let score = row.score();
                (row.quiz_slug, score)
            })
            .collect())
    }

    pub async fn best_score(&self, player: &str, quiz_slug: &str) -> Result<Option<Score>> {
        let conn = self.connect().await?;
        let row: Option<ScoreRow> = query_optional(
            &conn,
            "SELECT quiz_slug, score, total FROM scores WHERE player = ? AND quiz_slug = ?",
            params![player, quiz_slug],
        )
        .await?;

        Ok(row.map(|row| row.score()))
    }

    /// Store the score only when it beats the previous best. Returns whether it was stored.
    ///
    /// The comparison happens inside the upsert, so concurrent finishes cannot lower the best.
    pub async fn save_best_score(
        &self,
        player: &str,
        quiz_slug: &str,
        score: Score,
    ) -> Result<bool> {
        let conn = self.connect().await?;
        let changed = conn
            .execute(
                r#"INSERT INTO scores (player, quiz_slug, score, total) VALUES (?, ?, ?, ?)
                   ON CONFLICT(player, quiz_slug) DO UPDATE
                   SET score = excluded.score, total = excluded.total,
                       updated_at = CURRENT_TIMESTAMP
                   WHERE excluded.score > scores.score"#,
                params![player, quiz_slug, score.score, score.total],
            )
            .await?;

        if changed == 0 {
            tracing::debug!(
                "score {}/{} for {quiz_slug} does not beat the saved one",
                score.score,
                score.total
            );
            return Ok(false);
        }

        tracing::info!(
            "best score saved: player={player}, quiz={quiz_slug}, score={}/{}",
            score.score,
            score.total
        );
        Ok(true)
    }

    /// Move a guest's scores to the account it just logged into, keeping the best of both.
    pub async fn merge_scores(&self, from: &str, into: &str) -> Result<()> {
        for (quiz_slug, score) in self.scoreboard(from).await? {
            self.save_best_score(into, &quiz_slug, score).await?;
        }

        let conn = self.connect().await?;
        conn.execute("DELETE FROM scores WHERE player = ?", params![from])
            .await?;
        Ok(())
    }
}
