use std::time::Duration;

use color_eyre::Result;
use libsql::params;
use ulid::Ulid;

use super::helpers::from_json_column;
use super::Db;
use crate::play::PlayState;

/// Attempts untouched for longer than this are pruned.
pub const ATTEMPT_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

impl Db {
    /// Start a new attempt and return its token. Stale attempts are pruned on the way.
    pub async fn create_attempt(&self, player: &str, state: &PlayState) -> Result<String> {
        self.prune_attempts(ATTEMPT_MAX_AGE).await?;

        let token = Ulid::new().to_string();
        let json = serde_json::to_string(state)?;
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO attempts (token, player, quiz_slug, state) VALUES (?, ?, ?, ?)",
            params![token.clone(), player, state.quiz_slug.as_str(), json],
        )
        .await?;

        tracing::info!("attempt started: player={player}, quiz={}", state.quiz_slug);
        Ok(token)
    }

    /// Attempts are only visible to the player that started them.
    pub async fn get_attempt(&self, token: &str, player: &str) -> Result<Option<PlayState>> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT state FROM attempts WHERE token = ? AND player = ?",
                params![token, player],
            )
            .await?
            .next()
            .await?;

        match row {
            Some(row) => Ok(Some(from_json_column(
                "attempts.state",
                &row.get::<String>(0)?,
            )?)),
            None => Ok(None),
        }
    }

    pub async fn save_attempt(&self, token: &str, state: &PlayState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let conn = self.connect().await?;

        conn.execute(
            "UPDATE attempts SET state = ?, updated_at = CURRENT_TIMESTAMP WHERE token = ?",
            params![json, token],
        )
        .await?;
        Ok(())
    }

    pub async fn delete_attempt(&self, token: &str, player: &str) -> Result<()> {
        let conn = self.connect().await?;
        conn.execute(
            "DELETE FROM attempts WHERE token = ? AND player = ?",
            params![token, player],
        )
        .await?;
        Ok(())
    }

    /// Drop every attempt of a player, e.g. a guest that just logged in.
    pub async fn delete_player_attempts(&self, player: &str) -> Result<u64> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM attempts WHERE player = ?", params![player])
            .await?;
        Ok(deleted)
    }

    /// Remove attempts not updated within `max_age`. Returns how many went away.
    pub async fn prune_attempts(&self, max_age: Duration) -> Result<u64> {
        let conn = self.connect().await?;
        let pruned = conn
            .execute(
                "DELETE FROM attempts WHERE updated_at <= datetime('now', ?)",
                params![format!("-{} seconds", max_age.as_secs())],
            )
            .await?;

        if pruned > 0 {
            tracing::info!("pruned {pruned} stale attempts");
        }
        Ok(pruned)
    }
}
