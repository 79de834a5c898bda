use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{query_all, query_optional};
use super::models::QuizRow;
use super::Db;
use crate::models::Quiz;

const SEED_QUIZZES: &str = include_str!("../../data/seed_quizzes.json");

const QUIZ_COLUMNS: &str = "slug, title, subtitle, year, page, questions, required_quiz_slug";

impl Db {
    /// Every quiz in play order: page ascending, then slug.
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        let conn = self.connect().await?;
        let rows: Vec<QuizRow> = query_all(
            &conn,
            &format!("SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY page, slug"),
            (),
        )
        .await?;

        rows.into_iter().map(QuizRow::into_quiz).collect()
    }

    pub async fn get_quiz(&self, slug: &str) -> Result<Option<Quiz>> {
        let conn = self.connect().await?;
        let row: Option<QuizRow> = query_optional(
            &conn,
            &format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE slug = ?"),
            params![slug],
        )
        .await?;

        row.map(QuizRow::into_quiz).transpose()
    }

    pub async fn insert_quiz(&self, quiz: &Quiz) -> Result<()> {
        let questions = serde_json::to_string(&quiz.questions)?;
        let conn = self.connect().await?;

        conn.execute(
            r#"INSERT INTO quizzes
                   (slug, title, subtitle, year, page, questions, required_quiz_slug)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                quiz.slug.as_str(),
                quiz.title.as_str(),
                quiz.subtitle.as_str(),
                quiz.year,
                quiz.page,
                questions,
                quiz.required_quiz_slug.clone()
            ],
        )
        .await?;

        tracing::info!(
            "new quiz created: slug={}, questions={}",
            quiz.slug,
            quiz.questions.len()
        );
        Ok(())
    }

    /// Returns false when no quiz has this slug.
    pub async fn update_quiz(&self, quiz: &Quiz) -> Result<bool> {
        let questions = serde_json::to_string(&quiz.questions)?;
        let conn = self.connect().await?;

        let affected = conn
            .execute(
                r#"UPDATE quizzes
                   SET title = ?, subtitle = ?, year = ?, page = ?, questions = ?,
                       required_quiz_slug = ?, updated_at = CURRENT_TIMESTAMP
                   WHERE slug = ?"#,
                params![
                    quiz.title.as_str(),
                    quiz.subtitle.as_str(),
                    quiz.year,
                    quiz.page,
                    questions,
                    quiz.required_quiz_slug.clone(),
                    quiz.slug.as_str()
                ],
            )
            .await?;

        if affected > 0 {
            tracing::info!("quiz updated: slug={}", quiz.slug);
        }
        Ok(affected > 0)
    }

    /// Scores and attempts of the quiz go with it.
    pub async fn delete_quiz(&self, slug: &str) -> Result<bool> {
        let conn = self.connect().await?;
        let tx = conn.transaction().await?;

        tx.execute("DELETE FROM scores WHERE quiz_slug = ?", params![slug])
            .await?;
        tx.execute("DELETE FROM attempts WHERE quiz_slug = ?", params![slug])
            .await?;
        let affected = tx
            .execute("DELETE FROM quizzes WHERE slug = ?", params![slug])
            .await?;
        tx.commit().await?;

        if affected > 0 {
            tracing::info!("quiz deleted: slug={slug}");
        }
        Ok(affected > 0)
    }

    pub async fn count_quizzes(&self) -> Result<u64> {
        let conn = self.connect().await?;
        let count = conn
            .query("SELECT COUNT(*) FROM quizzes", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("could not count quizzes")?
            .get::<u64>(0)?;
        Ok(count)
    }

    /// Insert the built-in quizzes when the quiz table is empty.
    pub async fn seed_quizzes(&self) -> Result<usize> {
        if self.count_quizzes().await? > 0 {
            return Ok(0);
        }

        let quizzes: Vec<Quiz> = serde_json::from_str(SEED_QUIZZES)?;
        for quiz in &quizzes {
            self.insert_quiz(quiz).await?;
        }

        tracing::info!("seeded {} built-in quizzes", quizzes.len());
        Ok(quizzes.len())
    }
}
