use color_eyre::Result;
use serde::Deserialize;

use super::helpers::from_json_column;
use crate::models::{Book, Quiz, Score};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Key under which this user's scores and attempts are stored.
    pub fn player_key(&self) -> String {
        format!("user:{}", self.id)
    }
}

#[derive(Deserialize)]
pub(super) struct AuthUserRow {
    id: i32,
    email: String,
    is_admin: i64,
}

impl From<AuthUserRow> for AuthUser {
    fn from(row: AuthUserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            is_admin: row.is_admin != 0,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct QuizRow {
    slug: String,
    title: String,
    subtitle: String,
    year: i32,
    page: i32,
    questions: String,
    required_quiz_slug: Option<String>,
}

impl QuizRow {
    pub(super) fn into_quiz(self) -> Result<Quiz> {
        Ok(Quiz {
            questions: from_json_column("quizzes.questions", &self.questions)?,
            slug: self.slug,
            title: self.title,
            subtitle: self.subtitle,
            year: self.year,
            page: self.page,
            required_quiz_slug: self.required_quiz_slug,
        })
    }
}

#[derive(Deserialize)]
pub(super) struct BookRow {
    slug: String,
    title: String,
    year: i32,
    pages: String,
}

impl BookRow {
    pub(super) fn into_book(self) -> Result<Book> {
        Ok(Book {
            pages: from_json_column("books.pages", &self.pages)?,
            slug: self.slug,
            title: self.title,
            year: self.year,
        })
    }
}

#[derive(Deserialize)]
pub(super) struct ScoreRow {
    pub quiz_slug: String,
    pub score: u32,
    pub total: u32,
}

impl ScoreRow {
    pub(super) fn score(&self) -> Score {
        Score {
            score: self.score,
            total: self.total,
        }
    }
}
