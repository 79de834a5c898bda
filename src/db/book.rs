use color_eyre::Result;
use libsql::params;

use super::helpers::{query_all, query_optional};
use super::models::BookRow;
use super::Db;
use crate::models::Book;

impl Db {
    /// Newest years first, then by title.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let conn = self.connect().await?;
        let rows: Vec<BookRow> = query_all(
            &conn,
            "SELECT slug, title, year, pages FROM books ORDER BY year DESC, title",
            (),
        )
        .await?;

        rows.into_iter().map(BookRow::into_book).collect()
    }

    pub async fn get_book(&self, slug: &str) -> Result<Option<Book>> {
        let conn = self.connect().await?;
        let row: Option<BookRow> = query_optional(
            &conn,
            "SELECT slug, title, year, pages FROM books WHERE slug = ?",
            params![slug],
        )
        .await?;

        row.map(BookRow::into_book).transpose()
    }

    pub async fn insert_book(&self, book: &Book) -> Result<()> {
        let pages = serde_json::to_string(&book.pages)?;
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO books (slug, title, year, pages) VALUES (?, ?, ?, ?)",
            params![book.slug.as_str(), book.title.as_str(), book.year, pages],
        )
        .await?;

        tracing::info!(
            "new book created: slug={}, pages={}",
            book.slug,
            book.pages.len()
        );
        Ok(())
    }

    pub async fn update_book(&self, book: &Book) -> Result<bool> {
        let pages = serde_json::to_string(&book.pages)?;
        let conn = self.connect().await?;

        let affected = conn
            .execute(
                r#"UPDATE books
                   SET title = ?, year = ?, pages = ?, updated_at = CURRENT_TIMESTAMP
                   WHERE slug = ?"#,
                params![book.title.as_str(), book.year, pages, book.slug.as_str()],
            )
            .await?;

        if affected > 0 {
            tracing::info!("book updated: slug={}", book.slug);
        }
        Ok(affected > 0)
    }

    pub async fn delete_book(&self, slug: &str) -> Result<bool> {
        let conn = self.connect().await?;
        let affected = conn
            .execute("DELETE FROM books WHERE slug = ?", params![slug])
            .await?;

        if affected > 0 {
            tracing::info!("book deleted: slug={slug}");
        }
        Ok(affected > 0)
    }
}
