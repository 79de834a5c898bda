use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use maud::Markup;
use rust_i18n::t;
use serde::Deserialize;

use crate::{
    extractors::{CurrentUser, IsHtmx, Locale},
    names,
    rejections::{AppError, ResultExt},
    views::{self, books as books_views},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::BOOKS_URL, get(library))
        .route("/books/{slug}", get(reader))
}

async fn library(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
    CurrentUser(user): CurrentUser,
) -> Result<Markup, AppError> {
    let books = state.db.list_books().await.reject("could not get books")?;

    Ok(views::render(
        is_htmx,
        &t!("books.title", locale = &locale),
        books_views::library(books, &locale),
        &locale,
        user.as_ref(),
    ))
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// Anything that is not a page index reads as the first page.
fn requested_page(query: &PageQuery) -> usize {
    query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .map_or(0, |p| usize::try_from(p).unwrap_or(0))
}

async fn reader(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
    CurrentUser(user): CurrentUser,
) -> Result<Markup, AppError> {
    let book = state
        .db
        .get_book(&slug)
        .await
        .reject("could not get book")?
        .ok_or(AppError::NotFound)?;
    let page = book.clamp_page(requested_page(&query));

    Ok(views::render(
        is_htmx,
        &book.title,
        books_views::reader(&book, page, &locale),
        &locale,
        user.as_ref(),
    ))
}
