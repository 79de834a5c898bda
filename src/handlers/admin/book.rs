use axum::{
    extract::{Form, Multipart, Path, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use maud::{html, Markup};
use rust_i18n::t;

use super::{extract_body_limit, read_editor_upload};
use crate::{
    drafts::{BookDraft, DraftAction},
    extractors::{AdminGuard, IsHtmx, Locale},
    handlers::{draft_error_message, extraction_error_message, HX_PUSH_URL},
    names,
    rejections::{AppError, ResultExt},
    utils,
    views::{self, admin as admin_views, components},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::ADMIN_BOOKS_URL, get(book_list))
        .route(names::NEW_BOOK_URL, get(new_book))
        .route("/admin/books/{slug}/edit", get(edit_book))
        .route("/admin/books/{slug}", delete(delete_book))
        .route(names::BOOK_DRAFT_URL, post(update_draft))
        .route(names::SAVE_BOOK_URL, post(save_book))
        .route(
            names::EXTRACT_BOOK_URL,
            post(extract_pages).layer(extract_body_limit()),
        )
}

fn editor_title(draft: &BookDraft, locale: &str) -> String {
    if draft.is_new() {
        t!("admin.new_book", locale = locale).to_string()
    } else {
        t!("admin.edit_book", locale = locale).to_string()
    }
}

fn editor(state: &AppState, draft: &BookDraft, error: Option<&str>, locale: &str) -> Markup {
    views::titled(
        &editor_title(draft, locale),
        admin_views::book_editor(draft, state.extraction.is_enabled(), error, locale),
    )
}

async fn book_list(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let books = state.db.list_books().await.reject("could not get books")?;

    Ok(views::render(
        is_htmx,
        &t!("admin.books_title", locale = &locale),
        admin_views::book_list(books, &locale),
        &locale,
        Some(&user),
    ))
}

async fn new_book(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Markup {
    let draft = BookDraft::new(utils::current_year());

    views::render(
        is_htmx,
        &editor_title(&draft, &locale),
        admin_views::book_editor(&draft, state.extraction.is_enabled(), None, &locale),
        &locale,
        Some(&user),
    )
}

async fn edit_book(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let book = state
        .db
        .get_book(&slug)
        .await
        .reject("could not get book")?
        .ok_or(AppError::NotFound)?;
    let draft = BookDraft::from_book(&book);

    Ok(views::render(
        is_htmx,
        &editor_title(&draft, &locale),
        admin_views::book_editor(&draft, state.extraction.is_enabled(), None, &locale),
        &locale,
        Some(&user),
    ))
}

async fn update_draft(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Markup, AppError> {
    let action = fields
        .iter()
        .find(|(k, _)| k == "action")
        .and_then(|(_, v)| DraftAction::parse(v))
        .ok_or(AppError::Input("unknown editor action"))?;

    let mut draft = BookDraft::from_fields(&fields, utils::current_year());
    draft.apply(action);

    Ok(editor(&state, &draft, None, &locale))
}

async fn save_book(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let draft = BookDraft::from_fields(&fields, utils::current_year());
    let books = state.db.list_books().await.reject("could not get books")?;

    let book = match draft.validate(&books) {
        Ok(book) => book,
        Err(e) => {
            tracing::info!("book draft rejected: {e}");
            let message = draft_error_message(&e, &locale);
            return Ok(editor(&state, &draft, Some(message.as_str()), &locale).into_response());
        }
    };

    if draft.is_new() {
        state
            .db
            .insert_book(&book)
            .await
            .reject("could not insert book")?;
    } else if !state
        .db
        .update_book(&book)
        .await
        .reject("could not update book")?
    {
        return Err(AppError::NotFound);
    }
    tracing::info!("book {} saved by admin {}", book.slug, user.id);

    let books = state.db.list_books().await.reject("could not get books")?;
    let body = html! {
        (views::titled(&t!("admin.books_title", locale = &locale), admin_views::book_list(books, &locale)))
        (components::oob_toast(
            components::ToastKind::Success,
            &t!("admin.book_saved", locale = &locale, name = book.title),
        ))
    };

    let mut headers = HeaderMap::new();
    headers.insert(HX_PUSH_URL, HeaderValue::from_static(names::ADMIN_BOOKS_URL));
    Ok((headers, body).into_response())
}

async fn delete_book(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let deleted = state
        .db
        .delete_book(&slug)
        .await
        .reject("could not delete book")?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    tracing::info!("book {slug} deleted by admin {}", user.id);

    Ok(components::oob_toast(
        components::ToastKind::Success,
        &t!("admin.deleted", locale = &locale),
    ))
}

/// Photos of book pages to pages appended to the draft being edited.
async fn extract_pages(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    multipart: Multipart,
) -> Result<Markup, AppError> {
    let upload = read_editor_upload(multipart)
        .await
        .reject_input("could not read upload")?;
    let mut draft = BookDraft::from_fields(&upload.fields, utils::current_year());

    let Some(image) = upload.image else {
        let message = t!("extraction.no_image", locale = &locale);
        return Ok(editor(&state, &draft, Some(&*message), &locale));
    };

    match state.extraction.extract_book(&image).await {
        Ok(extraction) => {
            let count = extraction.pages.len();
            draft.merge_extraction(extraction);
            Ok(html! {
                (editor(&state, &draft, None, &locale))
                (components::oob_toast(
                    components::ToastKind::Success,
                    &t!("extraction.pages_added", locale = &locale, count = count),
                ))
            })
        }
        Err(e) => {
            tracing::warn!("book extraction failed: {e}");
            let message = extraction_error_message(&e, &locale);
            Ok(editor(&state, &draft, Some(message.as_str()), &locale))
        }
    }
}
