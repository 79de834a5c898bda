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
    drafts::{DraftAction, QuizDraft},
    extractors::{AdminGuard, IsHtmx, Locale},
    handlers::{
        draft_error_message, extraction_error_message, homepage::quiz_selection, HX_PUSH_URL,
    },
    names,
    rejections::{AppError, ResultExt},
    utils,
    views::{self, admin as admin_views, components},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::NEW_QUIZ_URL, get(new_quiz))
        .route("/admin/quizzes/{slug}/edit", get(edit_quiz))
        .route("/admin/quizzes/{slug}", delete(delete_quiz))
        .route(names::QUIZ_DRAFT_URL, post(update_draft))
        .route(names::SAVE_QUIZ_URL, post(save_quiz))
        .route(
            names::EXTRACT_QUIZ_URL,
            post(extract_questions).layer(extract_body_limit()),
        )
}

fn editor_title(draft: &QuizDraft, locale: &str) -> String {
    if draft.is_new() {
        t!("admin.new_quiz", locale = locale).to_string()
    } else {
        t!("admin.edit_quiz", locale = locale).to_string()
    }
}

async fn editor(
    state: &AppState,
    draft: &QuizDraft,
    error: Option<&str>,
    locale: &str,
) -> Result<Markup, AppError> {
    let quizzes = state
        .db
        .list_quizzes()
        .await
        .reject("could not get quizzes")?;

    Ok(admin_views::quiz_editor(
        draft,
        &quizzes,
        state.extraction.is_enabled(),
        error,
        locale,
    ))
}

async fn new_quiz(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let draft = QuizDraft::new(utils::current_year());
    let body = editor(&state, &draft, None, &locale).await?;

    Ok(views::render(
        is_htmx,
        &editor_title(&draft, &locale),
        body,
        &locale,
        Some(&user),
    ))
}

async fn edit_quiz(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let quiz = state
        .db
        .get_quiz(&slug)
        .await
        .reject("could not get quiz")?
        .ok_or(AppError::NotFound)?;
    let draft = QuizDraft::from_quiz(&quiz);
    let body = editor(&state, &draft, None, &locale).await?;

    Ok(views::render(
        is_htmx,
        &editor_title(&draft, &locale),
        body,
        &locale,
        Some(&user),
    ))
}

/// Structural edits (add, remove, reorder) re-render the editor server-side.
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

    let mut draft = QuizDraft::from_fields(&fields, utils::current_year());
    draft.apply(action);

    Ok(views::titled(
        &editor_title(&draft, &locale),
        editor(&state, &draft, None, &locale).await?,
    ))
}

async fn save_quiz(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let draft = QuizDraft::from_fields(&fields, utils::current_year());
    let quizzes = state
        .db
        .list_quizzes()
        .await
        .reject("could not get quizzes")?;

    let quiz = match draft.validate(&quizzes) {
        Ok(quiz) => quiz,
        Err(e) => {
            tracing::info!("quiz draft rejected: {e}");
            let message = draft_error_message(&e, &locale);
            let body = views::titled(
                &editor_title(&draft, &locale),
                editor(&state, &draft, Some(message.as_str()), &locale).await?,
            );
            return Ok(body.into_response());
        }
    };

    if draft.is_new() {
        state
            .db
            .insert_quiz(&quiz)
            .await
            .reject("could not insert quiz")?;
    } else if !state
        .db
        .update_quiz(&quiz)
        .await
        .reject("could not update quiz")?
    {
        return Err(AppError::NotFound);
    }
    tracing::info!("quiz {} saved by admin {}", quiz.slug, user.id);

    let selection = quiz_selection(&state, &user.player_key(), true, &locale).await?;
    let body = html! {
        (views::titled(&t!("selection.title", locale = &locale), selection))
        (components::oob_toast(
            components::ToastKind::Success,
            &t!("admin.quiz_saved", locale = &locale, name = quiz.subtitle),
        ))
    };

    let mut headers = HeaderMap::new();
    headers.insert(HX_PUSH_URL, HeaderValue::from_static(names::HOME_URL));
    Ok((headers, body).into_response())
}

async fn delete_quiz(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let deleted = state
        .db
        .delete_quiz(&slug)
        .await
        .reject("could not delete quiz")?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    tracing::info!("quiz {slug} deleted by admin {}", user.id);

    Ok(components::oob_toast(
        components::ToastKind::Success,
        &t!("admin.deleted", locale = &locale),
    ))
}

/// Photo of a quiz page to questions appended to the draft being edited.
async fn extract_questions(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Locale(locale): Locale,
    multipart: Multipart,
) -> Result<Markup, AppError> {
    let upload = read_editor_upload(multipart)
        .await
        .reject_input("could not read upload")?;
    let mut draft = QuizDraft::from_fields(&upload.fields, utils::current_year());
    let title = editor_title(&draft, &locale);

    let Some(image) = upload.image else {
        let message = t!("extraction.no_image", locale = &locale);
        return Ok(views::titled(
            &title,
            editor(&state, &draft, Some(&*message), &locale).await?,
        ));
    };

    match state.extraction.extract_quiz(&image).await {
        Ok(extraction) => {
            let count = extraction.questions.len();
            draft.merge_extraction(extraction, utils::current_year());
            let body = editor(&state, &draft, None, &locale).await?;
            Ok(html! {
                (views::titled(&title, body))
                (components::oob_toast(
                    components::ToastKind::Success,
                    &t!("extraction.questions_added", locale = &locale, count = count),
                ))
            })
        }
        Err(e) => {
            tracing::warn!("quiz extraction failed: {e}");
            let message = extraction_error_message(&e, &locale);
            Ok(views::titled(
                &title,
                editor(&state, &draft, Some(message.as_str()), &locale).await?,
            ))
        }
    }
}
