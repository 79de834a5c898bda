use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use maud::Markup;
use rust_i18n::t;

use crate::{
    extractors::{IsHtmx, Locale, Player},
    handlers::toast_only,
    models::{prerequisite_of, OptionKey, Quiz},
    names,
    play::{PlayError, PlayState, Step},
    rejections::{AppError, ResultExt},
    utils,
    views::{self, components::ToastKind, homepage::locked_message, play as play_views},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quiz/{slug}", get(quiz_page))
        .route("/quiz/{slug}/start", post(start_quiz))
        .route(names::PLAY_URL, get(play_page))
        .route("/play/toggle/{key}", post(toggle_option))
        .route(names::VALIDATE_ANSWER_URL, post(validate_answer))
        .route(names::NEXT_QUESTION_URL, post(next_question))
}

enum Access {
    Open(Quiz),
    /// The quiz and why it is locked.
    Locked(Quiz, String),
}

async fn quiz_access(
    state: &AppState,
    player: &Player,
    slug: &str,
    locale: &str,
) -> Result<Access, AppError> {
    let quizzes = state
        .db
        .list_quizzes()
        .await
        .reject("could not get quizzes")?;
    let quiz = quizzes
        .iter()
        .find(|q| q.slug == slug)
        .cloned()
        .ok_or(AppError::NotFound)?;
    let scores = state
        .db
        .scoreboard(&player.key)
        .await
        .reject("could not get scores")?;

    if quiz.is_unlocked(&scores) {
        Ok(Access::Open(quiz))
    } else {
        let message = locked_message(prerequisite_of(&quiz, &quizzes), locale);
        Ok(Access::Locked(quiz, message))
    }
}

async fn quiz_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    player: Player,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Response, AppError> {
    let quiz = match quiz_access(&state, &player, &slug, &locale).await? {
        Access::Open(quiz) => quiz,
        Access::Locked(_, message) if is_htmx => {
            return Ok(toast_only(ToastKind::Info, &message));
        }
        Access::Locked(quiz, message) => {
            return Ok(views::page(
                &quiz.title,
                play_views::locked(&quiz, &message, &locale),
                &locale,
                player.user.as_ref(),
            )
            .into_response());
        }
    };

    let best = state
        .db
        .best_score(&player.key, &quiz.slug)
        .await
        .reject("could not get best score")?;

    Ok(views::render(
        is_htmx,
        &quiz.title,
        play_views::quiz_start(&quiz, best, &locale),
        &locale,
        player.user.as_ref(),
    )
    .into_response())
}

async fn start_quiz(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    player: Player,
    jar: CookieJar,
    Locale(locale): Locale,
) -> Result<Response, AppError> {
    let quiz = match quiz_access(&state, &player, &slug, &locale).await? {
        Access::Open(quiz) => quiz,
        Access::Locked(_, message) => return Ok(toast_only(ToastKind::Info, &message)),
    };
    if quiz.questions.is_empty() {
        return Err(AppError::Input("this quiz has no questions"));
    }

    if let Some(previous) = jar.get(names::ATTEMPT_COOKIE_NAME) {
        state
            .db
            .delete_attempt(previous.value(), &player.key)
            .await
            .reject("could not delete previous attempt")?;
    }

    let play_state = PlayState::new(&quiz.slug);
    let token = state
        .db
        .create_attempt(&player.key, &play_state)
        .await
        .reject("could not start attempt")?;

    let cookie = utils::cookie(
        names::ATTEMPT_COOKIE_NAME,
        &token,
        utils::SESSION_MAX_AGE,
        state.secure_cookies,
    )
    .reject("could not build attempt cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    let body = question_page(&quiz, &play_state, &locale)?;
    Ok((headers, body).into_response())
}

struct Attempt {
    token: String,
    state: PlayState,
    quiz: Quiz,
}

/// `None` when there is no attempt cookie, the attempt belongs to someone
/// else, or its quiz has been deleted since.
async fn load_attempt(
    state: &AppState,
    player: &Player,
    jar: &CookieJar,
) -> Result<Option<Attempt>, AppError> {
    let Some(token) = jar
        .get(names::ATTEMPT_COOKIE_NAME)
        .map(|c| c.value().to_string())
    else {
        return Ok(None);
    };

    let Some(play_state) = state
        .db
        .get_attempt(&token, &player.key)
        .await
        .reject("could not get attempt")?
    else {
        return Ok(None);
    };

    let quiz = state
        .db
        .get_quiz(&play_state.quiz_slug)
        .await
        .reject("could not get quiz")?;

    Ok(quiz.map(|quiz| Attempt {
        token,
        state: play_state,
        quiz,
    }))
}

fn question_page(quiz: &Quiz, play_state: &PlayState, locale: &str) -> Result<Markup, AppError> {
    let question = play_state
        .current(quiz)
        .reject("attempt points past the last question")?;
    Ok(views::titled(
        &quiz.title,
        play_views::question(quiz, play_state, question, locale),
    ))
}

fn no_attempt(locale: &str) -> Markup {
    views::titled(
        &t!("play.no_attempt", locale = locale),
        play_views::no_attempt(locale),
    )
}

async fn play_page(
    State(state): State<AppState>,
    player: Player,
    jar: CookieJar,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let (title, body) = match load_attempt(&state, &player, &jar).await? {
        Some(Attempt {
            state: play_state,
            quiz,
            ..
        }) => {
            let question = play_state
                .current(&quiz)
                .reject("attempt points past the last question")?;
            (
                quiz.title.clone(),
                play_views::question(&quiz, &play_state, question, &locale),
            )
        }
        None => (
            t!("play.no_attempt", locale = &locale).to_string(),
            play_views::no_attempt(&locale),
        ),
    };

    Ok(views::render(
        is_htmx,
        &title,
        body,
        &locale,
        player.user.as_ref(),
    ))
}

async fn toggle_option(
    State(state): State<AppState>,
    Path(key): Path<String>,
    player: Player,
    jar: CookieJar,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let key = OptionKey::parse(&key).ok_or(AppError::NotFound)?;
    let Some(mut attempt) = load_attempt(&state, &player, &jar).await? else {
        return Ok(no_attempt(&locale));
    };

    if attempt.state.toggle(key) {
        state
            .db
            .save_attempt(&attempt.token, &attempt.state)
            .await
            .reject("could not save attempt")?;
    }

    question_page(&attempt.quiz, &attempt.state, &locale)
}

async fn validate_answer(
    State(state): State<AppState>,
    player: Player,
    jar: CookieJar,
    Locale(locale): Locale,
) -> Result<Response, AppError> {
    let Some(mut attempt) = load_attempt(&state, &player, &jar).await? else {
        return Ok(no_attempt(&locale).into_response());
    };

    match attempt.state.validate(&attempt.quiz) {
        Ok(_) => {}
        Err(PlayError::NothingSelected) => {
            return Ok(toast_only(
                ToastKind::Info,
                &t!("play.nothing_selected", locale = &locale),
            ));
        }
        Err(PlayError::NotValidated) | Err(PlayError::OutOfRange(_)) => {
            return Ok(no_attempt(&locale).into_response());
        }
    }

    state
        .db
        .save_attempt(&attempt.token, &attempt.state)
        .await
        .reject("could not save attempt")?;

    Ok(question_page(&attempt.quiz, &attempt.state, &locale)?.into_response())
}

async fn next_question(
    State(state): State<AppState>,
    player: Player,
    jar: CookieJar,
    Locale(locale): Locale,
) -> Result<Response, AppError> {
    let Some(mut attempt) = load_attempt(&state, &player, &jar).await? else {
        return Ok(no_attempt(&locale).into_response());
    };

    let score = match attempt.state.advance(&attempt.quiz) {
        Ok(Step::Next) => {
            state
                .db
                .save_attempt(&attempt.token, &attempt.state)
                .await
                .reject("could not save attempt")?;
            return Ok(question_page(&attempt.quiz, &attempt.state, &locale)?.into_response());
        }
        Ok(Step::Finished(score)) => score,
        Err(PlayError::NotValidated) => {
            return Ok(toast_only(
                ToastKind::Info,
                &t!("play.not_validated", locale = &locale),
            ));
        }
        Err(_) => return Ok(no_attempt(&locale).into_response()),
    };

    let improved = state
        .db
        .save_best_score(&player.key, &attempt.quiz.slug, score)
        .await
        .reject("could not save score")?;
    state
        .db
        .delete_attempt(&attempt.token, &player.key)
        .await
        .reject("could not delete attempt")?;

    tracing::info!(
        "quiz finished: player={}, quiz={}, score={}/{}",
        player.key,
        attempt.quiz.slug,
        score.score,
        score.total
    );

    let clear = utils::clear_cookie(names::ATTEMPT_COOKIE_NAME, state.secure_cookies)
        .reject("could not build clear-attempt cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear);

    let body = views::titled(
        &t!("result.title", locale = &locale),
        play_views::result(&attempt.quiz, &attempt.state, score, improved, &locale),
    );
    Ok((headers, body).into_response())
}
