use axum::{
    extract::{Form, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use maud::Markup;
use rust_i18n::t;
use serde::Deserialize;

use crate::{
    extractors::{guest_key, match_supported_locale, CurrentUser, IsHtmx, Locale, Player},
    handlers::{HX_REDIRECT, HX_REFRESH},
    names,
    rejections::{AppError, ResultExt},
    services::auth::{LoginOutcome, RegisterOutcome},
    utils, views, AppState,
};

use crate::views::homepage as homepage_views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(homepage))
        .route("/register", get(register_page).post(register_post))
        .route("/login", get(login_page).post(login_post))
        .route("/logout", post(logout_post))
        .route("/set-locale", post(set_locale))
}

/// Quiz list with this player's scores and lock states.
pub(crate) async fn quiz_selection(
    state: &AppState,
    player_key: &str,
    is_admin: bool,
    locale: &str,
) -> Result<Markup, AppError> {
    let quizzes = state
        .db
        .list_quizzes()
        .await
        .reject("could not get quizzes")?;
    let scores = state
        .db
        .scoreboard(player_key)
        .await
        .reject("could not get scores")?;

    Ok(homepage_views::quiz_selection(
        &quizzes, &scores, is_admin, locale,
    ))
}

async fn homepage(
    State(state): State<AppState>,
    player: Player,
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
) -> Result<Markup, AppError> {
    let body = quiz_selection(&state, &player.key, player.is_admin(), &locale).await?;

    Ok(views::render(
        is_htmx,
        &t!("selection.title", locale = &locale),
        body,
        &locale,
        player.user.as_ref(),
    ))
}

async fn register_page(
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
    CurrentUser(user): CurrentUser,
) -> Markup {
    views::render(
        is_htmx,
        &t!("auth.register_title", locale = &locale),
        homepage_views::register(homepage_views::RegisterState::NoError, "", &locale),
        &locale,
        user.as_ref(),
    )
}

async fn login_page(
    IsHtmx(is_htmx): IsHtmx,
    Locale(locale): Locale,
    CurrentUser(user): CurrentUser,
) -> Markup {
    views::render(
        is_htmx,
        &t!("auth.login_title", locale = &locale),
        homepage_views::login(homepage_views::LoginState::NoError, &locale),
        &locale,
        user.as_ref(),
    )
}

/// Set the session cookie and reload the app; guest scores move to the account.
async fn logged_in(
    state: &AppState,
    jar: &CookieJar,
    session_token: &str,
) -> Result<Response, AppError> {
    let user = state
        .db
        .get_user_by_session(session_token)
        .await
        .reject("could not get new session")?
        .ok_or(AppError::Internal("session vanished right after login"))?;

    if let Some(guest) = jar
        .get(names::GUEST_COOKIE_NAME)
        .and_then(|c| guest_key(c.value()))
    {
        state
            .db
            .merge_scores(&guest, &user.player_key())
            .await
            .reject("could not merge guest scores")?;
        state
            .db
            .delete_player_attempts(&guest)
            .await
            .reject("could not delete guest attempts")?;
    }

    let cookie = utils::cookie(
        names::USER_SESSION_COOKIE_NAME,
        session_token,
        utils::SESSION_MAX_AGE,
        state.secure_cookies,
    )
    .reject("could not build session cookie")?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    headers.insert(HX_REDIRECT, HeaderValue::from_static(names::HOME_URL));
    Ok((headers, "").into_response())
}

#[derive(Deserialize)]
struct RegisterPost {
    email: String,
    password: String,
    confirm_password: String,
}

async fn register_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Locale(locale): Locale,
    Form(body): Form<RegisterPost>,
) -> Result<Response, AppError> {
    use homepage_views::RegisterState;

    let outcome = state
        .auth
        .register(&body.email, &body.password, &body.confirm_password)
        .await
        .reject("registration failed")?;

    let form_state = match outcome {
        RegisterOutcome::LoggedIn(session_token) => {
            return logged_in(&state, &jar, &session_token).await;
        }
        RegisterOutcome::InvalidEmail => RegisterState::InvalidEmail,
        RegisterOutcome::WeakPassword => RegisterState::WeakPassword,
        RegisterOutcome::PasswordMismatch => RegisterState::PasswordMismatch,
        RegisterOutcome::EmailTaken => RegisterState::EmailTaken,
    };

    Ok(views::titled(
        &t!("auth.register_title", locale = &locale),
        homepage_views::register(form_state, &body.email, &locale),
    )
    .into_response())
}

#[derive(Deserialize)]
struct LoginPost {
    email: String,
    password: String,
}

async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Locale(locale): Locale,
    Form(body): Form<LoginPost>,
) -> Result<Response, AppError> {
    let outcome = state
        .auth
        .login(&body.email, &body.password)
        .await
        .reject("login failed")?;

    match outcome {
        LoginOutcome::Success(session_token) => logged_in(&state, &jar, &session_token).await,
        LoginOutcome::InvalidCredentials => Ok(views::titled(
            &t!("auth.login_title", locale = &locale),
            homepage_views::login(homepage_views::LoginState::InvalidCredentials, &locale),
        )
        .into_response()),
    }
}

async fn logout_post(
    jar: CookieJar,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session_id) = jar
        .get(names::USER_SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
    {
        state
            .auth
            .logout(&session_id)
            .await
            .reject("could not delete session")?;
    }

    let clear = utils::clear_cookie(names::USER_SESSION_COOKIE_NAME, state.secure_cookies)
        .reject("could not build clear-session cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear);
    headers.insert(HX_REDIRECT, HeaderValue::from_static(names::HOME_URL));

    Ok((headers, ""))
}

#[derive(Deserialize)]
struct SetLocaleBody {
    locale: String,
}

async fn set_locale(
    State(state): State<AppState>,
    Form(body): Form<SetLocaleBody>,
) -> Result<impl IntoResponse, AppError> {
    let locale = match_supported_locale(&body.locale).unwrap_or(names::DEFAULT_LOCALE);
    let cookie = utils::cookie(
        names::LOCALE_COOKIE_NAME,
        locale,
        utils::LONG_MAX_AGE,
        state.secure_cookies,
    )
    .reject("could not build locale cookie")?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    headers.insert(HX_REFRESH, HeaderValue::from_static("true"));

    Ok((headers, ""))
}
