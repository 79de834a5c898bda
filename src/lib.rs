rust_i18n::i18n!("locales", fallback = "fr");

pub mod db;
pub mod drafts;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod names;
pub mod play;
pub mod rejections;
pub mod services;
pub mod statics;
pub mod utils;
pub mod views;

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use axum_extra::extract::CookieJar;
use ulid::Ulid;

use crate::services::{auth::AuthService, extraction::ExtractionService};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub auth: AuthService,
    pub extraction: ExtractionService,
    pub secure_cookies: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::homepage::routes())
        .merge(handlers::play::routes())
        .merge(handlers::books::routes())
        .merge(handlers::admin::routes())
        .layer(middleware::from_fn_with_state(state.clone(), ensure_guest))
        .layer(middleware::from_fn(csrf_check))
        .nest("/static", statics::routes())
        .with_state(state)
}

async fn csrf_check(req: Request, next: Next) -> Response {
    let state_changing = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

    if state_changing.contains(req.method()) {
        let has_hx_request = req
            .headers()
            .get("HX-Request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "true");

        if !has_hx_request {
            return (StatusCode::FORBIDDEN, "CSRF check failed").into_response();
        }
    }

    next.run(req).await
}

/// Every visitor gets a guest id on first contact so scores and attempts
/// have an owner before anybody logs in.
async fn ensure_guest(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    if jar
        .get(names::GUEST_COOKIE_NAME)
        .and_then(|c| extractors::guest_key(c.value()))
        .is_some()
    {
        return next.run(req).await;
    }

    let guest_id = Ulid::new().to_string();
    let mut cookies: Vec<String> = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    cookies.push(format!("{}={guest_id}", names::GUEST_COOKIE_NAME));

    match HeaderValue::from_str(&cookies.join("; ")) {
        Ok(value) => {
            req.headers_mut().insert(COOKIE, value);
        }
        Err(e) => tracing::warn!("could not attach guest cookie to request: {e}"),
    }

    let mut resp = next.run(req).await;
    match utils::cookie(
        names::GUEST_COOKIE_NAME,
        &guest_id,
        utils::LONG_MAX_AGE,
        state.secure_cookies,
    ) {
        Ok(cookie) => {
            resp.headers_mut().append(SET_COOKIE, cookie);
        }
        Err(e) => tracing::error!("could not build guest cookie: {e}"),
    }
    resp
}
