use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use ulid::Ulid;

use crate::{db::models::AuthUser, names, rejections::AppError, AppState};

/// Whether the request was issued by htmx (`HX-Request: true`).
pub struct IsHtmx(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for IsHtmx {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_htmx = parts
            .headers
            .get("HX-Request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "true");
        Ok(IsHtmx(is_htmx))
    }
}

/// The `lang` cookie, then the browser's `Accept-Language`, then French.
pub struct Locale(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let locale = jar
            .get(names::LOCALE_COOKIE_NAME)
            .and_then(|c| match_supported_locale(c.value()))
            .or_else(|| {
                parts
                    .headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(locale_from_accept_language)
            })
            .unwrap_or(names::DEFAULT_LOCALE);
        Ok(Locale(locale.to_string()))
    }
}

/// `fr`, `fr-BF`, `en-GB`... map to their primary language when supported.
pub fn match_supported_locale(lang: &str) -> Option<&'static str> {
    let primary = lang.trim().split(['-', '_']).next()?.to_ascii_lowercase();
    names::SUPPORTED_LOCALES
        .iter()
        .copied()
        .find(|supported| *supported == primary)
}

fn locale_from_accept_language(header: &str) -> Option<&'static str> {
    let mut entries: Vec<(&str, f32)> = header
        .split(',')
        .map(|entry| match entry.trim().split_once(';') {
            Some((lang, params)) => {
                let q = params
                    .split(';')
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|v| v.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (lang.trim(), q)
            }
            None => (entry.trim(), 1.0),
        })
        .collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries
        .iter()
        .find_map(|(lang, _)| match_supported_locale(lang))
}

async fn session_user(parts: &Parts, state: &AppState) -> Option<AuthUser> {
    let jar = CookieJar::from_headers(&parts.headers);
    let session_id = jar.get(names::USER_SESSION_COOKIE_NAME)?.value().to_string();

    match state.db.get_user_by_session(&session_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("could not look up user session: {e}");
            None
        }
    }
}

/// The logged-in user, if any.
pub struct CurrentUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(session_user(parts, state).await))
    }
}

/// Only lets admins through; everybody else gets a 403.
pub struct AdminGuard(pub AuthUser);

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Some(user) if user.is_admin => Ok(AdminGuard(user)),
            Some(user) => {
                tracing::warn!("non-admin user {} tried to reach {}", user.id, parts.uri);
                Err(AppError::Forbidden)
            }
            None => Err(AppError::Forbidden),
        }
    }
}

/// Whoever scores and attempts belong to: the logged-in user, otherwise the
/// guest browser identified by its cookie.
pub struct Player {
    pub key: String,
    pub user: Option<AuthUser>,
}

impl Player {
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

pub fn guest_key(guest_id: &str) -> Option<String> {
    Ulid::from_string(guest_id)
        .ok()
        .map(|ulid| format!("guest:{ulid}"))
}

impl FromRequestParts<AppState> for Player {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = session_user(parts, state).await {
            return Ok(Player {
                key: user.player_key(),
                user: Some(user),
            });
        }

        let jar = CookieJar::from_headers(&parts.headers);
        jar.get(names::GUEST_COOKIE_NAME)
            .and_then(|c| guest_key(c.value()))
            .map(|key| Player { key, user: None })
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_variants_fall_back_to_language() {
        assert_eq!(match_supported_locale("fr-BF"), Some("fr"));
        assert_eq!(match_supported_locale("EN_gb"), Some("en"));
        assert_eq!(match_supported_locale("de"), None);
    }

    #[test]
    fn accept_language_respects_quality() {
        assert_eq!(
            locale_from_accept_language("de-DE,de;q=0.9,en;q=0.8,fr;q=0.7"),
            Some("en")
        );
        assert_eq!(locale_from_accept_language("fr;q=0.5, en;q=0.9"), Some("en"));
        assert_eq!(locale_from_accept_language("ja"), None);
    }

    #[test]
    fn guest_ids_must_be_ulids() {
        let ulid = Ulid::new().to_string();
        assert_eq!(guest_key(&ulid), Some(format!("guest:{ulid}")));
        assert_eq!(guest_key("not-a-ulid"), None);
    }
}
