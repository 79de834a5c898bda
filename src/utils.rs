use axum::http::{header::InvalidHeaderValue, HeaderValue};
use chrono::Datelike;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Session cookies last a month.
pub const SESSION_MAX_AGE: u32 = 30 * 24 * 3600;
/// Guest and language cookies last a year so scores survive between visits.
pub const LONG_MAX_AGE: u32 = 365 * 24 * 3600;

pub fn cookie(
    name: &str,
    value: &str,
    max_age: u32,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age={max_age};{secure} Path=/; SameSite=Strict"
    ))
}

pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(name, "", 0, secure)
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
