use std::fmt::Display;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use rust_i18n::t;

use crate::{names, views};

#[derive(Debug)]
pub enum AppError {
    Internal(&'static str),
    Unauthorized,
    Forbidden,
    NotFound,
    Input(&'static str),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        let locale = names::DEFAULT_LOCALE;
        match self {
            AppError::Internal(_) => t!("errors.internal", locale = locale).to_string(),
            AppError::Unauthorized => t!("errors.unauthorized", locale = locale).to_string(),
            AppError::Forbidden => t!("errors.forbidden", locale = locale).to_string(),
            AppError::NotFound => t!("errors.not_found", locale = locale).to_string(),
            AppError::Input(detail) => {
                format!("{}: {detail}", t!("errors.input", locale = locale))
            }
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Internal(context) => write!(f, "internal error: {context}"),
            AppError::Unauthorized => f.write_str("unauthorized"),
            AppError::Forbidden => f.write_str("forbidden"),
            AppError::NotFound => f.write_str("not found"),
            AppError::Input(detail) => write!(f, "invalid input: {detail}"),
        }
    }
}

/// Full error page for plain requests; htmx requests only get the toast swapped
/// into the notification area.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = views::error_page(status.as_u16(), &self.message());

        (
            status,
            [
                (
                    HeaderName::from_static("hx-retarget"),
                    HeaderValue::from_static("#toasts"),
                ),
                (
                    HeaderName::from_static("hx-reswap"),
                    HeaderValue::from_static("beforeend"),
                ),
                (
                    HeaderName::from_static("hx-reselect"),
                    HeaderValue::from_static(".toast"),
                ),
            ],
            body,
        )
            .into_response()
    }
}

pub trait ResultExt<T> {
    /// Log the underlying error and turn it into a 500.
    fn reject(self, context: &'static str) -> Result<T, AppError>;
    /// Log the underlying error and turn it into a 400.
    fn reject_input(self, context: &'static str) -> Result<T, AppError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn reject(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{context}: {e}");
            AppError::Internal(context)
        })
    }

    fn reject_input(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{context}: {e}");
            AppError::Input(context)
        })
    }
}
