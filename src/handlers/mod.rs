use axum::{
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};

use rust_i18n::t;

use crate::{
    drafts::DraftError,
    services::extraction::{ExtractionError, GatewayError},
    views::components::{self, ToastKind},
};

pub mod admin;
pub mod books;
pub mod homepage;
pub mod play;

pub(crate) const HX_RESWAP: HeaderName = HeaderName::from_static("hx-reswap");
pub(crate) const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");
pub(crate) const HX_REFRESH: HeaderName = HeaderName::from_static("hx-refresh");
pub(crate) const HX_PUSH_URL: HeaderName = HeaderName::from_static("hx-push-url");

/// A notification without touching the current page.
pub(crate) fn toast_only(kind: ToastKind, message: &str) -> Response {
    (
        [(HX_RESWAP, HeaderValue::from_static("none"))],
        components::oob_toast(kind, message),
    )
        .into_response()
}

pub(crate) fn draft_error_message(error: &DraftError, locale: &str) -> String {
    match error {
        DraftError::MissingFields => t!("draft.missing_fields", locale = locale),
        DraftError::MissingTitle => t!("draft.missing_title", locale = locale),
        DraftError::IncompleteQuestion(number) => {
            t!("draft.incomplete_question", locale = locale, number = number)
        }
        DraftError::NoCorrectAnswer(number) => {
            t!("draft.no_correct_answer", locale = locale, number = number)
        }
        DraftError::InvalidSlug => t!("draft.invalid_slug", locale = locale),
        DraftError::SlugTaken => t!("draft.slug_taken", locale = locale),
        DraftError::InvalidPage => t!("draft.invalid_page", locale = locale),
        DraftError::UnknownPrerequisite(slug) => {
            t!("draft.unknown_prerequisite", locale = locale, slug = slug)
        }
        DraftError::SelfPrerequisite => t!("draft.self_prerequisite", locale = locale),
        DraftError::PrerequisiteCycle => t!("draft.prerequisite_cycle", locale = locale),
    }
    .to_string()
}

pub(crate) fn extraction_error_message(error: &ExtractionError, locale: &str) -> String {
    match error {
        ExtractionError::NotAnImage => t!("extraction.not_an_image", locale = locale),
        ExtractionError::EmptyImage => t!("extraction.empty_image", locale = locale),
        ExtractionError::TooLarge => t!("extraction.too_large", locale = locale),
        ExtractionError::Gateway(GatewayError::NotConfigured) => {
            t!("extraction.not_configured", locale = locale)
        }
        ExtractionError::Gateway(GatewayError::RateLimited) => {
            t!("extraction.rate_limited", locale = locale)
        }
        ExtractionError::Gateway(GatewayError::PaymentRequired) => {
            t!("extraction.payment_required", locale = locale)
        }
        ExtractionError::Gateway(_) => t!("extraction.gateway_failed", locale = locale),
        ExtractionError::Malformed { .. } => t!("extraction.malformed", locale = locale),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_errors_mention_the_question_number() {
        let message = draft_error_message(&DraftError::NoCorrectAnswer(3), "en");
        assert!(message.contains('3'), "{message}");
    }

    #[test]
    fn unconfigured_gateway_has_its_own_message() {
        let configured = extraction_error_message(
            &ExtractionError::Gateway(GatewayError::NotConfigured),
            "fr",
        );
        let malformed = extraction_error_message(
            &ExtractionError::Gateway(GatewayError::EmptyContent),
            "fr",
        );
        assert_ne!(configured, malformed);
    }
}
