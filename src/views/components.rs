use maud::{html, Markup};
use rust_i18n::t;

use crate::models::{OptionKey, Question};

/// htmx navigation link with href fallback + hx-get for in-page swap.
pub fn nav_link(href: &str, body: Markup) -> Markup {
    html! {
        a href=(href)
          hx-get=(href)
          hx-target="main"
          hx-push-url="true"
          hx-swap="innerHTML" {
            (body)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

impl ToastKind {
    fn class(self) -> &'static str {
        match self {
            ToastKind::Success => "toast toast-success",
            ToastKind::Info => "toast toast-info",
            ToastKind::Error => "toast toast-error",
        }
    }
}

pub fn toast(kind: ToastKind, message: &str) -> Markup {
    html! {
        article class=(kind.class()) role="status" { (message) }
    }
}

/// Out-of-band toast appended to `#toasts` alongside any regular swap.
pub fn oob_toast(kind: ToastKind, message: &str) -> Markup {
    html! {
        div hx-swap-oob="beforeend:#toasts" {
            (toast(kind, message))
        }
    }
}

/// The four options of a question, with the correct ones highlighted.
pub fn answer_key(question: &Question, locale: &str) -> Markup {
    html! {
        ul."answer-key" {
            @for (key, text) in question.options.iter() {
                @let correct = question.is_correct_option(key);
                li class=(if correct { "option option-correct" } else { "option" }) {
                    strong { (key.as_str().to_uppercase()) ". " }
                    (text)
                    @if correct {
                        " "
                        mark { (t!("play.correct_answer", locale = locale)) }
                    }
                }
            }
        }
    }
}

pub fn option_label(key: OptionKey) -> String {
    key.as_str().to_uppercase()
}

pub fn answer_labels(keys: impl IntoIterator<Item = OptionKey>) -> String {
    let labels: Vec<String> = keys.into_iter().map(option_label).collect();
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_uppercase_and_joined() {
        assert_eq!(answer_labels([OptionKey::B, OptionKey::D]), "B, D");
        assert_eq!(answer_labels([]), "-");
    }

    #[test]
    fn oob_toast_targets_the_toast_area() {
        let markup = oob_toast(ToastKind::Error, "Nope").into_string();
        assert!(markup.contains(r#"hx-swap-oob="beforeend:#toasts""#));
        assert!(markup.contains("toast-error"));
        assert!(markup.contains("Nope"));
    }
}
