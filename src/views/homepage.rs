use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    models::{prerequisite_of, Quiz, ScoreBoard},
    names,
    services::auth::MIN_PASSWORD_LENGTH,
    views::components,
};

pub fn locked_message(prerequisite: Option<&Quiz>, locale: &str) -> String {
    match prerequisite {
        Some(required) => t!(
            "selection.locked_requires",
            locale = locale,
            subtitle = required.subtitle
        )
        .to_string(),
        None => t!("selection.locked_unknown", locale = locale).to_string(),
    }
}

fn quiz_card(
    quiz: &Quiz,
    quizzes: &[Quiz],
    scores: &ScoreBoard,
    is_admin: bool,
    locale: &str,
) -> Markup {
    let unlocked = quiz.is_unlocked(scores);
    let score = scores.get(&quiz.slug);
    let url = names::quiz_url(&quiz.slug);

    html! {
        article.quiz-card.locked[!unlocked] {
            header {
                hgroup {
                    h3 {
                        @if !unlocked { "🔒 " }
                        (quiz.title)
                    }
                    p { (quiz.subtitle) }
                }
            }
            p."secondary" {
                (quiz.year) " · "
                (t!("selection.question_count", locale = locale, count = quiz.total()))
            }
            @if let Some(score) = score {
                p {
                    (t!("selection.best_score", locale = locale, score = score.score, total = score.total))
                    @if quiz.is_complete(scores) {
                        " "
                        mark.badge-perfect { (t!("selection.perfect", locale = locale)) }
                    }
                }
            }
            @if !unlocked {
                p."secondary" { small { (locked_message(prerequisite_of(quiz, quizzes), locale)) } }
            }
            footer {
                @if unlocked {
                    (components::nav_link(&url, html! { (t!("selection.open", locale = locale)) }))
                } @else {
                    a href=(url) hx-get=(url) hx-swap="none" {
                        (t!("selection.open", locale = locale))
                    }
                }
                @if is_admin {
                    " · "
                    (components::nav_link(&names::edit_quiz_url(&quiz.slug), html! { (t!("admin.edit", locale = locale)) }))
                    " · "
                    a href="#"
                      hx-delete=(names::delete_quiz_url(&quiz.slug))
                      hx-confirm=(t!("admin.confirm_delete", locale = locale, name = quiz.subtitle))
                      hx-target="closest article"
                      hx-swap="outerHTML" {
                        (t!("admin.delete", locale = locale))
                    }
                }
            }
        }
    }
}

pub fn quiz_selection(
    quizzes: &[Quiz],
    scores: &ScoreBoard,
    is_admin: bool,
    locale: &str,
) -> Markup {
    html! {
        h1 { (t!("selection.title", locale = locale)) }
        p { (t!("selection.description", locale = locale)) }
        @if is_admin {
            p {
                a role="button"
                  href=(names::NEW_QUIZ_URL)
                  hx-get=(names::NEW_QUIZ_URL)
                  hx-target="main"
                  hx-push-url="true" {
                    (t!("admin.new_quiz", locale = locale))
                }
            }
        }
        @if quizzes.is_empty() {
            p { (t!("selection.empty", locale = locale)) }
        }
        div.quiz-grid {
            @for quiz in quizzes {
                (quiz_card(quiz, quizzes, scores, is_admin, locale))
            }
        }
    }
}

pub enum RegisterState {
    NoError,
    InvalidEmail,
    WeakPassword,
    PasswordMismatch,
    EmailTaken,
}

pub fn register(state: RegisterState, email: &str, locale: &str) -> Markup {
    let error_msg = match state {
        RegisterState::NoError => None,
        RegisterState::InvalidEmail => Some(t!("auth.invalid_email", locale = locale)),
        RegisterState::WeakPassword => Some(t!(
            "auth.weak_password",
            locale = locale,
            min = MIN_PASSWORD_LENGTH
        )),
        RegisterState::PasswordMismatch => Some(t!("auth.password_mismatch", locale = locale)),
        RegisterState::EmailTaken => Some(t!("auth.email_taken", locale = locale)),
    }
    .map(|msg| msg.to_string());

    html! {
        h1 { (t!("auth.register_title", locale = locale)) }
        article.auth-card {
            form hx-post=(names::REGISTER_URL) hx-target="main" {
                label {
                    (t!("auth.email", locale = locale))
                    input name="email"
                          type="email"
                          autocomplete="email"
                          required="true"
                          value=(email);
                }
                label {
                    (t!("auth.password", locale = locale))
                    input name="password"
                          type="password"
                          autocomplete="new-password"
                          required="true"
                          minlength=(MIN_PASSWORD_LENGTH)
                          aria-invalid=[error_msg.as_ref().map(|_| "true")];
                }
                label {
                    (t!("auth.confirm_password", locale = locale))
                    input name="confirm_password"
                          type="password"
                          autocomplete="new-password"
                          required="true";
                    @if let Some(msg) = &error_msg {
                        small.error { (msg) }
                    }
                }
                button type="submit" { (t!("auth.register_btn", locale = locale)) }
            }
            p {
                (t!("auth.have_account", locale = locale))
                " "
                (components::nav_link(names::LOGIN_URL, html! { (t!("auth.login_link", locale = locale)) }))
            }
        }
    }
}

pub enum LoginState {
    NoError,
    InvalidCredentials,
}

pub fn login(state: LoginState, locale: &str) -> Markup {
    html! {
        h1 { (t!("auth.login_title", locale = locale)) }
        article.auth-card {
            form hx-post=(names::LOGIN_URL) hx-target="main" {
                label {
                    (t!("auth.email", locale = locale))
                    input name="email" type="email" autocomplete="email" required="true";
                }
                label {
                    (t!("auth.password", locale = locale))
                    @match state {
                        LoginState::NoError => {
                            input name="password" type="password" autocomplete="current-password" required="true";
                        }
                        LoginState::InvalidCredentials => {
                            input name="password" type="password" autocomplete="current-password" required="true" aria-invalid="true";
                            small.error { (t!("auth.invalid_credentials", locale = locale)) }
                        }
                    }
                }
                button type="submit" { (t!("auth.login_btn", locale = locale)) }
            }
            p {
                (t!("auth.no_account", locale = locale))
                " "
                (components::nav_link(names::REGISTER_URL, html! { (t!("auth.register_link", locale = locale)) }))
            }
        }
    }
}
