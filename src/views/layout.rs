use maud::{html, Markup, DOCTYPE};
use rust_i18n::t;

use crate::{db::models::AuthUser, names, utils, views::components};

/// Error responses are swapped too, so rejected actions can show their toast.
const HTMX_CONFIG: &str = r#"{"responseHandling":[{"code":"204","swap":false},{"code":"[23]..","swap":true},{"code":"[45]..","swap":true,"error":true}]}"#;

fn css() -> Markup {
    html! {
        link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
        link rel="stylesheet" href="/static/index.css";
    }
}

fn js() -> Markup {
    html! {
        meta name="htmx-config" content=(HTMX_CONFIG);
        script src="https://unpkg.com/htmx.org@2.0.4" {}
    }
}

fn icon() -> Markup {
    html! {
        link rel="icon" href="/static/img/icon.svg" type="image/svg+xml" {}
    }
}

fn locale_switch(locale: &str) -> Markup {
    html! {
        li {
            @for lang in names::SUPPORTED_LOCALES {
                @if *lang == locale {
                    strong."locale-current" { (lang.to_uppercase()) }
                } @else {
                    a href="#"
                      hx-post=(names::SET_LOCALE_URL)
                      hx-vals=(format!(r#"{{"locale":"{lang}"}}"#))
                      hx-swap="none" {
                        (lang.to_uppercase())
                    }
                }
                " "
            }
        }
    }
}

fn header(locale: &str, user: Option<&AuthUser>) -> Markup {
    html! {
        header {
            nav {
                ul {
                    li {
                        (components::nav_link(names::HOME_URL, html! { strong { "Quizbook" } }))
                    }
                    li { (components::nav_link(names::HOME_URL, html! { (t!("nav.quizzes", locale = locale)) })) }
                    li { (components::nav_link(names::BOOKS_URL, html! { (t!("nav.books", locale = locale)) })) }
                    @if user.is_some_and(|u| u.is_admin) {
                        li { (components::nav_link(names::ADMIN_BOOKS_URL, html! { (t!("nav.admin_books", locale = locale)) })) }
                    }
                }
                ul {
                    (locale_switch(locale))
                    @if let Some(user) = user {
                        li."secondary" { (user.email) }
                        li {
                            button."outline secondary"
                                hx-post=(names::LOGOUT_URL)
                                hx-swap="none" {
                                (t!("nav.logout", locale = locale))
                            }
                        }
                    } @else {
                        li { (components::nav_link(names::LOGIN_URL, html! { (t!("nav.login", locale = locale)) })) }
                        li { (components::nav_link(names::REGISTER_URL, html! { (t!("nav.register", locale = locale)) })) }
                    }
                }
            }
        }
    }
}

fn footer() -> Markup {
    html! {
        footer {
            small."secondary" { "Quizbook " (utils::VERSION) }
        }
    }
}

pub fn page(title: &str, body: Markup, locale: &str, user: Option<&AuthUser>) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(locale) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="color-scheme" content="light dark";

                (css())
                (js())
                (icon())

                title { (format!("{title} - Quizbook")) }
            }

            body."container" {
                (header(locale, user))
                main { (body) }
                div id="toasts" aria-live="polite" {}
                (footer())
            }
        }
    }
}

/// Fragment for htmx swaps into `main`; htmx picks up the `title` element.
pub fn titled(title: &str, body: Markup) -> Markup {
    html! {
        title { (title) " - Quizbook" }
        (body)
    }
}

/// Full page for plain navigation, fragment for htmx.
pub fn render(
    is_htmx: bool,
    title: &str,
    body: Markup,
    locale: &str,
    user: Option<&AuthUser>,
) -> Markup {
    if is_htmx {
        titled(title, body)
    } else {
        page(title, body, locale, user)
    }
}

pub fn error_page(status: u16, message: &str) -> Markup {
    page(
        &status.to_string(),
        html! {
            h1 { (status) }
            (components::toast(components::ToastKind::Error, message))
            p { a href=(names::HOME_URL) { "Quizbook" } }
        },
        names::DEFAULT_LOCALE,
        None,
    )
}
