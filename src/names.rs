use crate::models::OptionKey;

pub const HOME_URL: &str = "/";
pub const LOGIN_URL: &str = "/login";
pub const REGISTER_URL: &str = "/register";
pub const LOGOUT_URL: &str = "/logout";

pub const USER_SESSION_COOKIE_NAME: &str = "user_session";
pub const GUEST_COOKIE_NAME: &str = "guest";
pub const ATTEMPT_COOKIE_NAME: &str = "attempt";

// play
pub const PLAY_URL: &str = "/play";
pub const VALIDATE_ANSWER_URL: &str = "/play/validate";
pub const NEXT_QUESTION_URL: &str = "/play/next";

pub fn quiz_url(slug: &str) -> String {
    format!("/quiz/{slug}")
}

pub fn start_quiz_url(slug: &str) -> String {
    format!("/quiz/{slug}/start")
}

pub fn toggle_option_url(key: OptionKey) -> String {
    format!("/play/toggle/{key}")
}

// books
pub const BOOKS_URL: &str = "/books";

pub fn book_url(slug: &str) -> String {
    format!("/books/{slug}")
}

pub fn book_page_url(slug: &str, page: usize) -> String {
    format!("/books/{slug}?page={page}")
}

// admin
pub const NEW_QUIZ_URL: &str = "/admin/quizzes/new";
pub const QUIZ_DRAFT_URL: &str = "/admin/quizzes/draft";
pub const SAVE_QUIZ_URL: &str = "/admin/quizzes/save";
pub const EXTRACT_QUIZ_URL: &str = "/admin/quizzes/extract";

pub fn edit_quiz_url(slug: &str) -> String {
    format!("/admin/quizzes/{slug}/edit")
}

pub fn delete_quiz_url(slug: &str) -> String {
    format!("/admin/quizzes/{slug}")
}

pub const ADMIN_BOOKS_URL: &str = "/admin/books";
pub const NEW_BOOK_URL: &str = "/admin/books/new";
pub const BOOK_DRAFT_URL: &str = "/admin/books/draft";
pub const SAVE_BOOK_URL: &str = "/admin/books/save";
pub const EXTRACT_BOOK_URL: &str = "/admin/books/extract";

pub fn edit_book_url(slug: &str) -> String {
    format!("/admin/books/{slug}/edit")
}

pub fn delete_book_url(slug: &str) -> String {
    format!("/admin/books/{slug}")
}

// i18n
pub const LOCALE_COOKIE_NAME: &str = "lang";
pub const DEFAULT_LOCALE: &str = "fr";
pub const SUPPORTED_LOCALES: &[&str] = &["fr", "en"];
pub const SET_LOCALE_URL: &str = "/set-locale";
