use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    drafts::{BookDraft, QuizDraft},
    models::{group_by_year, Book, OptionKey, Question, Quiz},
    names,
    views::components,
};

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(error) = error {
            (components::toast(components::ToastKind::Error, error))
        }
    }
}

fn draft_button(label: &str, action: String, url: &str, class: &str) -> Markup {
    html! {
        button type="button" class=(class) name="action" value=(action) hx-post=(url) {
            (label)
        }
    }
}

/// Text, options and correct-answer checkboxes of one question; `prefix` is
/// `q{i}` for quizzes and `p{p}.q{i}` for book pages.
fn question_fields(prefix: &str, question: &Question, locale: &str) -> Markup {
    html! {
        label {
            (t!("admin.question_text", locale = locale))
            textarea name=(format!("{prefix}.text")) rows="2" { (question.question) }
        }
        div.option-fields {
            @for key in OptionKey::ALL {
                div.option-field {
                    label {
                        input type="checkbox"
                              name=(format!("{prefix}.correct"))
                              value=(key.as_str())
                              checked[question.is_correct_option(key)];
                        (components::option_label(key))
                    }
                    input type="text"
                          name=(format!("{prefix}.{key}"))
                          value=(question.options.get(key))
                          placeholder=(t!("admin.option_placeholder", locale = locale, key = components::option_label(key)));
                }
            }
        }
    }
}

fn extraction_panel(url: &str, enabled: bool, locale: &str) -> Markup {
    html! {
        article.extraction {
            header { strong { (t!("admin.extract_title", locale = locale)) } }
            @if enabled {
                p."secondary" { small { (t!("admin.extract_hint", locale = locale)) } }
                input type="file" name="image" accept="image/*";
                button type="button"
                       class="secondary"
                       hx-post=(url)
                       hx-encoding="multipart/form-data"
                       hx-disabled-elt="this" {
                    (t!("admin.extract_btn", locale = locale))
                }
                span.htmx-indicator { " " (t!("admin.extracting", locale = locale)) }
            } @else {
                p."secondary" { (t!("admin.extract_disabled", locale = locale)) }
            }
        }
    }
}

pub fn quiz_editor(
    draft: &QuizDraft,
    quizzes: &[Quiz],
    extraction_enabled: bool,
    error: Option<&str>,
    locale: &str,
) -> Markup {
    let title = if draft.is_new() {
        t!("admin.new_quiz", locale = locale)
    } else {
        t!("admin.edit_quiz", locale = locale)
    };

    html! {
        h1 { (title) }
        (error_banner(error))
        form id="quiz-editor" hx-post=(names::SAVE_QUIZ_URL) hx-target="main" {
            @if let Some(original) = &draft.original_slug {
                input type="hidden" name="original_slug" value=(original);
            }
            div.grid {
                label {
                    (t!("admin.slug", locale = locale))
                    input name="slug"
                          value=(draft.slug)
                          pattern="[a-z0-9]+(-[a-z0-9]+)*"
                          readonly[!draft.is_new()]
                          required="true";
                }
                label {
                    (t!("admin.year", locale = locale))
                    input type="number" name="year" value=(draft.year);
                }
                label {
                    (t!("admin.page", locale = locale))
                    input type="number" name="page" min="1" value=(draft.page);
                }
            }
            div.grid {
                label {
                    (t!("admin.title", locale = locale))
                    input name="title" value=(draft.title) required="true";
                }
                label {
                    (t!("admin.subtitle", locale = locale))
                    input name="subtitle" value=(draft.subtitle) required="true";
                }
            }
            label {
                (t!("admin.required_quiz", locale = locale))
                select name="required_quiz_slug" {
                    option value="" { (t!("admin.no_prerequisite", locale = locale)) }
                    @for quiz in quizzes.iter().filter(|q| q.slug != draft.slug) {
                        option value=(quiz.slug)
                               selected[draft.required_quiz_slug.as_deref() == Some(quiz.slug.as_str())] {
                            (quiz.subtitle) " (" (quiz.slug) ")"
                        }
                    }
                }
            }

            (extraction_panel(names::EXTRACT_QUIZ_URL, extraction_enabled, locale))

            h2 { (t!("admin.questions", locale = locale, count = draft.questions.len())) }
            @for (idx, question) in draft.questions.iter().enumerate() {
                fieldset.question-editor {
                    legend { (t!("admin.question_number", locale = locale, number = question.id)) }
                    (question_fields(&format!("q{idx}"), question, locale))
                    div.question-actions {
                        @if idx > 0 {
                            (draft_button("↑", format!("move_up:{idx}"), names::QUIZ_DRAFT_URL, "outline secondary"))
                        }
                        @if idx + 1 < draft.questions.len() {
                            (draft_button("↓", format!("move_down:{idx}"), names::QUIZ_DRAFT_URL, "outline secondary"))
                        }
                        (draft_button(&t!("admin.remove_question", locale = locale), format!("remove_question:{idx}"), names::QUIZ_DRAFT_URL, "outline contrast"))
                    }
                }
            }
            p {
                (draft_button(&t!("admin.add_question", locale = locale), "add_question".to_string(), names::QUIZ_DRAFT_URL, "outline"))
            }

            div.editor-actions {
                button type="submit" { (t!("admin.save", locale = locale)) }
                " "
                (components::nav_link(names::HOME_URL, html! { (t!("admin.cancel", locale = locale)) }))
            }
        }
    }
}

pub fn book_editor(
    draft: &BookDraft,
    extraction_enabled: bool,
    error: Option<&str>,
    locale: &str,
) -> Markup {
    let title = if draft.is_new() {
        t!("admin.new_book", locale = locale)
    } else {
        t!("admin.edit_book", locale = locale)
    };

    html! {
        h1 { (title) }
        (error_banner(error))
        form id="book-editor" hx-post=(names::SAVE_BOOK_URL) hx-target="main" {
            @if let Some(original) = &draft.original_slug {
                input type="hidden" name="original_slug" value=(original);
                p."secondary" { small { (t!("admin.slug", locale = locale)) ": " code { (original) } } }
            }
            div.grid {
                label {
                    (t!("admin.title", locale = locale))
                    input name="title" value=(draft.title) required="true";
                }
                label {
                    (t!("admin.year", locale = locale))
                    input type="number" name="year" value=(draft.year);
                }
            }

            (extraction_panel(names::EXTRACT_BOOK_URL, extraction_enabled, locale))

            h2 { (t!("admin.pages", locale = locale, count = draft.pages.len())) }
            @for (p, page) in draft.pages.iter().enumerate() {
                fieldset.page-editor {
                    legend { (t!("books.page", locale = locale, number = page.page_number)) }
                    label {
                        (t!("admin.page_number", locale = locale))
                        input type="number" name=(format!("p{p}.number")) min="1" value=(page.page_number);
                    }
                    @for (idx, question) in page.content.iter().enumerate() {
                        div.question-editor {
                            strong { (t!("admin.question_number", locale = locale, number = question.id)) }
                            (question_fields(&format!("p{p}.q{idx}"), question, locale))
                            (draft_button(&t!("admin.remove_question", locale = locale), format!("remove_page_question:{p}:{idx}"), names::BOOK_DRAFT_URL, "outline contrast"))
                        }
                    }
                    div.question-actions {
                        (draft_button(&t!("admin.add_question", locale = locale), format!("add_page_question:{p}"), names::BOOK_DRAFT_URL, "outline"))
                        (draft_button(&t!("admin.remove_page", locale = locale), format!("remove_page:{p}"), names::BOOK_DRAFT_URL, "outline contrast"))
                    }
                }
            }
            p {
                (draft_button(&t!("admin.add_page", locale = locale), "add_page".to_string(), names::BOOK_DRAFT_URL, "outline"))
            }

            div.editor-actions {
                button type="submit" { (t!("admin.save", locale = locale)) }
                " "
                (components::nav_link(names::ADMIN_BOOKS_URL, html! { (t!("admin.cancel", locale = locale)) }))
            }
        }
    }
}

pub fn book_list(books: Vec<Book>, locale: &str) -> Markup {
    html! {
        h1 { (t!("admin.books_title", locale = locale)) }
        p {
            a role="button"
              href=(names::NEW_BOOK_URL)
              hx-get=(names::NEW_BOOK_URL)
              hx-target="main"
              hx-push-url="true" {
                (t!("admin.new_book", locale = locale))
            }
        }
        @if books.is_empty() {
            p { (t!("books.empty", locale = locale)) }
        }
        @for (year, books) in group_by_year(books, |b| b.year) {
            h2 { (year) }
            table {
                tbody {
                    @for book in &books {
                        tr {
                            td { (book.title) }
                            td { (t!("books.page_count", locale = locale, count = book.pages.len())) }
                            td {
                                (components::nav_link(&names::edit_book_url(&book.slug), html! { (t!("admin.edit", locale = locale)) }))
                                " · "
                                a href="#"
                                  hx-delete=(names::delete_book_url(&book.slug))
                                  hx-confirm=(t!("admin.confirm_delete", locale = locale, name = book.title))
                                  hx-target="closest tr"
                                  hx-swap="outerHTML" {
                                    (t!("admin.delete", locale = locale))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
