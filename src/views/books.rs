use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    models::{group_by_year, Book},
    names,
    views::components,
};

pub fn library(books: Vec<Book>, locale: &str) -> Markup {
    html! {
        h1 { (t!("books.title", locale = locale)) }
        @if books.is_empty() {
            p { (t!("books.empty", locale = locale)) }
        }
        @for (year, books) in group_by_year(books, |b| b.year) {
            section.year-group {
                h2 { (year) }
                div.book-grid {
                    @for book in &books {
                        article.book-card {
                            h3 { (components::nav_link(&names::book_url(&book.slug), html! { (book.title) })) }
                            p."secondary" {
                                (t!("books.page_count", locale = locale, count = book.pages.len()))
                                " · "
                                (t!("selection.question_count", locale = locale, count = book.question_count()))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn pagination(book: &Book, current: usize, locale: &str) -> Markup {
    let last = book.pages.len().saturating_sub(1);

    html! {
        nav.pagination hx-target="main" hx-push-url="true" {
            ul {
                li {
                    button."outline"
                        hx-get=(names::book_page_url(&book.slug, current.saturating_sub(1)))
                        disabled[current == 0] {
                        (t!("books.previous", locale = locale))
                    }
                }
            }
            ul.page-buttons {
                @for (idx, page) in book.pages.iter().enumerate() {
                    li {
                        button class=(if idx == current { "" } else { "outline secondary" })
                               hx-get=(names::book_page_url(&book.slug, idx))
                               aria-current=[(idx == current).then_some("page")] {
                            (page.page_number)
                        }
                    }
                }
            }
            ul {
                li {
                    button."outline"
                        hx-get=(names::book_page_url(&book.slug, (current + 1).min(last)))
                        disabled[current >= last] {
                        (t!("books.next", locale = locale))
                    }
                }
            }
        }
    }
}

/// One page of a book; `page` is already clamped into range.
pub fn reader(book: &Book, page: Option<usize>, locale: &str) -> Markup {
    html! {
        hgroup {
            h1 { (book.title) }
            p { (book.year) }
        }
        @match page.and_then(|idx| book.pages.get(idx).map(|p| (idx, p))) {
            None => {
                p { (t!("books.no_pages", locale = locale)) }
            }
            Some((idx, page)) => {
                (pagination(book, idx, locale))
                article.book-page {
                    header {
                        strong { (t!("books.page", locale = locale, number = page.page_number)) }
                    }
                    @if page.content.is_empty() {
                        p { (t!("books.empty_page", locale = locale)) }
                    }
                    @for question in &page.content {
                        section.book-question {
                            h4 { (question.id) ". " (question.question) }
                            (components::answer_key(question, locale))
                        }
                    }
                }
            }
        }
        p { (components::nav_link(names::BOOKS_URL, html! { (t!("books.back", locale = locale)) })) }
    }
}
