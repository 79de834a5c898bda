use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    models::{OptionKey, Question, Quiz, ResultBand, Score},
    names,
    play::PlayState,
    views::components,
};

/// Landing page of a quiz before an attempt is started.
pub fn quiz_start(quiz: &Quiz, best: Option<Score>, locale: &str) -> Markup {
    html! {
        article.quiz-start {
            header {
                hgroup {
                    h1 { (quiz.title) }
                    p { (quiz.subtitle) }
                }
            }
            p { (t!("selection.question_count", locale = locale, count = quiz.total())) }
            @if let Some(best) = best {
                p { (t!("selection.best_score", locale = locale, score = best.score, total = best.total)) }
            }
            @if quiz.questions.is_empty() {
                p { (t!("play.no_questions", locale = locale)) }
            } @else {
                button hx-post=(names::start_quiz_url(&quiz.slug))
                       hx-target="main"
                       hx-push-url=(names::PLAY_URL) {
                    @if best.is_some() {
                        (t!("play.restart", locale = locale))
                    } @else {
                        (t!("play.start", locale = locale))
                    }
                }
            }
        }
    }
}

pub fn locked(quiz: &Quiz, message: &str, locale: &str) -> Markup {
    html! {
        article.quiz-start {
            header {
                hgroup {
                    h1 { "🔒 " (quiz.title) }
                    p { (quiz.subtitle) }
                }
            }
            (components::toast(components::ToastKind::Info, message))
            (components::nav_link(names::HOME_URL, html! { (t!("play.back_home", locale = locale)) }))
        }
    }
}

fn option_class(state: &PlayState, question: &Question, key: OptionKey) -> &'static str {
    let selected = state.selected.contains(&key);
    if !state.show_result {
        return if selected { "option selected" } else { "option" };
    }
    match (selected, question.is_correct_option(key)) {
        (true, true) => "option selected option-correct",
        (true, false) => "option selected option-wrong",
        (false, true) => "option option-missed",
        (false, false) => "option",
    }
}

/// The current question of an attempt, with its result once validated.
pub fn question(quiz: &Quiz, state: &PlayState, question: &Question, locale: &str) -> Markup {
    let position = state.question_idx + 1;
    let verdict = state
        .answer_for(question.id)
        .map(|answer| answer.is_correct);

    html! {
        div.play hx-target="main" {
            hgroup {
                h2 { (quiz.title) }
                p { (quiz.subtitle) }
            }
            p."secondary" {
                (t!("play.progress", locale = locale, current = position, total = quiz.total()))
                " · "
                (t!("play.score", locale = locale, score = state.score))
            }
            progress value=(position) max=(quiz.total()) {}

            article.question {
                h3 { (question.question) }
                p."secondary" { small { (t!("play.multiple_hint", locale = locale)) } }

                div.options {
                    @for (key, text) in question.options.iter() {
                        button class=(option_class(state, question, key))
                               hx-post=(names::toggle_option_url(key))
                               disabled[state.show_result]
                               aria-pressed=(state.selected.contains(&key)) {
                            strong { (components::option_label(key)) ". " }
                            (text)
                        }
                    }
                }

                footer {
                    @match verdict {
                        None => {
                            button hx-post=(names::VALIDATE_ANSWER_URL)
                                   disabled[state.selected.is_empty()] {
                                (t!("play.validate", locale = locale))
                            }
                        }
                        Some(is_correct) => {
                            @if is_correct {
                                p.verdict.verdict-correct { (t!("play.correct", locale = locale)) }
                            } @else {
                                p.verdict.verdict-wrong {
                                    (t!("play.wrong", locale = locale))
                                    " "
                                    (t!(
                                        "play.expected",
                                        locale = locale,
                                        answers = components::answer_labels(question.correct_answers.iter().copied())
                                    ))
                                }
                            }
                            button hx-post=(names::NEXT_QUESTION_URL) {
                                @if state.is_last(quiz) {
                                    (t!("play.see_results", locale = locale))
                                } @else {
                                    (t!("play.next", locale = locale))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn band_message(band: ResultBand, locale: &str) -> String {
    match band {
        ResultBand::Excellent => t!("result.excellent", locale = locale),
        ResultBand::VeryGood => t!("result.very_good", locale = locale),
        ResultBand::CouldDoBetter => t!("result.could_do_better", locale = locale),
        ResultBand::KeepRevising => t!("result.keep_revising", locale = locale),
    }
    .to_string()
}

/// Final score and a per-question recap of the finished attempt.
pub fn result(
    quiz: &Quiz,
    state: &PlayState,
    score: Score,
    improved: bool,
    locale: &str,
) -> Markup {
    let percentage = score.percentage();

    html! {
        article.result {
            header {
                hgroup {
                    h1 { (t!("result.title", locale = locale)) }
                    p { (quiz.title) " · " (quiz.subtitle) }
                }
            }
            p.result-score { (score.score) " / " (score.total) " (" (percentage) " %)" }
            p { (band_message(ResultBand::for_percentage(percentage), locale)) }
            @if improved {
                p { mark { (t!("result.new_best", locale = locale)) } }
            }
            footer {
                button hx-post=(names::start_quiz_url(&quiz.slug))
                       hx-target="main"
                       hx-push-url=(names::PLAY_URL) {
                    (t!("play.restart", locale = locale))
                }
                " "
                (components::nav_link(names::HOME_URL, html! { (t!("play.back_home", locale = locale)) }))
            }
        }

        h2 { (t!("result.summary", locale = locale)) }
        @for question in &quiz.questions {
            @let answer = state.answer_for(question.id);
            @let is_correct = answer.is_some_and(|a| a.is_correct);
            details.summary-item {
                summary class=(if is_correct { "summary-correct" } else { "summary-wrong" }) {
                    @if is_correct { "✓ " } @else { "✗ " }
                    (question.id) ". " (question.question)
                }
                p {
                    (t!(
                        "result.your_answers",
                        locale = locale,
                        answers = components::answer_labels(answer.map(|a| a.selected.iter().copied()).into_iter().flatten())
                    ))
                }
                (components::answer_key(question, locale))
            }
        }
    }
}

pub fn no_attempt(locale: &str) -> Markup {
    html! {
        article {
            p { (t!("play.no_attempt", locale = locale)) }
            (components::nav_link(names::HOME_URL, html! { (t!("play.back_home", locale = locale)) }))
        }
    }
}
