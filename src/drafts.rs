//! Unsaved quiz and book content as edited in the admin forms.
//!
//! Editor fields are flat `name=value` pairs. Questions use `q{i}.text`,
//! `q{i}.a` .. `q{i}.d` and a repeated `q{i}.correct`; book pages prefix them
//! with `p{p}.` and carry their number in `p{p}.number`.

use std::collections::{BTreeMap, HashSet};

use crate::models::{
    is_valid_slug, renumber, slugify, AnswerSet, Book, BookPage, OptionKey, Options, Question,
    Quiz,
};
use crate::services::extraction::{BookExtraction, QuizExtraction};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("slug, title, subtitle and at least one question are required")]
    MissingFields,
    #[error("a title is required")]
    MissingTitle,
    #[error("question {0} is incomplete")]
    IncompleteQuestion(usize),
    #[error("question {0} has no correct answer")]
    NoCorrectAnswer(usize),
    #[error("the slug may only contain lowercase letters, digits and dashes")]
    InvalidSlug,
    #[error("the slug is already used")]
    SlugTaken,
    #[error("the page number must be at least 1")]
    InvalidPage,
    #[error("prerequisite quiz {0} does not exist")]
    UnknownPrerequisite(String),
    #[error("a quiz cannot require itself")]
    SelfPrerequisite,
    #[error("the prerequisite chain loops back to this quiz")]
    PrerequisiteCycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    AddQuestion,
    RemoveQuestion(usize),
    MoveUp(usize),
    MoveDown(usize),
    AddPage,
    RemovePage(usize),
    AddPageQuestion(usize),
    RemovePageQuestion(usize, usize),
}

impl DraftAction {
    /// Parse the value of the editor's `action` button, e.g. `remove_page_question:1:3`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(':');
        let name = parts.next()?;
        let mut index = || parts.next().and_then(|p| p.parse::<usize>().ok());

        let action = match name {
            "add_question" => DraftAction::AddQuestion,
            "remove_question" => DraftAction::RemoveQuestion(index()?),
            "move_up" => DraftAction::MoveUp(index()?),
            "move_down" => DraftAction::MoveDown(index()?),
            "add_page" => DraftAction::AddPage,
            "remove_page" => DraftAction::RemovePage(index()?),
            "add_page_question" => DraftAction::AddPageQuestion(index()?),
            "remove_page_question" => {
                let page = index()?;
                DraftAction::RemovePageQuestion(page, index()?)
            }
            _ => return None,
        };
        Some(action)
    }
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn text_field(fields: &[(String, String)], name: &str) -> String {
    field(fields, name).unwrap_or_default().trim().to_string()
}

fn optional_field(fields: &[(String, String)], name: &str) -> Option<String> {
    Some(text_field(fields, name)).filter(|v| !v.is_empty())
}

fn number_field(fields: &[(String, String)], name: &str, default: i32) -> i32 {
    field(fields, name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Clone, Copy)]
enum QuestionField {
    Text,
    Option(OptionKey),
    Correct,
}

fn split_question_key(key: &str) -> Option<(usize, QuestionField)> {
    let (idx, name) = key.strip_prefix('q')?.split_once('.')?;
    let idx = idx.parse().ok()?;
    let field = match name {
        "text" => QuestionField::Text,
        "correct" => QuestionField::Correct,
        other => QuestionField::Option(OptionKey::parse(other)?),
    };
    Some((idx, field))
}

fn questions_from_fields<'a>(
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<Question> {
    let mut by_idx: BTreeMap<usize, Question> = BTreeMap::new();

    for (key, value) in fields {
        let Some((idx, field)) = split_question_key(key) else {
            continue;
        };
        let question = by_idx.entry(idx).or_insert_with(|| Question {
            id: 0,
            question: String::new(),
            options: Options::default(),
            correct_answers: AnswerSet::new(),
        });
        match field {
            QuestionField::Text => question.question = value.to_string(),
            QuestionField::Option(key) => *question.options.get_mut(key) = value.to_string(),
            QuestionField::Correct => {
                if let Some(key) = OptionKey::parse(value) {
                    question.correct_answers.insert(key);
                }
            }
        }
    }

    let mut questions: Vec<Question> = by_idx.into_values().collect();
    renumber(&mut questions);
    questions
}

fn pages_from_fields(fields: &[(String, String)]) -> Vec<BookPage> {
    let mut pages: BTreeMap<usize, (Option<u32>, Vec<(&str, &str)>)> = BTreeMap::new();

    for (key, value) in fields {
        let Some((idx, name)) = key.strip_prefix('p').and_then(|rest| rest.split_once('.')) else {
            continue;
        };
        let Ok(idx) = idx.parse::<usize>() else {
            continue;
        };
        let page = pages.entry(idx).or_default();
        if name == "number" {
            page.0 = value.trim().parse().ok();
        } else {
            page.1.push((name, value.as_str()));
        }
    }

    pages
        .into_values()
        .enumerate()
        .map(|(idx, (number, question_fields))| BookPage {
            page_number: number.unwrap_or(idx as u32 + 1),
            content: questions_from_fields(question_fields),
        })
        .collect()
}

fn validate_questions(questions: &[Question]) -> Result<(), DraftError> {
    for (idx, question) in questions.iter().enumerate() {
        if !question.is_complete() {
            return Err(DraftError::IncompleteQuestion(idx + 1));
        }
        if question.correct_answers.is_empty() {
            return Err(DraftError::NoCorrectAnswer(idx + 1));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizDraft {
    /// Slug of the quiz being edited; `None` while creating.
    pub original_slug: Option<String>,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub year: i32,
    pub page: i32,
    pub required_quiz_slug: Option<String>,
    pub questions: Vec<Question>,
}

impl QuizDraft {
    pub fn new(current_year: i32) -> Self {
        Self {
            original_slug: None,
            slug: String::new(),
            title: String::new(),
            subtitle: String::new(),
            year: current_year,
            page: 1,
            required_quiz_slug: None,
            questions: Vec::new(),
        }
    }

    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            original_slug: Some(quiz.slug.clone()),
            slug: quiz.slug.clone(),
            title: quiz.title.clone(),
            subtitle: quiz.subtitle.clone(),
            year: quiz.year,
            page: quiz.page,
            required_quiz_slug: quiz.required_quiz_slug.clone(),
            questions: quiz.questions.clone(),
        }
    }

    pub fn from_fields(fields: &[(String, String)], current_year: i32) -> Self {
        let original_slug = optional_field(fields, "original_slug");
        let slug = original_slug
            .clone()
            .unwrap_or_else(|| text_field(fields, "slug"));

        Self {
            original_slug,
            slug,
            title: text_field(fields, "title"),
            subtitle: text_field(fields, "subtitle"),
            year: number_field(fields, "year", current_year),
            page: number_field(fields, "page", 1),
            required_quiz_slug: optional_field(fields, "required_quiz_slug"),
            questions: questions_from_fields(
                fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original_slug.is_none()
    }

    pub fn apply(&mut self, action: DraftAction) {
        let len = self.questions.len();
        match action {
            DraftAction::AddQuestion => self.questions.push(Question::blank(0)),
            DraftAction::RemoveQuestion(idx) if idx < len => {
                self.questions.remove(idx);
            }
            DraftAction::MoveUp(idx) if idx > 0 && idx < len => self.questions.swap(idx - 1, idx),
            DraftAction::MoveDown(idx) if idx + 1 < len => self.questions.swap(idx, idx + 1),
            _ => {}
        }
        renumber(&mut self.questions);
    }

    /// Append extracted questions; metadata only fills fields still at their defaults.
    pub fn merge_extraction(&mut self, extraction: QuizExtraction, current_year: i32) {
        self.questions.extend(extraction.questions);
        renumber(&mut self.questions);

        let metadata = extraction.metadata;
        if self.title.is_empty() {
            if let Some(title) = metadata.title {
                self.title = title;
            }
        }
        if self.page == 1 {
            if let Some(page) = metadata.page.filter(|p| *p >= 1) {
                self.page = page;
            }
        }
        if self.year == current_year {
            if let Some(year) = metadata.year {
                self.year = year;
            }
        }
    }

    /// Check the draft against the saved quizzes and build the quiz to store.
    pub fn validate(&self, existing: &[Quiz]) -> Result<Quiz, DraftError> {
        if self.slug.is_empty()
            || self.title.is_empty()
            || self.subtitle.is_empty()
            || self.questions.is_empty()
        {
            return Err(DraftError::MissingFields);
        }
        validate_questions(&self.questions)?;

        if self.is_new() {
            if !is_valid_slug(&self.slug) {
                return Err(DraftError::InvalidSlug);
            }
            if existing.iter().any(|q| q.slug == self.slug) {
                return Err(DraftError::SlugTaken);
            }
        }
        if self.page < 1 {
            return Err(DraftError::InvalidPage);
        }
        if let Some(required) = &self.required_quiz_slug {
            self.check_prerequisite(required, existing)?;
        }

        let mut questions = self.questions.clone();
        renumber(&mut questions);

        Ok(Quiz {
            slug: self.slug.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            year: self.year,
            page: self.page,
            questions,
            required_quiz_slug: self.required_quiz_slug.clone(),
        })
    }

    fn check_prerequisite(&self, required: &str, existing: &[Quiz]) -> Result<(), DraftError> {
        if required == self.slug {
            return Err(DraftError::SelfPrerequisite);
        }
        if !existing.iter().any(|q| q.slug == required) {
            return Err(DraftError::UnknownPrerequisite(required.to_string()));
        }

        let mut seen = HashSet::new();
        let mut cursor = Some(required);
        while let Some(slug) = cursor {
            if slug == self.slug {
                return Err(DraftError::PrerequisiteCycle);
            }
            if !seen.insert(slug) {
                break;
            }
            cursor = existing
                .iter()
                .find(|q| q.slug == slug)
                .and_then(|q| q.required_quiz_slug.as_deref());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub original_slug: Option<String>,
    pub title: String,
    pub year: i32,
    pub pages: Vec<BookPage>,
}

impl BookDraft {
    pub fn new(current_year: i32) -> Self {
        Self {
            original_slug: None,
            title: String::new(),
            year: current_year,
            pages: Vec::new(),
        }
    }

    pub fn from_book(book: &Book) -> Self {
        Self {
            original_slug: Some(book.slug.clone()),
            title: book.title.clone(),
            year: book.year,
            pages: book.pages.clone(),
        }
    }

    pub fn from_fields(fields: &[(String, String)], current_year: i32) -> Self {
        Self {
            original_slug: optional_field(fields, "original_slug"),
            title: text_field(fields, "title"),
            year: number_field(fields, "year", current_year),
            pages: pages_from_fields(fields),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original_slug.is_none()
    }

    pub fn apply(&mut self, action: DraftAction) {
        match action {
            DraftAction::AddPage => {
                let next = self.pages.iter().map(|p| p.page_number).max().unwrap_or(0) + 1;
                self.pages.push(BookPage {
                    page_number: next,
                    content: Vec::new(),
                });
            }
            DraftAction::RemovePage(idx) if idx < self.pages.len() => {
                self.pages.remove(idx);
            }
            DraftAction::AddPageQuestion(idx) => {
                if let Some(page) = self.pages.get_mut(idx) {
                    page.content.push(Question::blank(0));
                    renumber(&mut page.content);
                }
            }
            DraftAction::RemovePageQuestion(page_idx, question_idx) => {
                if let Some(page) = self.pages.get_mut(page_idx) {
                    if question_idx < page.content.len() {
                        page.content.remove(question_idx);
                        renumber(&mut page.content);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn merge_extraction(&mut self, extraction: BookExtraction) {
        if let Some(title) = extraction.metadata.title {
            self.title = title;
        }
        if let Some(year) = extraction.metadata.year {
            self.year = year;
        }
        self.pages.extend(extraction.pages);
    }

    /// Slug a new book will be stored under.
    pub fn slug(&self) -> String {
        match &self.original_slug {
            Some(slug) => slug.clone(),
            None => format!("{}-{}", slugify(&self.title), self.year),
        }
    }

    pub fn validate(&self, existing: &[Book]) -> Result<Book, DraftError> {
        if self.title.is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.is_new() {
            if slugify(&self.title).is_empty() {
                return Err(DraftError::InvalidSlug);
            }
            let slug = self.slug();
            if existing.iter().any(|b| b.slug == slug) {
                return Err(DraftError::SlugTaken);
            }
        }

        Ok(Book {
            slug: self.slug(),
            title: self.title.clone(),
            year: self.year,
            pages: self.pages.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::extraction::{BookMetadata, QuizMetadata};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_question(id: u32) -> Question {
        Question {
            id,
            question: format!("Question {id}"),
            options: Options {
                a: "a".to_string(),
                b: "b".to_string(),
                c: "c".to_string(),
                d: "d".to_string(),
            },
            correct_answers: AnswerSet::from([OptionKey::A]),
        }
    }

    fn saved_quiz(slug: &str, required: Option<&str>) -> Quiz {
        Quiz {
            slug: slug.to_string(),
            title: "Quiz".to_string(),
            subtitle: slug.to_string(),
            year: 2024,
            page: 1,
            questions: vec![complete_question(1)],
            required_quiz_slug: required.map(str::to_string),
        }
    }

    fn valid_draft() -> QuizDraft {
        QuizDraft {
            original_slug: None,
            slug: "page-04".to_string(),
            title: "Quiz Généralités".to_string(),
            subtitle: "Page 04 - 2024".to_string(),
            year: 2024,
            page: 4,
            required_quiz_slug: None,
            questions: vec![complete_question(1)],
        }
    }

    #[test]
    fn actions_parse_with_indexes() {
        assert_eq!(DraftAction::parse("add_question"), Some(DraftAction::AddQuestion));
        assert_eq!(DraftAction::parse("move_down:2"), Some(DraftAction::MoveDown(2)));
        assert_eq!(
            DraftAction::parse("remove_page_question:1:3"),
            Some(DraftAction::RemovePageQuestion(1, 3))
        );
        assert_eq!(DraftAction::parse("remove_question"), None);
        assert_eq!(DraftAction::parse("explode:1"), None);
    }

    #[test]
    fn quiz_fields_are_parsed_in_index_order() {
        let fields = pairs(&[
            ("slug", " page-02 "),
            ("title", "Quiz"),
            ("subtitle", "Page 02"),
            ("year", "2023"),
            ("page", "2"),
            ("required_quiz_slug", ""),
            ("q1.text", "Second"),
            ("q1.a", "x"),
            ("q1.correct", "b"),
            ("q1.correct", "d"),
            ("q0.text", "First"),
            ("q0.c", "y"),
        ]);

        let draft = QuizDraft::from_fields(&fields, 2026);

        assert_eq!(draft.slug, "page-02");
        assert_eq!(draft.year, 2023);
        assert_eq!(draft.required_quiz_slug, None);
        assert_eq!(draft.questions.len(), 2);
        assert_eq!(draft.questions[0].question, "First");
        assert_eq!(draft.questions[0].options.c, "y");
        assert_eq!(draft.questions[1].id, 2);
        assert_eq!(
            draft.questions[1].correct_answers,
            AnswerSet::from([OptionKey::B, OptionKey::D])
        );
    }

    #[test]
    fn editing_keeps_the_original_slug() {
        let fields = pairs(&[("original_slug", "page-01"), ("slug", "renamed")]);
        let draft = QuizDraft::from_fields(&fields, 2026);
        assert_eq!(draft.slug, "page-01");
        assert!(!draft.is_new());
    }

    #[test]
    fn editor_actions_renumber_questions() {
        let mut draft = valid_draft();
        draft.apply(DraftAction::AddQuestion);
        draft.apply(DraftAction::AddQuestion);
        draft.questions[2].question = "third".to_string();

        draft.apply(DraftAction::MoveUp(2));
        assert_eq!(draft.questions[1].question, "third");
        assert_eq!(draft.questions[1].id, 2);

        draft.apply(DraftAction::RemoveQuestion(0));
        assert_eq!(draft.questions.len(), 2);
        assert_eq!(draft.questions[0].question, "third");
        assert_eq!(draft.questions[0].id, 1);

        draft.apply(DraftAction::MoveDown(5));
        assert_eq!(draft.questions.len(), 2);
    }

    #[test]
    fn added_question_starts_with_a_correct() {
        let mut draft = QuizDraft::new(2026);
        draft.apply(DraftAction::AddQuestion);
        assert_eq!(
            draft.questions[0].correct_answers,
            AnswerSet::from([OptionKey::A])
        );
    }

    #[test]
    fn validation_reports_missing_and_incomplete_content() {
        let mut draft = valid_draft();
        draft.subtitle.clear();
        assert_eq!(draft.validate(&[]), Err(DraftError::MissingFields));

        let mut draft = valid_draft();
        draft.apply(DraftAction::AddQuestion);
        assert_eq!(draft.validate(&[]), Err(DraftError::IncompleteQuestion(2)));

        let mut draft = valid_draft();
        draft.questions[0].correct_answers.clear();
        assert_eq!(draft.validate(&[]), Err(DraftError::NoCorrectAnswer(1)));
    }

    #[test]
    fn new_slugs_must_be_valid_and_unique() {
        let mut draft = valid_draft();
        draft.slug = "Page 04".to_string();
        assert_eq!(draft.validate(&[]), Err(DraftError::InvalidSlug));

        let draft = valid_draft();
        let existing = vec![saved_quiz("page-04", None)];
        assert_eq!(draft.validate(&existing), Err(DraftError::SlugTaken));
    }

    #[test]
    fn prerequisites_must_exist_and_not_loop() {
        let existing = vec![
            saved_quiz("page-01", None),
            saved_quiz("page-02", Some("page-01")),
        ];

        let mut draft = valid_draft();
        draft.required_quiz_slug = Some("page-02".to_string());
        assert!(draft.validate(&existing).is_ok());

        draft.required_quiz_slug = Some("page-09".to_string());
        assert_eq!(
            draft.validate(&existing),
            Err(DraftError::UnknownPrerequisite("page-09".to_string()))
        );

        draft.required_quiz_slug = Some("page-04".to_string());
        assert_eq!(draft.validate(&existing), Err(DraftError::SelfPrerequisite));

        // page-01 edited to require page-02, which already requires page-01
        let mut edit = QuizDraft::from_quiz(&existing[0]);
        edit.required_quiz_slug = Some("page-02".to_string());
        assert_eq!(edit.validate(&existing), Err(DraftError::PrerequisiteCycle));
    }

    #[test]
    fn extraction_appends_and_fills_defaults_only() {
        let mut draft = QuizDraft::new(2026);
        draft.questions.push(complete_question(1));

        draft.merge_extraction(
            QuizExtraction {
                questions: vec![complete_question(1), complete_question(2)],
                metadata: QuizMetadata {
                    title: Some("Extracted".to_string()),
                    page: Some(5),
                    year: Some(2024),
                },
            },
            2026,
        );

        assert_eq!(draft.questions.len(), 3);
        assert_eq!(draft.questions[2].id, 3);
        assert_eq!(draft.title, "Extracted");
        assert_eq!(draft.page, 5);
        assert_eq!(draft.year, 2024);

        draft.merge_extraction(
            QuizExtraction {
                questions: vec![],
                metadata: QuizMetadata {
                    title: Some("Other".to_string()),
                    page: Some(9),
                    year: Some(2020),
                },
            },
            2026,
        );
        assert_eq!(draft.title, "Extracted");
        assert_eq!(draft.page, 5);
        assert_eq!(draft.year, 2024);
    }

    #[test]
    fn book_fields_group_questions_by_page() {
        let fields = pairs(&[
            ("title", "Annales"),
            ("year", "2024"),
            ("p0.number", "3"),
            ("p0.q0.text", "Q1"),
            ("p0.q0.correct", "c"),
            ("p1.number", ""),
            ("p1.q0.text", "Q2"),
            ("p1.q1.text", "Q3"),
        ]);

        let draft = BookDraft::from_fields(&fields, 2026);

        assert_eq!(draft.pages.len(), 2);
        assert_eq!(draft.pages[0].page_number, 3);
        assert_eq!(
            draft.pages[0].content[0].correct_answers,
            AnswerSet::from([OptionKey::C])
        );
        assert_eq!(draft.pages[1].page_number, 2);
        assert_eq!(draft.pages[1].content.len(), 2);
        assert_eq!(draft.pages[1].content[1].id, 2);
    }

    #[test]
    fn book_actions_edit_pages_and_content() {
        let mut draft = BookDraft::new(2026);
        draft.apply(DraftAction::AddPage);
        draft.apply(DraftAction::AddPage);
        draft.apply(DraftAction::AddPageQuestion(1));
        draft.apply(DraftAction::AddPageQuestion(1));
        assert_eq!(draft.pages[1].page_number, 2);
        assert_eq!(draft.pages[1].content.len(), 2);

        draft.apply(DraftAction::RemovePageQuestion(1, 0));
        assert_eq!(draft.pages[1].content.len(), 1);
        assert_eq!(draft.pages[1].content[0].id, 1);

        draft.apply(DraftAction::RemovePage(0));
        assert_eq!(draft.pages.len(), 1);
        draft.apply(DraftAction::AddPage);
        assert_eq!(draft.pages[1].page_number, 3);
    }

    #[test]
    fn new_books_get_a_title_year_slug() {
        let mut draft = BookDraft::new(2024);
        assert_eq!(draft.validate(&[]), Err(DraftError::MissingTitle));

        draft.title = "Culture Générale".to_string();
        let book = draft.validate(&[]).unwrap();
        assert_eq!(book.slug, "culture-generale-2024");
        assert_eq!(draft.validate(&[book]), Err(DraftError::SlugTaken));
    }

    #[test]
    fn book_extraction_overrides_metadata_and_appends_pages() {
        let mut draft = BookDraft::new(2026);
        draft.title = "Draft".to_string();
        draft.merge_extraction(BookExtraction {
            pages: vec![BookPage {
                page_number: 7,
                content: vec![complete_question(1)],
            }],
            metadata: BookMetadata {
                title: Some("Annales 2023".to_string()),
                year: Some(2023),
                page_range: None,
            },
        });
        assert_eq!(draft.title, "Annales 2023");
        assert_eq!(draft.year, 2023);
        assert_eq!(draft.pages[0].page_number, 7);
    }
}
