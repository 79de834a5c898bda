use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};

/// Label of one of the four options every question carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "a",
            OptionKey::B => "b",
            OptionKey::C => "c",
            OptionKey::D => "d",
        }
    }

    /// Parse a label case-insensitively, ignoring surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "a" => Some(OptionKey::A),
            "b" => Some(OptionKey::B),
            "c" => Some(OptionKey::C),
            "d" => Some(OptionKey::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type AnswerSet = BTreeSet<OptionKey>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub a: String,
    #[serde(default)]
    pub b: String,
    #[serde(default)]
    pub c: String,
    #[serde(default)]
    pub d: String,
}

impl Options {
    pub fn get(&self, key: OptionKey) -> &str {
        match key {
            OptionKey::A => &self.a,
            OptionKey::B => &self.b,
            OptionKey::C => &self.c,
            OptionKey::D => &self.d,
        }
    }

    pub fn get_mut(&mut self, key: OptionKey) -> &mut String {
        match key {
            OptionKey::A => &mut self.a,
            OptionKey::B => &mut self.b,
            OptionKey::C => &mut self.c,
            OptionKey::D => &mut self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &str)> {
        OptionKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    pub fn is_complete(&self) -> bool {
        self.iter().all(|(_, text)| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub options: Options,
    #[serde(default)]
    pub correct_answers: AnswerSet,
}

impl Question {
    /// A new, empty question as the editor adds it: option `a` pre-marked correct.
    pub fn blank(id: u32) -> Self {
        Self {
            id,
            question: String::new(),
            options: Options::default(),
            correct_answers: AnswerSet::from([OptionKey::A]),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && self.options.is_complete()
    }

    /// Exact-match scoring: every correct option selected and nothing else.
    pub fn is_fully_correct(&self, selected: &AnswerSet) -> bool {
        !self.correct_answers.is_empty() && *selected == self.correct_answers
    }

    pub fn is_correct_option(&self, key: OptionKey) -> bool {
        self.correct_answers.contains(&key)
    }
}

/// Reassign ids `1..=n` following list order.
pub fn renumber(questions: &mut [Question]) {
    for (idx, question) in questions.iter_mut().enumerate() {
        question.id = idx as u32 + 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub year: i32,
    pub page: i32,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub required_quiz_slug: Option<String>,
}

impl Quiz {
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    /// A quiz without prerequisite is always open; otherwise the prerequisite
    /// must have been completed with a perfect score by this player.
    pub fn is_unlocked(&self, scores: &ScoreBoard) -> bool {
        match &self.required_quiz_slug {
            None => true,
            Some(required) => scores.get(required).is_some_and(Score::is_perfect),
        }
    }

    pub fn is_complete(&self, scores: &ScoreBoard) -> bool {
        scores.get(&self.slug).is_some_and(Score::is_perfect)
    }
}

/// Find the quiz a locked quiz is waiting on.
pub fn prerequisite_of<'a>(quiz: &Quiz, quizzes: &'a [Quiz]) -> Option<&'a Quiz> {
    let required = quiz.required_quiz_slug.as_deref()?;
    quizzes.iter().find(|q| q.slug == required)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub score: u32,
    pub total: u32,
}

impl Score {
    pub fn is_perfect(&self) -> bool {
        self.score >= self.total
    }

    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (f64::from(self.score) * 100.0 / f64::from(self.total)).round() as u32
    }
}

/// Best scores of one player, keyed by quiz slug.
pub type ScoreBoard = HashMap<String, Score>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultBand {
    Excellent,
    VeryGood,
    CouldDoBetter,
    KeepRevising,
}

impl ResultBand {
    pub fn for_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => ResultBand::Excellent,
            60..=79 => ResultBand::VeryGood,
            40..=59 => ResultBand::CouldDoBetter,
            _ => ResultBand::KeepRevising,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub page_number: u32,
    #[serde(default)]
    pub content: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub slug: String,
    pub title: String,
    pub year: i32,
    pub pages: Vec<BookPage>,
}

impl Book {
    pub fn question_count(&self) -> usize {
        self.pages.iter().map(|p| p.content.len()).sum()
    }

    /// Clamp a requested page index into range; `None` for a book without pages.
    pub fn clamp_page(&self, requested: usize) -> Option<usize> {
        let last = self.pages.len().checked_sub(1)?;
        Some(requested.min(last))
    }
}

/// Group items by year, most recent year first, keeping the input order inside a year.
pub fn group_by_year<T>(items: Vec<T>, year: impl Fn(&T) -> i32) -> Vec<(i32, Vec<T>)> {
    let mut groups: BTreeMap<Reverse<i32>, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(Reverse(year(&item))).or_default().push(item);
    }
    groups
        .into_iter()
        .map(|(Reverse(year), items)| (year, items))
        .collect()
}

/// Lowercase, fold French accents, collapse everything else into single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let folded: &str = match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
            'ç' => "c",
            'è' | 'é' | 'ê' | 'ë' => "e",
            'ì' | 'í' | 'î' | 'ï' => "i",
            'ñ' => "n",
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
            'ù' | 'ú' | 'û' | 'ü' => "u",
            'ý' | 'ÿ' => "y",
            'œ' => "oe",
            'æ' => "ae",
            'ß' => "ss",
            c if c.is_ascii_alphanumeric() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
                continue;
            }
            _ => {
                pending_dash = true;
                continue;
            }
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push_str(folded);
    }

    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
