//! Progression through one quiz attempt: select options, validate, move on.

use serde::{Deserialize, Serialize};

use crate::models::{AnswerSet, OptionKey, Question, Quiz, Score};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: u32,
    pub selected: AnswerSet,
    pub is_correct: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlayError {
    #[error("no option selected")]
    NothingSelected,
    #[error("the current question has not been validated")]
    NotValidated,
    #[error("question {0} is not part of this quiz")]
    OutOfRange(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Finished(Score),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayState {
    pub quiz_slug: String,
    pub question_idx: usize,
    pub score: u32,
    pub selected: AnswerSet,
    pub show_result: bool,
    pub answers: Vec<UserAnswer>,
}

impl PlayState {
    pub fn new(quiz_slug: impl Into<String>) -> Self {
        Self {
            quiz_slug: quiz_slug.into(),
            question_idx: 0,
            score: 0,
            selected: AnswerSet::new(),
            show_result: false,
            answers: Vec::new(),
        }
    }

    pub fn current<'q>(&self, quiz: &'q Quiz) -> Result<&'q Question, PlayError> {
        quiz.questions
            .get(self.question_idx)
            .ok_or(PlayError::OutOfRange(self.question_idx))
    }

    pub fn is_last(&self, quiz: &Quiz) -> bool {
        self.question_idx + 1 >= quiz.questions.len()
    }

    /// Returns whether the selection changed; frozen once the result is shown.
    pub fn toggle(&mut self, key: OptionKey) -> bool {
        if self.show_result {
            return false;
        }
        if !self.selected.remove(&key) {
            self.selected.insert(key);
        }
        true
    }

    /// Score the current selection. Validating again returns the recorded verdict.
    pub fn validate(&mut self, quiz: &Quiz) -> Result<bool, PlayError> {
        let question = self.current(quiz)?;

        if self.show_result {
            return Ok(self
                .answer_for(question.id)
                .is_some_and(|answer| answer.is_correct));
        }
        if self.selected.is_empty() {
            return Err(PlayError::NothingSelected);
        }

        let is_correct = question.is_fully_correct(&self.selected);
        self.answers.push(UserAnswer {
            question_id: question.id,
            selected: self.selected.clone(),
            is_correct,
        });
        if is_correct {
            self.score += 1;
        }
        self.show_result = true;

        Ok(is_correct)
    }

    pub fn advance(&mut self, quiz: &Quiz) -> Result<Step, PlayError> {
        if !self.show_result {
            return Err(PlayError::NotValidated);
        }
        if self.is_last(quiz) {
            return Ok(Step::Finished(Score {
                score: self.score,
                total: quiz.total(),
            }));
        }

        self.question_idx += 1;
        self.selected.clear();
        self.show_result = false;
        Ok(Step::Next)
    }

    pub fn answer_for(&self, question_id: u32) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}
