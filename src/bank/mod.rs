//! Question bank.
//!
//! A bank holds exactly one question per category. Each question carries its
//! answers in their original order (correct answer first), optional per-question
//! score overrides, and the number of columns its choices are laid out in.

use crate::error::BankError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub is_correct: bool,
}

impl Answer {
    pub fn correct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_correct: true,
        }
    }

    pub fn distractor(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_correct: false,
        }
    }
}

/// Fully resolved points for each outcome of a question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub correct: f64,
    pub wrong: f64,
    pub blank: f64,
}

/// Per-question score overrides. A `None` field falls back to the default weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrong: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blank: Option<f64>,
}

impl ScoreOverrides {
    /// Returns true when no field is overridden.
    pub fn is_empty(&self) -> bool {
        self.correct.is_none() && self.wrong.is_none() && self.blank.is_none()
    }

    /// Resolves the overrides against the given defaults.
    pub fn resolve(&self, defaults: &ScoreWeights) -> ScoreWeights {
        ScoreWeights {
            correct: self.correct.unwrap_or(defaults.correct),
            wrong: self.wrong.unwrap_or(defaults.wrong),
            blank: self.blank.unwrap_or(defaults.blank),
        }
    }
}

/// A single-correct-answer multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question text (LaTeX source).
    pub text: String,
    /// Source category id (the sheet the question was drawn from).
    pub category: String,
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub scores: ScoreOverrides,
    /// Number of columns the choices are printed in.
    #[serde(default = "default_choice_columns")]
    pub choice_columns: usize,
}

fn default_choice_columns() -> usize {
    1
}

impl Question {
    /// Creates a question with the correct answer first and the distractors after it.
    ///
    /// Empty distractors and distractors equal to the correct answer are dropped.
    pub fn new(
        category: impl Into<String>,
        text: impl Into<String>,
        correct: impl Into<String>,
        distractors: impl IntoIterator<Item = String>,
    ) -> Self {
        let correct = correct.into();
        let mut answers = vec![Answer::correct(correct.clone())];
        answers.extend(
            distractors
                .into_iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty() && *d != correct)
                .map(Answer::distractor),
        );

        Self {
            text: text.into(),
            category: category.into(),
            answers,
            scores: ScoreOverrides::default(),
            choice_columns: 1,
        }
    }

    pub fn with_scores(mut self, scores: ScoreOverrides) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_choice_columns(mut self, columns: usize) -> Self {
        self.choice_columns = columns.max(1);
        self
    }

    /// Position of the correct answer in the current answer order.
    pub fn correct_index(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.is_correct)
    }

    fn check(&self) -> Result<(), BankError> {
        if self.answers.is_empty() {
            return Err(BankError::NoAnswers(self.category.clone()));
        }
        let count = self.answers.iter().filter(|a| a.is_correct).count();
        if count != 1 {
            return Err(BankError::CorrectAnswerCount {
                category: self.category.clone(),
                count,
            });
        }
        Ok(())
    }
}

/// The questions selected for one run, one per category, in original order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank, checking that every question has exactly one correct
    /// answer and that categories are unique.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::new();
        for question in &questions {
            question.check()?;
            if !seen.insert(question.category.as_str()) {
                return Err(BankError::DuplicateCategory(question.category.clone()));
            }
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Category ids in original bank order.
    pub fn categories(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.category.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
