//! Grading of student submissions against the answer-key registry.

use crate::analytics::stats::round2;
use crate::analytics::StudentStanding;
use crate::bank::ScoreWeights;
use crate::registry::{AnswerKeyRegistry, VariantKey};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Answers of one student, as read from the submission sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentSubmission {
    pub student_id: String,
    pub variant_id: String,
    /// Question number to raw response text. Empty text means blank.
    pub answers: BTreeMap<usize, String>,
}

/// Outcome of one answered (or unanswered) question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Correct,
    Wrong,
    Blank,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Wrong => write!(f, "wrong"),
            Outcome::Blank => write!(f, "blank"),
        }
    }
}

/// Per-question detail of a graded submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerDetail {
    pub number: usize,
    pub category: String,
    /// Trimmed response, empty when blank.
    pub response: String,
    pub correct_label: String,
    pub outcome: Outcome,
    pub points: f64,
}

/// Scored result for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedResult {
    pub student_id: String,
    pub variant_id: String,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub blank_count: usize,
    pub correct_score: f64,
    pub wrong_score: f64,
    pub blank_score: f64,
    pub total_score: f64,
    pub max_score: f64,
    /// Percentage of the maximum, rounded to two decimals. 0 when the maximum is 0.
    pub percentage: f64,
    /// Ordered by question number.
    pub answers: Vec<AnswerDetail>,
    /// Position within the cohort, filled in by the analyzer.
    pub standing: Option<StudentStanding>,
}

impl GradedResult {
    /// The outcome recorded for a category, if the student saw that question.
    pub fn outcome_for(&self, category: &str) -> Option<Outcome> {
        self.answers
            .iter()
            .find(|a| a.category == category)
            .map(|a| a.outcome)
    }
}

/// Correct/wrong/blank counts for one category across the cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionTally {
    pub correct: usize,
    pub wrong: usize,
    pub blank: usize,
}

impl QuestionTally {
    pub fn total(&self) -> usize {
        self.correct + self.wrong + self.blank
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::Blank => self.blank += 1,
        }
    }
}

/// A submission that could not be graded.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSubmission {
    pub student_id: String,
    pub variant_id: String,
    pub reason: String,
}

/// Output of a grading run.
#[derive(Debug, Clone, Default)]
pub struct GradingReport {
    /// One result per graded student, in submission order.
    pub results: Vec<GradedResult>,
    /// Outcome counts keyed by category.
    pub tallies: BTreeMap<String, QuestionTally>,
    pub skipped: Vec<SkippedSubmission>,
}

/// Grades submissions using the registry and default score weights.
pub struct Grader<'a> {
    registry: &'a AnswerKeyRegistry,
    defaults: ScoreWeights,
}

impl<'a> Grader<'a> {
    pub fn new(registry: &'a AnswerKeyRegistry, defaults: ScoreWeights) -> Self {
        Self { registry, defaults }
    }

    /// Grades every submission. Submissions for unknown variants are skipped
    /// with a warning; the rest are graded normally.
    pub fn grade_all(&self, submissions: &[StudentSubmission]) -> GradingReport {
        let mut report = GradingReport::default();

        for submission in submissions {
            match self.registry.require(&submission.variant_id) {
                Ok(key) => report.results.push(self.grade_with_key(submission, key)),
                Err(e) => {
                    warn!(
                        student = %submission.student_id,
                        variant = %submission.variant_id,
                        "Skipping submission: {}",
                        e
                    );
                    report.skipped.push(SkippedSubmission {
                        student_id: submission.student_id.clone(),
                        variant_id: submission.variant_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.tallies = tally(&report.results);
        report
    }

    /// Grades one submission. Returns `None` for an unknown variant.
    pub fn grade(&self, submission: &StudentSubmission) -> Option<GradedResult> {
        self.registry
            .get(&submission.variant_id)
            .map(|key| self.grade_with_key(submission, key))
    }

    fn grade_with_key(&self, submission: &StudentSubmission, key: &VariantKey) -> GradedResult {
        let mut result = GradedResult {
            student_id: submission.student_id.clone(),
            variant_id: submission.variant_id.clone(),
            correct_count: 0,
            wrong_count: 0,
            blank_count: 0,
            correct_score: 0.0,
            wrong_score: 0.0,
            blank_score: 0.0,
            total_score: 0.0,
            max_score: 0.0,
            percentage: 0.0,
            answers: Vec::new(),
            standing: None,
        };

        for (number, raw) in &submission.answers {
            // columns the variant does not have are ignored
            let Some(entry) = key.entry(*number) else {
                continue;
            };

            let weights = entry.scores.resolve(&self.defaults);
            result.max_score += weights.correct;

            let response = raw.trim();
            let (outcome, points) = if response.is_empty() {
                result.blank_count += 1;
                result.blank_score += weights.blank;
                (Outcome::Blank, weights.blank)
            } else if response.to_uppercase() == entry.label.to_uppercase() {
                result.correct_count += 1;
                result.correct_score += weights.correct;
                (Outcome::Correct, weights.correct)
            } else {
                result.wrong_count += 1;
                result.wrong_score += weights.wrong;
                (Outcome::Wrong, weights.wrong)
            };

            result.answers.push(AnswerDetail {
                number: *number,
                category: entry.category.clone(),
                response: response.to_string(),
                correct_label: entry.label.clone(),
                outcome,
                points,
            });
        }

        result.total_score = result.correct_score + result.wrong_score + result.blank_score;
        result.percentage = if result.max_score > 0.0 {
            round2(result.total_score / result.max_score * 100.0)
        } else {
            0.0
        };

        debug!(
            student = %result.student_id,
            total = result.total_score,
            max = result.max_score,
            "Graded submission"
        );
        result
    }
}

/// Per-category outcome counts over a set of results.
pub fn tally(results: &[GradedResult]) -> BTreeMap<String, QuestionTally> {
    let mut tallies: BTreeMap<String, QuestionTally> = BTreeMap::new();
    for result in results {
        for answer in &result.answers {
            tallies
                .entry(answer.category.clone())
                .or_default()
                .record(answer.outcome);
        }
    }
    tallies
}
