//! Randomness scoring and variant selection.
//!
//! Each candidate gets a heuristic score, the mean of:
//!
//! - **question order**: fraction of positions whose question differs from the
//!   bank's original order;
//! - **answer order**: mean normalized position of the correct answer,
//!   `index / (answers - 1)`, or 0 for single-answer questions.
//!
//! The answer-order part favours correct answers that land late in the list.
//! The pool-wide [`RandomnessMetrics`] instead measures the spread of the
//! correct answer's position, which is symmetric. Selection uses the
//! per-variant score only.

use crate::analytics::stats::{mean, population_std_dev, round2};
use crate::bank::QuestionBank;
use crate::generator::Variant;
use std::collections::HashMap;
use std::fmt;

/// A candidate variant together with its randomness score.
#[derive(Debug, Clone)]
pub struct ScoredVariant {
    pub variant: Variant,
    pub question_order_score: f64,
    pub answer_order_score: f64,
    pub score: f64,
}

/// Aggregate randomness over a candidate pool. Informational only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomnessMetrics {
    /// Mean question-order score across candidates.
    pub question_order_randomness: f64,
    /// Mean normalized spread of the correct answer's position, per question.
    pub answer_order_randomness: f64,
    /// Mean of the two.
    pub combined_randomness: f64,
}

impl RandomnessMetrics {
    /// Metrics for an empty pool.
    pub fn empty() -> Self {
        Self {
            question_order_randomness: 0.0,
            answer_order_randomness: 0.0,
            combined_randomness: 0.0,
        }
    }

    /// Copy with every value rounded to two decimals.
    pub fn rounded(&self) -> Self {
        Self {
            question_order_randomness: round2(self.question_order_randomness),
            answer_order_randomness: round2(self.answer_order_randomness),
            combined_randomness: round2(self.combined_randomness),
        }
    }
}

impl fmt::Display for RandomnessMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rounded();
        write!(
            f,
            "question_order={:.2} answer_order={:.2} combined={:.2}",
            r.question_order_randomness, r.answer_order_randomness, r.combined_randomness
        )
    }
}

/// Scores and ranks variants against the bank's original question order.
#[derive(Debug, Clone)]
pub struct RandomnessScorer {
    original_order: Vec<String>,
}

impl RandomnessScorer {
    pub fn new(bank: &QuestionBank) -> Self {
        Self {
            original_order: bank.categories(),
        }
    }

    /// Fraction of positions whose occupant differs from the original order.
    pub fn question_order_score(&self, variant: &Variant) -> f64 {
        if self.original_order.is_empty() {
            return 0.0;
        }
        let changed = self
            .original_order
            .iter()
            .zip(&variant.questions)
            .filter(|(original, question)| **original != question.category)
            .count();
        changed as f64 / self.original_order.len() as f64
    }

    /// Mean of `index_of_correct / (answers - 1)` over the variant's questions.
    pub fn answer_order_score(&self, variant: &Variant) -> f64 {
        let positions: Vec<f64> = variant
            .questions
            .iter()
            .map(|question| {
                let n = question.answers.len();
                if n > 1 {
                    question.correct_index().unwrap_or(0) as f64 / (n - 1) as f64
                } else {
                    0.0
                }
            })
            .collect();
        mean(&positions)
    }

    /// Scores one variant.
    pub fn score(&self, variant: Variant) -> ScoredVariant {
        let question_order_score = self.question_order_score(&variant);
        let answer_order_score = self.answer_order_score(&variant);
        ScoredVariant {
            variant,
            question_order_score,
            answer_order_score,
            score: (question_order_score + answer_order_score) / 2.0,
        }
    }

    /// Ranks candidates by score, highest first, and keeps the top `count`.
    ///
    /// Equal scores keep their candidate order. Selected variants keep their
    /// candidate ids.
    pub fn select_best(&self, candidates: Vec<Variant>, count: usize) -> Vec<ScoredVariant> {
        let mut scored: Vec<ScoredVariant> =
            candidates.into_iter().map(|v| self.score(v)).collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(count);
        scored
    }

    /// Computes pool-wide randomness metrics.
    pub fn evaluate(&self, candidates: &[Variant]) -> RandomnessMetrics {
        if candidates.is_empty() || self.original_order.is_empty() {
            return RandomnessMetrics::empty();
        }

        let question_scores: Vec<f64> = candidates
            .iter()
            .map(|v| self.question_order_score(v))
            .collect();
        let question_order_randomness = mean(&question_scores);

        // category -> (answer count at first sighting, correct positions)
        let mut positions: HashMap<&str, (usize, Vec<f64>)> = HashMap::new();
        for variant in candidates {
            for question in &variant.questions {
                let entry = positions
                    .entry(question.category.as_str())
                    .or_insert_with(|| (question.answers.len(), Vec::new()));
                entry.1.push(question.correct_index().unwrap_or(0) as f64);
            }
        }

        let spreads: Vec<f64> = self
            .original_order
            .iter()
            .filter_map(|category| positions.get(category.as_str()))
            .map(|(alternatives, observed)| normalized_spread(*alternatives, observed))
            .collect();
        let answer_order_randomness = mean(&spreads);

        RandomnessMetrics {
            question_order_randomness,
            answer_order_randomness,
            combined_randomness: (question_order_randomness + answer_order_randomness) / 2.0,
        }
    }
}

fn normalized_spread(alternatives: usize, observed: &[f64]) -> f64 {
    if observed.len() < 2 || alternatives < 2 {
        return 0.0;
    }
    let min = observed.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = observed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max - min <= 0.0 {
        return 0.0;
    }
    population_std_dev(observed) / (alternatives - 1) as f64
}
