//! Psychometric analysis of graded results.
//!
//! Two independent passes over already-graded data:
//!
//! 1. **Cohort statistics** - mean, median, population standard deviation,
//!    range, quartiles, pass rate, and per-student z-score, percentile rank
//!    and stanine.
//! 2. **Item analysis** - per-category difficulty and discrimination, the
//!    latter comparing the top and bottom 27% of students by total score.
//!
//! Both passes are pure: the same input always yields the same output.

pub mod stats;

use crate::grading::{GradedResult, Outcome, QuestionTally};
use stats::{mean, median, percentile_rank, percentiles, population_std_dev, round2};
use std::collections::BTreeMap;
use std::fmt;

/// Percentile cut-points separating the nine stanine bands.
pub const STANINE_CUTS: [f64; 8] = [4.0, 11.0, 23.0, 40.0, 60.0, 77.0, 89.0, 96.0];

/// Share of the cohort in each discrimination group.
pub const DISCRIMINATION_GROUP: f64 = 0.27;

/// Nine-band standardized score, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stanine {
    FMinus,
    F,
    E,
    D,
    C,
    B,
    A,
    S,
    SPlus,
}

impl Stanine {
    const BANDS: [Stanine; 9] = [
        Stanine::FMinus,
        Stanine::F,
        Stanine::E,
        Stanine::D,
        Stanine::C,
        Stanine::B,
        Stanine::A,
        Stanine::S,
        Stanine::SPlus,
    ];

    /// Band for `score` given the eight ascending boundaries.
    pub fn from_boundaries(score: f64, boundaries: &[f64]) -> Self {
        let band = boundaries
            .iter()
            .position(|b| score < *b)
            .unwrap_or(boundaries.len());
        Self::BANDS[band.min(Self::BANDS.len() - 1)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stanine::FMinus => "F-",
            Stanine::F => "F",
            Stanine::E => "E",
            Stanine::D => "D",
            Stanine::C => "C",
            Stanine::B => "B",
            Stanine::A => "A",
            Stanine::S => "S",
            Stanine::SPlus => "S+",
        }
    }
}

impl fmt::Display for Stanine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a student sits within the cohort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentStanding {
    pub z_score: f64,
    /// Percentile rank in `[0, 100]`.
    pub percentile: f64,
    pub stanine: Stanine,
}

/// Descriptive statistics over total scores.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortStatistics {
    pub num_students: usize,
    pub average_score: f64,
    pub median_score: f64,
    /// Population standard deviation.
    pub std_deviation: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// 25th, 50th and 75th percentiles.
    pub quartiles: [f64; 3],
    /// Passing threshold as a fraction of the maximum score.
    pub passing_threshold: f64,
    pub passed: usize,
    /// Fraction of students at or above the threshold.
    pub pass_rate: f64,
    pub avg_correct_count: f64,
    pub avg_wrong_count: f64,
    pub avg_blank_count: f64,
    pub avg_correct_score: f64,
    pub avg_wrong_score: f64,
    pub avg_blank_score: f64,
    pub avg_max_score: f64,
}

impl CohortStatistics {
    /// Statistics for an empty cohort.
    pub fn empty(passing_threshold: f64) -> Self {
        Self {
            num_students: 0,
            average_score: 0.0,
            median_score: 0.0,
            std_deviation: 0.0,
            min_score: 0.0,
            max_score: 0.0,
            quartiles: [0.0; 3],
            passing_threshold,
            passed: 0,
            pass_rate: 0.0,
            avg_correct_count: 0.0,
            avg_wrong_count: 0.0,
            avg_blank_count: 0.0,
            avg_correct_score: 0.0,
            avg_wrong_score: 0.0,
            avg_blank_score: 0.0,
            avg_max_score: 0.0,
        }
    }

    /// Score that passes for the average maximum score.
    pub fn passing_score(&self) -> f64 {
        self.avg_max_score * self.passing_threshold
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} students, mean {:.2}, median {:.2}, std {:.2}, pass rate {:.2}%",
            self.num_students,
            self.average_score,
            self.median_score,
            self.std_deviation,
            self.pass_rate * 100.0
        )
    }
}

/// Cohort statistics together with every student's standing.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAnalysis {
    pub stats: CohortStatistics,
    /// Keyed by student id.
    pub standings: BTreeMap<String, StudentStanding>,
}

/// Difficulty band of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyRating {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for DifficultyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DifficultyRating::Easy => "Facile",
            DifficultyRating::Medium => "Media",
            DifficultyRating::Hard => "Difficile",
        })
    }
}

/// Discrimination band of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminationRating {
    Negative,
    Poor,
    Good,
    Excellent,
}

impl fmt::Display for DiscriminationRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscriminationRating::Negative => "Negativa (problematica)",
            DiscriminationRating::Poor => "Scarsa",
            DiscriminationRating::Good => "Buona",
            DiscriminationRating::Excellent => "Eccellente",
        })
    }
}

/// Item statistics for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAnalytics {
    pub category: String,
    pub tally: QuestionTally,
    pub correct_pct: f64,
    pub wrong_pct: f64,
    pub blank_pct: f64,
    /// `1 - correct / total`; higher is harder.
    pub difficulty: f64,
    /// Upper-group correct rate minus lower-group correct rate.
    pub discrimination: f64,
}

impl QuestionAnalytics {
    /// Ratings are taken on the two-decimal values shown in reports.
    pub fn difficulty_rating(&self) -> DifficultyRating {
        let d = round2(self.difficulty);
        if d < 0.3 {
            DifficultyRating::Easy
        } else if d < 0.7 {
            DifficultyRating::Medium
        } else {
            DifficultyRating::Hard
        }
    }

    pub fn discrimination_rating(&self) -> DiscriminationRating {
        let d = round2(self.discrimination);
        if d < 0.0 {
            DiscriminationRating::Negative
        } else if d < 0.2 {
            DiscriminationRating::Poor
        } else if d < 0.4 {
            DiscriminationRating::Good
        } else {
            DiscriminationRating::Excellent
        }
    }
}

/// Computes cohort and item statistics.
#[derive(Debug, Clone, Copy)]
pub struct PsychometricAnalyzer {
    passing_threshold: f64,
}

impl PsychometricAnalyzer {
    /// `passing_threshold` is a fraction of the maximum score.
    pub fn new(passing_threshold: f64) -> Self {
        Self { passing_threshold }
    }

    /// Cohort statistics and per-student standings.
    pub fn analyze_students(&self, results: &[GradedResult]) -> StudentAnalysis {
        if results.is_empty() {
            return StudentAnalysis {
                stats: CohortStatistics::empty(self.passing_threshold),
                standings: BTreeMap::new(),
            };
        }

        let scores: Vec<f64> = results.iter().map(|r| r.total_score).collect();
        let average_score = mean(&scores);
        let std_deviation = population_std_dev(&scores);
        let quartiles = percentiles(&scores, &[25.0, 50.0, 75.0]);
        let boundaries = percentiles(&scores, &STANINE_CUTS);

        let threshold_pct = self.passing_threshold * 100.0;
        let passed = results
            .iter()
            .filter(|r| r.percentage >= threshold_pct)
            .count();

        let field = |f: fn(&GradedResult) -> f64| -> f64 {
            mean(&results.iter().map(f).collect::<Vec<_>>())
        };

        let stats = CohortStatistics {
            num_students: results.len(),
            average_score,
            median_score: median(&scores),
            std_deviation,
            min_score: scores.iter().cloned().fold(f64::INFINITY, f64::min),
            max_score: scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            quartiles: [quartiles[0], quartiles[1], quartiles[2]],
            passing_threshold: self.passing_threshold,
            passed,
            pass_rate: passed as f64 / results.len() as f64,
            avg_correct_count: field(|r| r.correct_count as f64),
            avg_wrong_count: field(|r| r.wrong_count as f64),
            avg_blank_count: field(|r| r.blank_count as f64),
            avg_correct_score: field(|r| r.correct_score),
            avg_wrong_score: field(|r| r.wrong_score),
            avg_blank_score: field(|r| r.blank_score),
            avg_max_score: field(|r| r.max_score),
        };

        let standings = results
            .iter()
            .map(|r| {
                let z_score = if std_deviation != 0.0 {
                    (r.total_score - average_score) / std_deviation
                } else {
                    0.0
                };
                let standing = StudentStanding {
                    z_score,
                    percentile: percentile_rank(&scores, r.total_score),
                    stanine: Stanine::from_boundaries(r.total_score, &boundaries),
                };
                (r.student_id.clone(), standing)
            })
            .collect();

        StudentAnalysis { stats, standings }
    }

    /// Computes cohort statistics and stores each student's standing on
    /// its result. Previous standings are overwritten.
    pub fn annotate(&self, results: &mut [GradedResult]) -> CohortStatistics {
        let analysis = self.analyze_students(results);
        for result in results.iter_mut() {
            result.standing = analysis.standings.get(&result.student_id).copied();
        }
        analysis.stats
    }

    /// Item statistics per category. Categories nobody answered are omitted.
    pub fn analyze_questions(
        &self,
        results: &[GradedResult],
        tallies: &BTreeMap<String, QuestionTally>,
    ) -> Vec<QuestionAnalytics> {
        let mut ranked: Vec<&GradedResult> = results.iter().collect();
        ranked.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n = ranked.len();
        let group = ((n as f64 * DISCRIMINATION_GROUP) as usize).max(1);
        let upper = &ranked[..group.min(n)];
        let lower = &ranked[n.saturating_sub(group)..];

        tallies
            .iter()
            .filter(|(_, tally)| tally.total() > 0)
            .map(|(category, tally)| {
                let total = tally.total() as f64;
                QuestionAnalytics {
                    category: category.clone(),
                    tally: *tally,
                    correct_pct: tally.correct as f64 / total * 100.0,
                    wrong_pct: tally.wrong as f64 / total * 100.0,
                    blank_pct: tally.blank as f64 / total * 100.0,
                    difficulty: 1.0 - tally.correct as f64 / total,
                    discrimination: correct_rate(upper, category, group)
                        - correct_rate(lower, category, group),
                }
            })
            .collect()
    }
}

fn correct_rate(group: &[&GradedResult], category: &str, size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    let correct = group
        .iter()
        .filter(|r| r.outcome_for(category) == Some(Outcome::Correct))
        .count();
    correct as f64 / size as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::{tally, AnswerDetail};

    fn result(student: &str, outcomes: &[(&str, Outcome)]) -> GradedResult {
        let mut r = GradedResult {
            student_id: student.to_string(),
            variant_id: "1".to_string(),
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
        for (i, (category, outcome)) in outcomes.iter().enumerate() {
            let points = match outcome {
                Outcome::Correct => {
                    r.correct_count += 1;
                    r.correct_score += 4.0;
                    4.0
                }
                Outcome::Wrong => {
                    r.wrong_count += 1;
                    0.0
                }
                Outcome::Blank => {
                    r.blank_count += 1;
                    r.blank_score += 1.0;
                    1.0
                }
            };
            r.max_score += 4.0;
            r.answers.push(AnswerDetail {
                number: i + 1,
                category: category.to_string(),
                response: String::new(),
                correct_label: "A".to_string(),
                outcome: *outcome,
                points,
            });
        }
        r.total_score = r.correct_score + r.wrong_score + r.blank_score;
        r.percentage = if r.max_score > 0.0 {
            round2(r.total_score / r.max_score * 100.0)
        } else {
            0.0
        };
        r
    }

    fn cohort() -> Vec<GradedResult> {
        use Outcome::*;
        vec![
            result("s1", &[("Q1", Correct), ("Q2", Correct), ("Q3", Correct)]),
            result("s2", &[("Q1", Correct), ("Q2", Correct), ("Q3", Wrong)]),
            result("s3", &[("Q1", Correct), ("Q2", Wrong), ("Q3", Blank)]),
            result("s4", &[("Q1", Wrong), ("Q2", Blank), ("Q3", Correct)]),
            result("s5", &[("Q1", Blank), ("Q2", Wrong), ("Q3", Wrong)]),
        ]
    }

    #[test]
    fn test_empty_cohort() {
        let analyzer = PsychometricAnalyzer::new(0.58);
        let analysis = analyzer.analyze_students(&[]);
        assert_eq!(analysis.stats, CohortStatistics::empty(0.58));
        assert!(analysis.standings.is_empty());
        assert!(analyzer.analyze_questions(&[], &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_cohort_statistics() {
        let analyzer = PsychometricAnalyzer::new(0.5);
        let results = cohort();
        let stats = analyzer.analyze_students(&results).stats;

        // totals: 12, 8, 5, 5, 1
        assert_eq!(stats.num_students, 5);
        assert!((stats.average_score - 6.2).abs() < 1e-9);
        assert_eq!(stats.median_score, 5.0);
        assert_eq!(stats.min_score, 1.0);
        assert_eq!(stats.max_score, 12.0);
        assert_eq!(stats.quartiles, [5.0, 5.0, 8.0]);
        // 12/12 and 8/12 pass at 50%
        assert_eq!(stats.passed, 2);
        assert!((stats.pass_rate - 0.4).abs() < 1e-9);
        assert!((stats.avg_correct_count - 1.4).abs() < 1e-9);
        assert_eq!(stats.avg_max_score, 12.0);
        assert_eq!(stats.passing_score(), 6.0);
    }

    #[test]
    fn test_standings() {
        let analyzer = PsychometricAnalyzer::new(0.58);
        let analysis = analyzer.analyze_students(&cohort());

        let top = analysis.standings.get("s1").expect("s1 standing");
        assert!(top.z_score > 0.0);
        assert_eq!(top.percentile, 100.0);
        assert_eq!(top.stanine, Stanine::SPlus);

        let bottom = analysis.standings.get("s5").expect("s5 standing");
        assert!(bottom.z_score < 0.0);
        assert_eq!(bottom.percentile, 20.0);
        assert_eq!(bottom.stanine, Stanine::FMinus);
    }

    #[test]
    fn test_identical_scores() {
        use Outcome::*;
        let analyzer = PsychometricAnalyzer::new(0.58);
        let results = vec![
            result("a", &[("Q1", Correct), ("Q2", Wrong)]),
            result("b", &[("Q1", Wrong), ("Q2", Correct)]),
            result("c", &[("Q1", Correct), ("Q2", Wrong)]),
        ];
        let analysis = analyzer.analyze_students(&results);

        assert_eq!(analysis.stats.std_deviation, 0.0);
        for standing in analysis.standings.values() {
            assert_eq!(standing.z_score, 0.0);
            assert_eq!(standing.stanine, Stanine::SPlus);
        }
    }

    #[test]
    fn test_identical_fractional_scores() {
        use Outcome::*;
        let analyzer = PsychometricAnalyzer::new(0.58);
        let results: Vec<GradedResult> = ["s0", "s1", "s2"]
            .iter()
            .map(|id| {
                let mut r = result(id, &[("Q1", Correct)]);
                r.correct_score = 0.7;
                r.total_score = 0.7;
                r
            })
            .collect();
        let analysis = analyzer.analyze_students(&results);

        assert_eq!(analysis.stats.std_deviation, 0.0);
        for standing in analysis.standings.values() {
            assert_eq!(standing.z_score, 0.0);
            assert_eq!(standing.stanine, Stanine::SPlus);
        }
    }

    #[test]
    fn test_annotate_is_idempotent() {
        let analyzer = PsychometricAnalyzer::new(0.58);
        let mut results = cohort();

        let first = analyzer.annotate(&mut results);
        let snapshot = results.clone();
        let second = analyzer.annotate(&mut results);

        assert_eq!(first, second);
        assert_eq!(snapshot, results);
        assert!(results.iter().all(|r| r.standing.is_some()));
    }

    #[test]
    fn test_item_analysis() {
        let analyzer = PsychometricAnalyzer::new(0.58);
        let results = cohort();
        let tallies = tally(&results);
        let items = analyzer.analyze_questions(&results, &tallies);

        assert_eq!(items.len(), 3);
        let q1 = items.iter().find(|q| q.category == "Q1").expect("Q1");
        assert_eq!(q1.tally.correct, 3);
        assert!((q1.correct_pct - 60.0).abs() < 1e-9);
        assert!((q1.difficulty - 0.4).abs() < 1e-9);
        // group size max(1, floor(5 * 0.27)) = 1: s1 vs s5
        assert!((q1.discrimination - 1.0).abs() < 1e-9);
        assert_eq!(q1.difficulty_rating(), DifficultyRating::Medium);
        assert_eq!(q1.discrimination_rating(), DiscriminationRating::Excellent);

        // repeatable
        assert_eq!(items, analyzer.analyze_questions(&results, &tallies));
    }

    #[test]
    fn test_negative_discrimination() {
        use Outcome::*;
        let analyzer = PsychometricAnalyzer::new(0.58);
        let results = vec![
            result("strong", &[("Easy", Correct), ("Trick", Wrong)]),
            result("weak", &[("Easy", Wrong), ("Trick", Correct)]),
        ];
        let items = analyzer.analyze_questions(&results, &tally(&results));
        let trick = items.iter().find(|q| q.category == "Trick").expect("Trick");
        // both score 4; stable order keeps "strong" in the upper group
        assert!((trick.discrimination + 1.0).abs() < 1e-9);
        assert_eq!(trick.discrimination_rating(), DiscriminationRating::Negative);
    }

    #[test]
    fn test_stanine_boundaries() {
        let cuts = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(Stanine::from_boundaries(0.5, &cuts), Stanine::FMinus);
        assert_eq!(Stanine::from_boundaries(1.0, &cuts), Stanine::F);
        assert_eq!(Stanine::from_boundaries(4.5, &cuts), Stanine::C);
        assert_eq!(Stanine::from_boundaries(8.0, &cuts), Stanine::SPlus);
        assert_eq!(Stanine::SPlus.to_string(), "S+");
        assert_eq!(Stanine::FMinus.to_string(), "F-");
    }

    #[test]
    fn test_ratings() {
        let item = |difficulty: f64, discrimination: f64| QuestionAnalytics {
            category: "x".to_string(),
            tally: QuestionTally::default(),
            correct_pct: 0.0,
            wrong_pct: 0.0,
            blank_pct: 0.0,
            difficulty,
            discrimination,
        };
        assert_eq!(item(0.1, 0.0).difficulty_rating(), DifficultyRating::Easy);
        assert_eq!(item(0.69, 0.0).difficulty_rating(), DifficultyRating::Medium);
        assert_eq!(item(0.7, 0.0).difficulty_rating(), DifficultyRating::Hard);
        assert_eq!(item(0.0, 0.1).discrimination_rating(), DiscriminationRating::Poor);
        assert_eq!(item(0.0, 0.3).discrimination_rating(), DiscriminationRating::Good);
        assert_eq!(item(0.0, 0.4).discrimination_rating(), DiscriminationRating::Excellent);
        assert_eq!(DifficultyRating::Hard.to_string(), "Difficile");
    }
}
