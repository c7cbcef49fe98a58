//! Phase 2: grading and reporting.

use super::{ensure_dir, write_text, OutputLayout, ANSWER_TEMPLATE_FILE, DEFAULT_CONFIG_FILE};
use crate::analytics::{CohortStatistics, PsychometricAnalyzer, QuestionAnalytics};
use crate::config::ExamConfig;
use crate::grading::{GradedResult, Grader, SkippedSubmission};
use crate::registry::{AnswerKeyRegistry, MAPPINGS_FILENAME};
use crate::render::{
    detailed_student_report, pie_chart_file_name, question_pie_chart, question_report,
    score_histogram, stacked_bar_chart, student_report, teacher_report,
};
use crate::workbook::{read_submissions, write_summary};
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{info, warn};

/// Inputs for phase 2.
#[derive(Debug, Clone)]
pub struct GradingOptions {
    pub config: PathBuf,
    pub answers: PathBuf,
    pub mappings: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for GradingOptions {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            answers: PathBuf::from(ANSWER_TEMPLATE_FILE),
            mappings: PathBuf::from(MAPPINGS_FILENAME),
            output_dir: PathBuf::from("."),
        }
    }
}

impl GradingOptions {
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = path.into();
        self
    }

    pub fn with_answers(mut self, path: impl Into<PathBuf>) -> Self {
        self.answers = path.into();
        self
    }

    pub fn with_mappings(mut self, path: impl Into<PathBuf>) -> Self {
        self.mappings = path.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }
}

/// What phase 2 produced.
#[derive(Debug, Clone)]
pub struct GradingSummary {
    pub results: Vec<GradedResult>,
    pub skipped: Vec<SkippedSubmission>,
    pub stats: CohortStatistics,
    pub questions: Vec<QuestionAnalytics>,
}

/// Runs phase 2 end to end.
pub fn run_grading(options: &GradingOptions) -> anyhow::Result<GradingSummary> {
    let config = ExamConfig::load(&options.config).with_context(|| {
        format!("Failed to load configuration '{}'", options.config.display())
    })?;
    if !options.answers.exists() {
        bail!("Student answers not found: {}", options.answers.display());
    }
    if !options.mappings.exists() {
        bail!(
            "Answer keys not found: {} (run phase 1 first)",
            options.mappings.display()
        );
    }

    let registry = AnswerKeyRegistry::load(&options.mappings)
        .with_context(|| format!("Failed to load answer keys '{}'", options.mappings.display()))?;
    info!(variants = registry.len(), "Answer keys loaded");

    let submissions = read_submissions(&options.answers).with_context(|| {
        format!("Failed to read student answers '{}'", options.answers.display())
    })?;
    if submissions.is_empty() {
        warn!(path = %options.answers.display(), "No submissions to grade");
    }

    let grader = Grader::new(&registry, config.default_scores());
    let mut report = grader.grade_all(&submissions);
    if !report.skipped.is_empty() {
        warn!(count = report.skipped.len(), "Some submissions were not graded");
    }

    let analyzer = PsychometricAnalyzer::new(config.passing_threshold);
    let stats = analyzer.annotate(&mut report.results);
    let questions = analyzer.analyze_questions(&report.results, &report.tallies);
    info!("{}", stats.summary());

    let layout = OutputLayout::new(&options.output_dir);
    write_reports(&layout, &report.results, &stats, &questions, &registry)?;

    Ok(GradingSummary {
        results: report.results,
        skipped: report.skipped,
        stats,
        questions,
    })
}

fn write_reports(
    layout: &OutputLayout,
    results: &[GradedResult],
    stats: &CohortStatistics,
    questions: &[QuestionAnalytics],
    registry: &AnswerKeyRegistry,
) -> anyhow::Result<()> {
    let chart_dir = layout.question_report_dir();
    ensure_dir(&chart_dir)?;

    write_text(&layout.question_report(), &question_report(questions, stats))?;
    for item in questions {
        let path = chart_dir.join(pie_chart_file_name(&item.category));
        write_text(&path, &question_pie_chart(item)?)?;
    }
    write_text(&layout.stacked_chart(), &stacked_bar_chart(questions)?)?;

    let scores: Vec<f64> = results.iter().map(|r| r.total_score).collect();
    write_text(&layout.score_histogram(), &score_histogram(&scores, stats)?)?;

    write_text(&layout.student_report(), &student_report(results, stats))?;
    write_text(
        &layout.detailed_student_report(),
        &detailed_student_report(results),
    )?;
    write_summary(&layout.summary_workbook(), results)?;
    write_text(&layout.teacher_report(), &teacher_report(stats, registry))?;

    info!(dir = %layout.root().display(), "Reports written");
    Ok(())
}
