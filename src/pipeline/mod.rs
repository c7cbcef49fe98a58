//! Two-phase orchestration.
//!
//! Phase 1 ([`run_generation`]) samples the bank, generates and ranks candidate
//! variants, renders them and persists the answer keys. Phase 2
//! ([`run_grading`]) reads the answer keys back, grades the submissions and
//! writes every report. The answer-key file is the only state shared between
//! the two.

mod generate;
mod grade;

pub use generate::{run_generation, GenerationOptions, GenerationSummary};
pub use grade::{run_grading, GradingOptions, GradingSummary};

use crate::registry::MAPPINGS_FILENAME;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_QUESTIONS_FILE: &str = "questions.xlsx";
pub const ANSWER_TEMPLATE_FILE: &str = "student_answers.xlsx";

/// Where every artifact of both phases is written, relative to one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tex_dir(&self) -> PathBuf {
        self.root.join("tests_tex")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.root.join("tests_pdf")
    }

    pub fn answer_keys_report(&self) -> PathBuf {
        self.root.join("answer_keys_report.txt")
    }

    pub fn mappings(&self) -> PathBuf {
        self.root.join(MAPPINGS_FILENAME)
    }

    pub fn answer_template(&self) -> PathBuf {
        self.root.join(ANSWER_TEMPLATE_FILE)
    }

    pub fn question_report_dir(&self) -> PathBuf {
        self.root.join("report_questions")
    }

    pub fn question_report(&self) -> PathBuf {
        self.question_report_dir().join("report_quest.txt")
    }

    pub fn stacked_chart(&self) -> PathBuf {
        self.question_report_dir().join("all_questions_stacked.svg")
    }

    pub fn score_histogram(&self) -> PathBuf {
        self.question_report_dir().join("score_distribution.svg")
    }

    pub fn student_report(&self) -> PathBuf {
        self.root.join("report_students.txt")
    }

    pub fn detailed_student_report(&self) -> PathBuf {
        self.root.join("report_students_detailed.txt")
    }

    pub fn summary_workbook(&self) -> PathBuf {
        self.root.join("report_students_summary.xlsx")
    }

    pub fn teacher_report(&self) -> PathBuf {
        self.root.join("teacher_report.txt")
    }
}

fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory '{}'", path.display()))
}

fn write_text(path: &Path, content: &str) -> anyhow::Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write '{}'", path.display()))
}
