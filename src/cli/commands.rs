//! CLI argument definitions and phase dispatch.

use crate::pipeline::{
    run_generation, run_grading, GenerationOptions, GradingOptions, OutputLayout,
    ANSWER_TEMPLATE_FILE, DEFAULT_CONFIG_FILE, DEFAULT_QUESTIONS_FILE,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Randomized exam variant generator and psychometric grader.
#[derive(Parser, Debug)]
#[command(name = "exam-forge")]
#[command(about = "Generate randomized exam variants and grade student answers")]
#[command(version)]
#[command(
    long_about = "exam-forge runs in two phases.\n\nPhase 1 samples one question per sheet of the question bank, generates candidate variants, keeps the most shuffled ones, renders them to LaTeX/PDF and saves the answer keys.\n\nPhase 2 grades the filled-in answer sheet against those keys and writes the reports.\n\nExample usage:\n  exam-forge --phase 1 --questions questions.xlsx --config config.json\n  exam-forge --phase 2 --answers student_answers.xlsx"
)]
pub struct Cli {
    /// Phase to run: 1 = generate variants, 2 = grade submissions.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub phase: u8,

    /// Configuration file (JSON, block comments allowed).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Question bank workbook (phase 1).
    #[arg(short, long, default_value = DEFAULT_QUESTIONS_FILE)]
    pub questions: PathBuf,

    /// Filled-in answer workbook (phase 2). Defaults to the template in the output directory.
    #[arg(short, long)]
    pub answers: Option<PathBuf>,

    /// Answer-key file (phase 2). Defaults to the one in the output directory.
    #[arg(short, long)]
    pub mappings: Option<PathBuf>,

    /// Directory for every generated artifact.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Seed for reproducible runs; overrides the configuration file.
    #[arg(short, long, env = "EXAM_FORGE_SEED")]
    pub seed: Option<u64>,

    /// Write LaTeX sources only; skip the compiler (phase 1).
    #[arg(long)]
    pub no_compile: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions::default()
            .with_config(&self.config)
            .with_questions(&self.questions)
            .with_output_dir(&self.output_dir)
            .with_seed(self.seed)
            .with_compile(!self.no_compile)
    }

    pub fn grading_options(&self) -> GradingOptions {
        let layout = OutputLayout::new(&self.output_dir);
        GradingOptions::default()
            .with_config(&self.config)
            .with_answers(
                self.answers
                    .clone()
                    .unwrap_or_else(|| self.output_dir.join(ANSWER_TEMPLATE_FILE)),
            )
            .with_mappings(self.mappings.clone().unwrap_or_else(|| layout.mappings()))
            .with_output_dir(&self.output_dir)
    }
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses the arguments and runs the selected phase.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Runs the selected phase with already parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.phase {
        1 => {
            let summary = run_generation(&cli.generation_options())?;
            info!(
                variants = summary.variant_ids.len(),
                questions = summary.questions,
                compiled = summary.compiled,
                failed = summary.failed,
                "Phase 1 complete: {}",
                summary.metrics
            );
        }
        _ => {
            let summary = run_grading(&cli.grading_options())?;
            info!(
                graded = summary.results.len(),
                skipped = summary.skipped.len(),
                "Phase 2 complete: {}",
                summary.stats.summary()
            );
        }
    }
    Ok(())
}
