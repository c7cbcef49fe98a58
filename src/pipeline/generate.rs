//! Phase 1: variant generation.

use super::{ensure_dir, write_text, OutputLayout, DEFAULT_CONFIG_FILE, DEFAULT_QUESTIONS_FILE};
use crate::bank::QuestionBank;
use crate::config::ExamConfig;
use crate::error::BankError;
use crate::generator::{create_rng, Variant, VariantGenerator};
use crate::randomness::{RandomnessMetrics, RandomnessScorer};
use crate::registry::AnswerKeyRegistry;
use crate::render::{
    answer_keys_report, render_variant, variant_file_stem, DocumentLayout, LatexCompiler,
};
use crate::workbook::{read_questions, write_template};
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{error, info};

/// Inputs and switches for phase 1.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub config: PathBuf,
    pub questions: PathBuf,
    pub output_dir: PathBuf,
    /// Overrides the seed from the configuration file.
    pub seed: Option<u64>,
    /// When false only `.tex` sources are written and the compiler is never invoked.
    pub compile: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            questions: PathBuf::from(DEFAULT_QUESTIONS_FILE),
            output_dir: PathBuf::from("."),
            seed: None,
            compile: true,
        }
    }
}

impl GenerationOptions {
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = path.into();
        self
    }

    pub fn with_questions(mut self, path: impl Into<PathBuf>) -> Self {
        self.questions = path.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_compile(mut self, compile: bool) -> Self {
        self.compile = compile;
        self
    }
}

/// What phase 1 produced.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub questions: usize,
    pub candidates: usize,
    /// Selected variant ids in rank order.
    pub variant_ids: Vec<String>,
    pub metrics: RandomnessMetrics,
    pub compiled: usize,
    pub failed: usize,
    pub mappings: PathBuf,
}

/// Runs phase 1 end to end.
///
/// Configuration and input problems abort the run before anything is written.
/// Compiler failures are reported per variant and do not stop the others.
pub fn run_generation(options: &GenerationOptions) -> anyhow::Result<GenerationSummary> {
    let config = ExamConfig::load(&options.config).with_context(|| {
        format!("Failed to load configuration '{}'", options.config.display())
    })?;
    if !options.questions.exists() {
        bail!("Question bank not found: {}", options.questions.display());
    }

    let compiler = LatexCompiler::new(config.latex_compiler.clone());
    if options.compile {
        compiler.check_available()?;
    }

    let seed = options.seed.or(config.seed);
    if let Some(seed) = seed {
        info!(seed, "Using fixed seed");
    }
    let mut rng = create_rng(seed);

    let questions = read_questions(&options.questions, &mut rng).with_context(|| {
        format!("Failed to read question bank '{}'", options.questions.display())
    })?;
    if questions.is_empty() {
        return Err(BankError::Empty).context("No usable questions; answer keys not written");
    }
    let bank = QuestionBank::new(questions).context("Invalid question bank")?;
    info!(questions = bank.len(), "Question bank ready");

    let candidate_count = config.num_potential_variants_for_randomness_check;
    let candidates = VariantGenerator::new(&bank, rng).generate(candidate_count);

    let scorer = RandomnessScorer::new(&bank);
    let metrics = scorer.evaluate(&candidates).rounded();
    info!(
        question_order = metrics.question_order_randomness,
        answer_order = metrics.answer_order_randomness,
        combined = metrics.combined_randomness,
        "Candidate pool randomness"
    );

    let variants: Vec<Variant> = scorer
        .select_best(candidates, config.num_variants)
        .into_iter()
        .map(|scored| {
            info!(
                variant = %scored.variant.id,
                score = scored.score,
                question_order = scored.question_order_score,
                answer_order = scored.answer_order_score,
                "Selected variant"
            );
            scored.variant
        })
        .collect();
    if variants.is_empty() {
        bail!("Variant generation produced nothing; answer keys not written");
    }

    let registry = AnswerKeyRegistry::from_variants(&variants, config.choice_label_format)?;

    let layout = OutputLayout::new(&options.output_dir);
    let compiler = options.compile.then_some(&compiler);
    let (compiled, failed) = write_documents(&variants, &config, &layout, compiler)?;

    let mappings = layout.mappings();
    registry
        .save(&mappings)
        .with_context(|| format!("Failed to write answer keys '{}'", mappings.display()))?;
    info!(path = %mappings.display(), variants = registry.len(), "Answer keys saved");

    write_text(&layout.answer_keys_report(), &answer_keys_report(&registry))?;
    write_template(&layout.answer_template(), registry.max_questions())?;

    Ok(GenerationSummary {
        questions: bank.len(),
        candidates: candidate_count,
        variant_ids: variants.iter().map(|v| v.id.clone()).collect(),
        metrics,
        compiled,
        failed,
        mappings,
    })
}

/// Writes one `.tex` per variant and, with a compiler, its PDF.
/// Returns `(compiled, failed)`.
fn write_documents(
    variants: &[Variant],
    config: &ExamConfig,
    layout: &OutputLayout,
    compiler: Option<&LatexCompiler>,
) -> anyhow::Result<(usize, usize)> {
    let tex_dir = layout.tex_dir();
    let pdf_dir = layout.pdf_dir();
    ensure_dir(&tex_dir)?;
    if compiler.is_some() {
        ensure_dir(&pdf_dir)?;
    }

    let document = DocumentLayout::from_config(config);
    let (mut compiled, mut failed) = (0, 0);

    for variant in variants {
        let source = render_variant(variant, &document)
            .with_context(|| format!("Failed to render variant {}", variant.id))?;
        let tex_path = tex_dir.join(format!("{}.tex", variant_file_stem(&variant.id)));
        write_text(&tex_path, &source)?;

        let Some(compiler) = compiler else {
            continue;
        };
        match compiler.compile(&tex_path, &pdf_dir, &variant.id) {
            Ok(pdf) => {
                info!(variant = %variant.id, pdf = %pdf.display(), "Compiled variant");
                compiled += 1;
            }
            Err(e) => {
                error!(variant = %variant.id, error = %e, "Compilation failed");
                failed += 1;
            }
        }
    }

    Ok((compiled, failed))
}
