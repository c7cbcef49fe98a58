//! Exam configuration.
//!
//! The configuration file is JSON that may contain C-style block comments
//! (`/* ... */`). Comments are stripped before parsing; every key is optional
//! and falls back to the defaults below.

use crate::bank::ScoreWeights;
use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_GEOMETRY: &str = "top=1cm,bottom=0.5cm,left=1cm,right=1cm";
const DEFAULT_FOOTER_RIGHT: &str = r"Variante~\thevariant~/~\thepage";
const DEFAULT_COMPILER: &str = "pdflatex";

/// How correct-choice labels are written in answer keys and on the paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum AnswerLabelFormat {
    /// `A`, `B`, `C`, ...
    #[default]
    LettersUpper,
    /// `a`, `b`, `c`, ...
    LettersLower,
    /// `1`, `2`, `3`, ...
    Numbers,
}

impl From<String> for AnswerLabelFormat {
    fn from(value: String) -> Self {
        match value.as_str() {
            "letters_upper" => AnswerLabelFormat::LettersUpper,
            "letters_lower" => AnswerLabelFormat::LettersLower,
            _ => AnswerLabelFormat::Numbers,
        }
    }
}

impl AnswerLabelFormat {
    /// Returns the label for a zero-based choice index.
    pub fn label(&self, index: usize) -> String {
        match self {
            AnswerLabelFormat::LettersUpper => letter_label(b'A', index),
            AnswerLabelFormat::LettersLower => letter_label(b'a', index),
            AnswerLabelFormat::Numbers => (index + 1).to_string(),
        }
    }

    /// Returns the LaTeX counter style matching this label format.
    pub fn latex_counter(&self) -> &'static str {
        match self {
            AnswerLabelFormat::LettersUpper => r"\Alph",
            AnswerLabelFormat::LettersLower => r"\alph",
            AnswerLabelFormat::Numbers => r"\arabic",
        }
    }
}

/// Letters run `a..=z`; later choices are numbered.
fn letter_label(base: u8, index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => char::from(base + offset).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Configuration for both phases of an exam run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    /// Points for a correct answer when the question has no override.
    pub default_correct_score: f64,
    /// Points for a wrong answer when the question has no override.
    pub default_wrong_score: f64,
    /// Points for a blank answer when the question has no override.
    pub default_no_answer_score: f64,
    /// Passing threshold as a fraction of the maximum score.
    pub passing_threshold: f64,
    /// Number of variants to keep.
    pub num_variants: usize,
    /// Number of candidate variants generated before ranking.
    pub num_potential_variants_for_randomness_check: usize,

    // Document layout
    pub geometry_options: String,
    pub firstpageheader_left: String,
    pub firstpageheader_center: Option<String>,
    pub firstpageheader_right: String,
    /// Legacy name for the centered first-page header.
    pub test_header: Option<String>,
    pub runningfooter_left: String,
    pub runningfooter_center: String,
    pub runningfooter_right: String,

    /// Label style for answer keys and printed choices.
    pub choice_label_format: AnswerLabelFormat,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
    /// Executable used to compile variant documents.
    pub latex_compiler: String,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            default_correct_score: 4.0,
            default_wrong_score: 0.0,
            default_no_answer_score: 1.0,
            passing_threshold: 0.58,
            num_variants: 1,
            num_potential_variants_for_randomness_check: 10,
            geometry_options: DEFAULT_GEOMETRY.to_string(),
            firstpageheader_left: String::new(),
            firstpageheader_center: None,
            firstpageheader_right: String::new(),
            test_header: None,
            runningfooter_left: String::new(),
            runningfooter_center: String::new(),
            runningfooter_right: DEFAULT_FOOTER_RIGHT.to_string(),
            choice_label_format: AnswerLabelFormat::default(),
            seed: None,
            latex_compiler: DEFAULT_COMPILER.to_string(),
        }
    }
}

impl ExamConfig {
    /// Loads and validates the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist,
    /// `ConfigError::InvalidJson` if it cannot be parsed, and
    /// `ConfigError::InvalidValue` if a value is out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(|e| match e {
            ConfigError::InvalidJson { source, .. } => ConfigError::InvalidJson {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parses a configuration from JSON text, stripping block comments first.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let stripped = strip_block_comments(content);
        let config: ExamConfig =
            serde_json::from_str(&stripped).map_err(|source| ConfigError::InvalidJson {
                path: "<inline>".to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_variants == 0 {
            return Err(ConfigError::InvalidValue {
                key: "num_variants".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.num_potential_variants_for_randomness_check < self.num_variants {
            return Err(ConfigError::InvalidValue {
                key: "num_potential_variants_for_randomness_check".to_string(),
                message: format!(
                    "must be at least num_variants ({})",
                    self.num_variants
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.passing_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "passing_threshold".to_string(),
                message: format!("{} is not a fraction in [0, 1]", self.passing_threshold),
            });
        }

        if self.latex_compiler.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "latex_compiler".to_string(),
                message: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Process-wide default score weights.
    pub fn default_scores(&self) -> ScoreWeights {
        ScoreWeights {
            correct: self.default_correct_score,
            wrong: self.default_wrong_score,
            blank: self.default_no_answer_score,
        }
    }

    /// Centered first-page header, falling back to `test_header`.
    pub fn header_center(&self) -> &str {
        self.firstpageheader_center
            .as_deref()
            .or(self.test_header.as_deref())
            .unwrap_or("")
    }
}

/// Removes `/* ... */` comments, including ones spanning several lines.
pub fn strip_block_comments(content: &str) -> String {
    match Regex::new(r"(?s)/\*.*?\*/") {
        Ok(re) => re.replace_all(content, "").into_owned(),
        Err(_) => content.to_string(),
    }
}
