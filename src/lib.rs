//! exam_forge: randomized exam variants and psychometric grading.
//!
//! Phase 1 turns a question bank into ranked, shuffled exam variants and
//! persists their answer keys. Phase 2 grades student submissions against
//! those keys and produces cohort and item statistics.

pub mod analytics;
pub mod bank;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod grading;
pub mod pipeline;
pub mod randomness;
pub mod registry;
pub mod render;
pub mod workbook;

pub use error::{BankError, ConfigError, RegistryError, RenderError, WorkbookError};
