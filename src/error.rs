//! Error types for exam-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Configuration loading and validation
//! - Question bank construction
//! - Answer-key registry persistence
//! - Spreadsheet input/output
//! - Document and chart rendering

use thiserror::Error;

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid JSON in configuration file '{path}': {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while building the question bank.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("Question '{category}' has {count} correct answers, expected exactly one")]
    CorrectAnswerCount { category: String, count: usize },

    #[error("Question '{0}' has no answers")]
    NoAnswers(String),

    #[error("Category '{0}' appears more than once in the bank")]
    DuplicateCategory(String),

    #[error("Question bank is empty")]
    Empty,
}

/// Errors that can occur while building, persisting or querying the answer-key registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Variant '{0}' not found in answer-key registry")]
    UnknownVariant(String),

    #[error("Variant '{0}' appears more than once")]
    DuplicateVariant(String),

    #[error("Question {number} of variant '{variant}' has no correct answer")]
    MissingCorrectAnswer { variant: String, number: usize },

    #[error("Question {number} of variant '{variant}' has no source category")]
    MissingCategory { variant: String, number: usize },

    #[error("Invalid question number '{number}' in variant '{variant}'")]
    InvalidQuestionNumber { variant: String, number: String },

    #[error("Question numbers of variant '{0}' are not contiguous from 1")]
    NonContiguous(String),

    #[error("Refusing to persist an empty answer-key registry")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while reading or writing spreadsheets.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("Spreadsheet error: {0}")]
    Read(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook '{0}' contains no sheets")]
    NoSheets(String),

    #[error("Missing required columns in '{path}': {columns}")]
    MissingColumns { path: String, columns: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while rendering documents and charts.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Tera template rendering error: {0}")]
    Tera(#[from] tera::Error),

    #[error("Document compiler '{compiler}' is not available: {reason}")]
    CompilerUnavailable { compiler: String, reason: String },

    #[error("Compiler produced no document for variant '{variant}'")]
    NoOutput { variant: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
