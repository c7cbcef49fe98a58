//! Command-line interface for exam-forge.
//!
//! One entry point with a required phase selector: 1 generates the variants,
//! 2 grades the submissions.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
