//! CLI support for tine-lang
//!
//! Provides programmatic access to the `tine` command's behavior so other
//! tools can embed it without spawning a process.

mod check;

pub use check::{CheckOptions, CheckResult, execute_check, render_output};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Filter failed to compile
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    /// Filter failed while running
    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    /// Input is not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading input failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}
