//! Run tine filters against JSON input

use serde_json::Deserializer;
use tracing::debug;

use super::CliError;
use crate::{Value, compile, to_json, to_json_pretty};

/// Options for the `run` and `check` commands
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The filter to run
    pub query: String,
    /// JSON input text, possibly several whitespace-separated documents
    pub input: Option<String>,
    /// Print each output on a single line
    pub compact: bool,
    /// Print string outputs without quotes
    pub raw_output: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Filter ran; one rendered line per output, in order
    Success(Vec<String>),
}

/// Render one output the way the command prints it.
pub fn render_output(value: &Value, options: &CheckOptions) -> String {
    match value {
        Value::String(s) if options.raw_output => s.clone(),
        other if options.compact => to_json(other),
        other => to_json_pretty(other),
    }
}

/// Compile the filter and, unless only the syntax is checked, run it on
/// every JSON document in the input.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let filter = compile(&options.query)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let text = options.input.as_ref().ok_or(CliError::NoInput)?;

    let mut lines = Vec::new();
    for (n, document) in Deserializer::from_str(text)
        .into_iter::<serde_json::Value>()
        .enumerate()
    {
        let input = Value::from(document?);
        debug!(document = n, "running filter");
        for output in filter.run(input) {
            lines.push(render_output(&output?, options));
        }
    }
    Ok(CheckResult::Success(lines))
}
