//! Named string formats used by `@name` and `@name "..."`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{
    evaluator::{EvalError, describe},
    output::{format_number, to_json},
    value::Value,
};

/// Every format `@name` accepts.
pub const FORMATS: &[&str] = &[
    "text", "json", "html", "uri", "csv", "tsv", "sh", "base64", "base64d",
];

/// Strings as they are, anything else as compact JSON.
pub fn tostring(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => to_json(other),
    }
}

/// Render `value` with the named format.
pub fn apply(name: &str, value: &Value) -> Result<String, EvalError> {
    match name {
        "text" => Ok(tostring(value)),
        "json" => Ok(to_json(value)),
        "html" => Ok(html(&tostring(value))),
        "uri" => Ok(uri(&tostring(value))),
        "csv" => csv(value),
        "tsv" => tsv(value),
        "sh" => sh(value),
        "base64" => Ok(STANDARD.encode(tostring(value).as_bytes())),
        "base64d" => base64_decode(&tostring(value)),
        other => Err(EvalError::UnknownFormat(other.to_string())),
    }
}

fn html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encode everything outside the unreserved set.
fn uri(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn row<'v>(value: &'v Value, format: &str) -> Result<&'v [Value], EvalError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(EvalError::Type(format!(
            "{} cannot be {}-formatted, only an array can be",
            describe(other),
            format
        ))),
    }
}

fn csv(value: &Value) -> Result<String, EvalError> {
    let cells = row(value, "csv")?
        .iter()
        .map(|cell| match cell {
            Value::Null => Ok(String::new()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(format_number(*n)),
            Value::String(s) => Ok(format!("\"{}\"", s.replace('"', "\"\""))),
            other => Err(EvalError::Type(format!(
                "{} is not valid in a csv row",
                describe(other)
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cells.join(","))
}

fn tsv(value: &Value) -> Result<String, EvalError> {
    let cells = row(value, "tsv")?
        .iter()
        .map(|cell| match cell {
            Value::Null => Ok(String::new()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(format_number(*n)),
            Value::String(s) => Ok(s
                .replace('\\', "\\\\")
                .replace('\t', "\\t")
                .replace('\r', "\\r")
                .replace('\n', "\\n")),
            other => Err(EvalError::Type(format!(
                "{} is not valid in a tsv row",
                describe(other)
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cells.join("\t"))
}

fn sh_word(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(format!("'{}'", s.replace('\'', "'\\''"))),
        Value::Array(_) | Value::Object(_) => Err(EvalError::Type(format!(
            "{} can not be escaped for shell",
            describe(value)
        ))),
        scalar => Ok(to_json(scalar)),
    }
}

/// Single-quoted shell words; an array becomes space-separated words.
fn sh(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .map(sh_word)
            .collect::<Result<Vec<_>, _>>()?
            .join(" ")),
        other => sh_word(other),
    }
}

fn base64_decode(s: &str) -> Result<String, EvalError> {
    // tolerate missing padding
    let mut padded = s.trim_end_matches('=').to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    STANDARD
        .decode(padded.as_bytes())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|_| {
            EvalError::Type(format!(
                "{} is not valid base64 data",
                describe(&Value::String(s.to_string()))
            ))
        })
}
