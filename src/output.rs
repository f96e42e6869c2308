//! JSON text rendering for values.
//!
//! This module turns a [`Value`] back into JSON text, either compact or
//! indented. Rendering is deterministic: object members come out in insertion
//! order and numbers use their shortest natural form.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`] - no whitespace at all
//! - **Pretty output** via [`to_json_pretty()`] - two-space indentation
//! - **Custom layout** via [`render()`] - any indent step and line terminator
//! - **String escaping** - quotes, backslashes and control characters
//!
//! Everything rendered here can be read back by the lexer as a literal, apart
//! from NaN (rendered as `null`).
//!
//! # Examples
//!
//! ```
//! use tine_lang::Value;
//! use tine_lang::output::{to_json, to_json_pretty};
//!
//! let value = Value::from_json_str(r#"{"b": [1, 2.5], "a": null}"#).unwrap();
//!
//! assert_eq!(to_json(&value), r#"{"b":[1,2.5],"a":null}"#);
//! assert_eq!(
//!     to_json_pretty(&value),
//!     "{\n  \"b\": [\n    1,\n    2.5\n  ],\n  \"a\": null\n}"
//! );
//! ```

use crate::value::{Map, Value};

/// Serializer with a configurable indent step and line terminator.
///
/// An empty `newline` gives the compact layout: no line breaks and no space
/// after `:`.
#[derive(Debug, Clone)]
pub struct Printer {
    indent: String,
    newline: String,
}

impl Printer {
    pub fn new(indent: &str, newline: &str) -> Self {
        Printer {
            indent: indent.to_string(),
            newline: newline.to_string(),
        }
    }

    pub fn compact() -> Self {
        Printer::new("", "")
    }

    /// Newline-separated layout indented by `width` spaces per level.
    pub fn pretty(width: usize) -> Self {
        Printer::new(&" ".repeat(width), "\n")
    }

    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.print_value(value, 0, &mut out);
        out
    }

    fn print_value(&self, value: &Value, level: usize, out: &mut String) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::String(s) => escape_string(s, out),
            Value::Array(arr) => self.print_array(arr, level, out),
            Value::Object(obj) => self.print_object(obj, level, out),
        }
    }

    fn print_array(&self, arr: &[Value], level: usize, out: &mut String) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        out.push('[');
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.break_line(level + 1, out);
            self.print_value(item, level + 1, out);
        }
        self.break_line(level, out);
        out.push(']');
    }

    fn print_object(&self, obj: &Map, level: usize, out: &mut String) {
        if obj.is_empty() {
            out.push_str("{}");
            return;
        }

        let separator = if self.newline.is_empty() { ":" } else { ": " };
        out.push('{');
        for (i, (key, item)) in obj.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.break_line(level + 1, out);
            escape_string(key, out);
            out.push_str(separator);
            self.print_value(item, level + 1, out);
        }
        self.break_line(level, out);
        out.push('}');
    }

    fn break_line(&self, level: usize, out: &mut String) {
        out.push_str(&self.newline);
        for _ in 0..level {
            out.push_str(&self.indent);
        }
    }
}

fn escape_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Natural text form of a number.
///
/// Integral values print without a fraction, very large or very small
/// magnitudes use exponent notation, NaN is `null` and infinities clamp to
/// the largest finite double.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "null".to_string();
    }
    if n.is_infinite() {
        let max = if n > 0.0 { f64::MAX } else { f64::MIN };
        return format_number(max);
    }
    if n.fract() == 0.0 && n.abs() < 1e17 {
        return format!("{}", n as i64);
    }
    if n.abs() >= 1e17 || n.abs() < 1e-5 {
        let text = format!("{:e}", n);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        };
    }
    format!("{}", n)
}

/// `render(value, indent_unit, newline)` with an explicit layout.
pub fn render(value: &Value, indent: &str, newline: &str) -> String {
    Printer::new(indent, newline).print(value)
}

/// Converts a Value to compact JSON text.
///
/// # Examples
///
/// ```
/// use tine_lang::Value;
/// use tine_lang::output::to_json;
///
/// let value = Value::from_json_str(r#"{"name": "Alice", "tags": ["a\nb"]}"#).unwrap();
/// assert_eq!(to_json(&value), r#"{"name":"Alice","tags":["a\nb"]}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    Printer::compact().print(value)
}

/// Converts a Value to JSON text indented by two spaces per level.
pub fn to_json_pretty(value: &Value) -> String {
    Printer::pretty(2).print(value)
}
