//! String natives.

use regex::{Regex, RegexBuilder};

use crate::{
    evaluator::{EvalError, describe, operators},
    format,
    output::format_number,
    value::Value,
};

use super::{Native, Run};

pub(super) const NATIVES: &[Native] = &[
    Native::new("utf8bytelength", 0, Run::Nullary(utf8bytelength)),
    Native::new("explode", 0, Run::Nullary(explode)),
    Native::new("implode", 0, Run::Nullary(implode)),
    Native::new("ascii_downcase", 0, Run::Nullary(ascii_downcase)),
    Native::new("ascii_upcase", 0, Run::Nullary(ascii_upcase)),
    Native::new("trim", 0, Run::Nullary(trim)),
    Native::new("ltrim", 0, Run::Nullary(ltrim)),
    Native::new("rtrim", 0, Run::Nullary(rtrim)),
    Native::new("split", 1, Run::Unary(split)),
    Native::new("join", 1, Run::Unary(join)),
    Native::new("startswith", 1, Run::Unary(startswith)),
    Native::new("endswith", 1, Run::Unary(endswith)),
    Native::new("ltrimstr", 1, Run::Unary(ltrimstr)),
    Native::new("rtrimstr", 1, Run::Unary(rtrimstr)),
    Native::new("test", 1, Run::Unary(test)),
    Native::new("test", 2, Run::Binary(test_with_flags)),
    Native::new("format", 1, Run::Unary(format_with)),
];

fn string<'v>(input: &'v Value, what: &str) -> Result<&'v str, EvalError> {
    input
        .as_str()
        .ok_or_else(|| EvalError::Type(format!("{} input must be a string", what)))
}

fn utf8bytelength(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::String(s) => Ok(Value::from(s.len())),
        other => Err(EvalError::Type(format!(
            "{} only strings have UTF-8 byte length",
            describe(other)
        ))),
    }
}

fn explode(input: &Value) -> Result<Value, EvalError> {
    let s = string(input, "explode")?;
    Ok(Value::Array(
        s.chars().map(|c| Value::Number(c as u32 as f64)).collect(),
    ))
}

fn implode(input: &Value) -> Result<Value, EvalError> {
    let Value::Array(codes) = input else {
        return Err(EvalError::Type("implode input must be an array".to_string()));
    };
    codes
        .iter()
        .map(|code| {
            code.as_f64()
                .filter(|n| {
                    n.fract() == 0.0 && (0.0..=f64::from(u32::from(char::MAX))).contains(n)
                })
                .and_then(|n| char::from_u32(n as u32))
                .ok_or_else(|| {
                    EvalError::Type(format!("{} is not a valid codepoint", describe(code)))
                })
        })
        .collect::<Result<String, _>>()
        .map(Value::String)
}

fn ascii_downcase(input: &Value) -> Result<Value, EvalError> {
    string(input, "ascii_downcase").map(|s| Value::String(s.to_ascii_lowercase()))
}

fn ascii_upcase(input: &Value) -> Result<Value, EvalError> {
    string(input, "ascii_upcase").map(|s| Value::String(s.to_ascii_uppercase()))
}

fn trim(input: &Value) -> Result<Value, EvalError> {
    string(input, "trim").map(|s| Value::from(s.trim()))
}

fn ltrim(input: &Value) -> Result<Value, EvalError> {
    string(input, "trim").map(|s| Value::from(s.trim_start()))
}

fn rtrim(input: &Value) -> Result<Value, EvalError> {
    string(input, "trim").map(|s| Value::from(s.trim_end()))
}

fn split(input: &Value, separator: Value) -> Result<Value, EvalError> {
    match (input, &separator) {
        (Value::String(s), Value::String(sep)) => Ok(operators::split(s, sep)),
        _ => Err(EvalError::Type(
            "split input and separator must be strings".to_string(),
        )),
    }
}

/// Strings as they are, other scalars as text, null as nothing.
fn join(input: &Value, separator: Value) -> Result<Value, EvalError> {
    let Value::Array(items) = input else {
        return Err(EvalError::Type(format!(
            "Cannot iterate over {}",
            describe(input)
        )));
    };
    let Value::String(sep) = &separator else {
        return Err(EvalError::Type(format!(
            "{} is not a valid separator",
            describe(&separator)
        )));
    };

    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        match item {
            Value::Null => {}
            Value::String(s) => out.push_str(s),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            other => {
                return Err(EvalError::Type(format!(
                    "Cannot join with {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(Value::String(out))
}

fn affix_error(name: &str) -> EvalError {
    EvalError::Type(format!("{}() requires string inputs", name))
}

fn startswith(input: &Value, prefix: Value) -> Result<Value, EvalError> {
    match (input, &prefix) {
        (Value::String(s), Value::String(p)) => Ok(Value::Boolean(s.starts_with(p.as_str()))),
        _ => Err(affix_error("startswith")),
    }
}

fn endswith(input: &Value, suffix: Value) -> Result<Value, EvalError> {
    match (input, &suffix) {
        (Value::String(s), Value::String(p)) => Ok(Value::Boolean(s.ends_with(p.as_str()))),
        _ => Err(affix_error("endswith")),
    }
}

/// Anything that is not a string with the prefix passes through unchanged.
fn ltrimstr(input: &Value, prefix: Value) -> Result<Value, EvalError> {
    match (input, &prefix) {
        (Value::String(s), Value::String(p)) => Ok(s
            .strip_prefix(p.as_str())
            .map_or_else(|| input.clone(), Value::from)),
        _ => Ok(input.clone()),
    }
}

fn rtrimstr(input: &Value, suffix: Value) -> Result<Value, EvalError> {
    match (input, &suffix) {
        (Value::String(s), Value::String(p)) => Ok(s
            .strip_suffix(p.as_str())
            .map_or_else(|| input.clone(), Value::from)),
        _ => Ok(input.clone()),
    }
}

// ========================================
// Regular expressions
// ========================================

/// Compile `pattern` with jq-style modifier letters.
fn compile(pattern: &str, flags: &str) -> Result<Regex, EvalError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'x' => builder.ignore_whitespace(true),
            's' | 'p' => builder.dot_matches_new_line(true),
            // global, longest and no-empty only change which matches are
            // reported, never whether there is one
            'g' | 'l' | 'n' => &mut builder,
            _ => {
                return Err(EvalError::Type(format!(
                    "{} is not a valid modifier string",
                    flags
                )));
            }
        };
    }
    builder
        .build()
        .map_err(|e| EvalError::Type(format!("{} is not a valid regex: {}", pattern, e)))
}

fn test(input: &Value, pattern: Value) -> Result<Value, EvalError> {
    test_with_flags(input, pattern, Value::Null)
}

fn test_with_flags(input: &Value, pattern: Value, flags: Value) -> Result<Value, EvalError> {
    let Value::String(text) = input else {
        return Err(EvalError::Type(format!(
            "{} cannot be matched, as it is not a string",
            describe(input)
        )));
    };
    let Value::String(pattern) = &pattern else {
        return Err(EvalError::Type(format!(
            "{} is not a string",
            describe(&pattern)
        )));
    };
    let flags = match &flags {
        Value::Null => "",
        Value::String(f) => f.as_str(),
        other => {
            return Err(EvalError::Type(format!(
                "{} is not a string",
                describe(other)
            )));
        }
    };
    Ok(Value::Boolean(compile(pattern, flags)?.is_match(text)))
}

fn format_with(input: &Value, name: Value) -> Result<Value, EvalError> {
    match &name {
        Value::String(name) => format::apply(name, input).map(Value::String),
        other => Err(EvalError::Type(format!(
            "{} is not a valid format",
            describe(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_flags() {
        let text = Value::from("Hello\nWorld");
        assert_eq!(test(&text, Value::from("hello")).unwrap(), Value::Boolean(false));
        assert_eq!(
            test_with_flags(&text, Value::from("hello"), Value::from("i")).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            test_with_flags(&text, Value::from("o.W"), Value::from("s")).unwrap(),
            Value::Boolean(true)
        );
        assert!(test_with_flags(&text, Value::from("a"), Value::from("q")).is_err());
    }

    #[test]
    fn test_join_mixed_scalars() {
        let items = Value::from_json_str(r#"["a", 1, null, true]"#).unwrap();
        assert_eq!(join(&items, Value::from("-")).unwrap(), Value::from("a-1--true"));
        let nested = Value::from_json_str("[[1]]").unwrap();
        assert!(join(&nested, Value::from(",")).is_err());
    }

    #[test]
    fn test_explode_implode() {
        let s = Value::from("héllo");
        assert_eq!(implode(&explode(&s).unwrap()).unwrap(), s);
    }

    #[test]
    fn test_trimstr_passthrough() {
        assert_eq!(ltrimstr(&Value::from("foobar"), Value::from("foo")).unwrap(), Value::from("bar"));
        assert_eq!(ltrimstr(&Value::from("bar"), Value::from("foo")).unwrap(), Value::from("bar"));
        assert_eq!(rtrimstr(&Value::from(1i64), Value::from("1")).unwrap(), Value::from(1i64));
    }
}
