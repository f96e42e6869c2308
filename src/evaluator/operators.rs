//! Arithmetic, comparison and containment on values.

use crate::{
    ast::BinOp,
    value::{Map, Value},
};

use super::{EvalError, describe};

/// Apply a non-short-circuiting binary operator to two values.
pub fn binary(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Equal => Ok(Value::Boolean(lhs == rhs)),
        BinOp::NotEqual => Ok(Value::Boolean(lhs != rhs)),
        BinOp::LessThan => Ok(Value::Boolean(lhs < rhs)),
        BinOp::GreaterThan => Ok(Value::Boolean(lhs > rhs)),
        BinOp::LessEqual => Ok(Value::Boolean(lhs <= rhs)),
        BinOp::GreaterEqual => Ok(Value::Boolean(lhs >= rhs)),
        BinOp::Add => add(lhs, rhs),
        BinOp::Subtract => subtract(lhs, rhs),
        BinOp::Multiply => multiply(lhs, rhs),
        BinOp::Divide => divide(lhs, rhs),
        BinOp::Modulo => modulo(lhs, rhs),
        BinOp::And => Ok(Value::Boolean(lhs.is_truthy() && rhs.is_truthy())),
        BinOp::Or => Ok(Value::Boolean(lhs.is_truthy() || rhs.is_truthy())),
        BinOp::Alternative => Ok(if lhs.is_truthy() {
            lhs.clone()
        } else {
            rhs.clone()
        }),
    }
}

fn mismatch(lhs: &Value, rhs: &Value, what: &str) -> EvalError {
    EvalError::Type(format!("{} and {} cannot be {}", describe(lhs), describe(rhs), what))
}

/// `+`: null is the identity; objects merge shallowly with the right side winning.
pub fn add(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Null, other) | (other, Value::Null) => Ok(other.clone()),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (Value::Array(a), Value::Array(b)) => {
            let mut joined = a.clone();
            joined.extend(b.iter().cloned());
            Ok(Value::Array(joined))
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (key, value) in b {
                merged.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(merged))
        }
        _ => Err(mismatch(lhs, rhs, "added")),
    }
}

fn subtract(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (Value::Array(a), Value::Array(b)) => Ok(Value::Array(
            a.iter().filter(|item| !b.contains(item)).cloned().collect(),
        )),
        _ => Err(mismatch(lhs, rhs, "subtracted")),
    }
}

fn multiply(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            repeat(s, *n)
        }
        (Value::Object(a), Value::Object(b)) => Ok(Value::Object(deep_merge(a, b))),
        _ => Err(mismatch(lhs, rhs, "multiplied")),
    }
}

/// Longest string `*` may build, in bytes.
const MAX_REPEAT_LEN: usize = i32::MAX as usize;

fn repeat(s: &str, count: f64) -> Result<Value, EvalError> {
    let times = count as i64;
    if times <= 0 {
        return Ok(Value::Null);
    }
    match s.len().checked_mul(times as usize) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::String(s.repeat(times as usize))),
        _ => Err(EvalError::Type("Repeat string result too long".to_string())),
    }
}

/// Recursive merge: nested objects merge, anything else from `b` replaces.
pub fn deep_merge(a: &Map, b: &Map) -> Map {
    let mut merged = a.clone();
    for (key, value) in b {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(left)), Value::Object(right)) => {
                Value::Object(deep_merge(left, right))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

fn divide(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(b)) if *b == 0.0 => Err(EvalError::Type(format!(
            "{} and {} cannot be divided because the divisor is zero",
            describe(lhs),
            describe(rhs)
        ))),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (Value::String(s), Value::String(sep)) => Ok(split(s, sep)),
        _ => Err(mismatch(lhs, rhs, "divided")),
    }
}

/// `%` works on the truncated integer parts of both sides.
fn modulo(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (*a as i64, *b as i64);
            if b == 0 {
                return Err(EvalError::Type(format!(
                    "{} and {} cannot be divided because the divisor is zero",
                    describe(lhs),
                    describe(rhs)
                )));
            }
            Ok(Value::Number(a.checked_rem(b).unwrap_or(0) as f64))
        }
        _ => Err(mismatch(lhs, rhs, "divided")),
    }
}

/// Split a string on a literal separator. An empty input gives `[]` and an
/// empty separator splits into characters.
pub fn split(s: &str, sep: &str) -> Value {
    if s.is_empty() {
        return Value::Array(Vec::new());
    }
    if sep.is_empty() {
        return Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect());
    }
    Value::Array(s.split(sep).map(Value::from).collect())
}

/// `contains`: substring for strings, every element of `b` contained in some
/// element of `a` for arrays, per-key for objects, equality otherwise.
///
/// Values of different types at the top level are an error; deeper down they
/// are simply not contained.
pub fn contains(a: &Value, b: &Value) -> Result<bool, EvalError> {
    if a.type_name() != b.type_name() {
        return Err(EvalError::Type(format!(
            "{} and {} cannot have their containment checked",
            describe(a),
            describe(b)
        )));
    }
    Ok(contained(a, b))
}

fn contained(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.contains(b.as_str()),
        (Value::Array(a), Value::Array(b)) => {
            b.iter().all(|needle| a.iter().any(|item| contained(item, needle)))
        }
        (Value::Object(a), Value::Object(b)) => b
            .iter()
            .all(|(key, needle)| a.get(key).is_some_and(|item| contained(item, needle))),
        _ => a.type_name() == b.type_name() && a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    #[test]
    fn test_null_is_additive_identity() {
        assert_eq!(add(&Value::Null, &json("[1]")).unwrap(), json("[1]"));
        assert_eq!(add(&json("\"a\""), &Value::Null).unwrap(), json("\"a\""));
    }

    #[test]
    fn test_add_mismatch_message() {
        let err = add(&json("1"), &json("\"a\"")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "number (1) and string (\"a\") cannot be added"
        );
    }

    #[test]
    fn test_modulo_truncates() {
        assert_eq!(modulo(&json("7.9"), &json("2.5")).unwrap(), json("1"));
        assert_eq!(modulo(&json("-5"), &json("3")).unwrap(), json("-2"));
        assert!(modulo(&json("1"), &json("0.5")).is_err());
    }

    #[test]
    fn test_string_repeat() {
        assert_eq!(multiply(&json("\"ab\""), &json("3")).unwrap(), json("\"ababab\""));
        assert_eq!(multiply(&json("0"), &json("\"ab\"")).unwrap(), Value::Null);
    }

    #[test]
    fn test_deep_merge() {
        let merged = multiply(&json(r#"{"a":{"b":1,"c":2}}"#), &json(r#"{"a":{"b":3}}"#));
        assert_eq!(merged.unwrap(), json(r#"{"a":{"b":3,"c":2}}"#));
    }

    #[test]
    fn test_array_subtract_removes_all_occurrences() {
        assert_eq!(
            subtract(&json("[1,2,1,3]"), &json("[1]")).unwrap(),
            json("[2,3]")
        );
    }

    #[test]
    fn test_contains_rules() {
        assert!(contains(&json("\"foobar\""), &json("\"bar\"")).unwrap());
        assert!(contains(&json(r#"[{"a":[1,2]}]"#), &json(r#"[{"a":[2]}]"#)).unwrap());
        assert!(!contains(&json(r#"{"a":1}"#), &json(r#"{"a":"1"}"#)).unwrap());
        assert!(contains(&json("1"), &json("\"1\"")).is_err());
    }

    #[test]
    fn test_string_divide_splits() {
        assert_eq!(divide(&json("\"a,b\""), &json("\",\"")).unwrap(), json(r#"["a","b"]"#));
        assert_eq!(divide(&json("\"\""), &json("\",\"")).unwrap(), json("[]"));
    }
}
