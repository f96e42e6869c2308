//! Array and object natives.

use crate::{
    evaluator::{EvalError, ValueIter, defer, describe, iterate, once, operators},
    output::to_json,
    value::{Map, Value},
};

use super::{Args, Native, Run};

pub(super) const NATIVES: &[Native] = &[
    Native::new("keys", 0, Run::Nullary(keys)),
    Native::new("keys_unsorted", 0, Run::Nullary(keys_unsorted)),
    Native::new("has", 1, Run::Unary(has)),
    Native::new("contains", 1, Run::Unary(contains)),
    Native::new("add", 0, Run::Nullary(add)),
    Native::new("to_entries", 0, Run::Nullary(to_entries)),
    Native::new("from_entries", 0, Run::Nullary(from_entries)),
    Native::new("sort", 0, Run::Nullary(sort)),
    Native::new("sort_by", 1, Run::Generator(sort_by)),
    Native::new("group_by", 1, Run::Generator(group_by)),
    Native::new("unique", 0, Run::Nullary(unique)),
    Native::new("unique_by", 1, Run::Generator(unique_by)),
    Native::new("min", 0, Run::Nullary(min)),
    Native::new("max", 0, Run::Nullary(max)),
    Native::new("min_by", 1, Run::Generator(min_by)),
    Native::new("max_by", 1, Run::Generator(max_by)),
    Native::new("reverse", 0, Run::Nullary(reverse)),
    Native::new("flatten", 0, Run::Nullary(flatten)),
    Native::new("flatten", 1, Run::Unary(flatten_depth)),
];

fn keys(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Ok(Value::Array(keys.into_iter().map(|k| Value::from(k.as_str())).collect()))
        }
        other => keys_unsorted(other),
    }
}

fn keys_unsorted(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::Object(map) => Ok(Value::Array(map.keys().map(|k| Value::from(k.as_str())).collect())),
        Value::Array(items) => Ok(Value::Array((0..items.len()).map(Value::from).collect())),
        other => Err(EvalError::Type(format!("{} has no keys", describe(other)))),
    }
}

fn has(input: &Value, key: Value) -> Result<Value, EvalError> {
    match (input, &key) {
        (Value::Object(map), Value::String(k)) => Ok(Value::Boolean(map.contains_key(k))),
        (Value::Array(items), Value::Number(n)) => {
            Ok(Value::Boolean(*n >= 0.0 && (*n as usize) < items.len()))
        }
        _ => Err(EvalError::Type(format!(
            "Cannot check whether {} has a {} key",
            input.type_name(),
            key.type_name()
        ))),
    }
}

fn contains(input: &Value, needle: Value) -> Result<Value, EvalError> {
    operators::contains(input, &needle).map(Value::Boolean)
}

/// Sum of all elements (or object values) with `+`; null when empty.
fn add(input: &Value) -> Result<Value, EvalError> {
    if let Value::Null = input {
        return Ok(Value::Null);
    }
    let mut total = Value::Null;
    for item in iterate(input.clone()) {
        total = operators::add(&total, &item?)?;
    }
    Ok(total)
}

// ========================================
// Entries
// ========================================

fn entry(key: Value, value: Value) -> Value {
    let mut map = Map::new();
    map.insert("key".to_string(), key);
    map.insert("value".to_string(), value);
    Value::Object(map)
}

fn to_entries(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::Object(map) => Ok(Value::Array(
            map.iter()
                .map(|(k, v)| entry(Value::from(k.as_str()), v.clone()))
                .collect(),
        )),
        Value::Array(items) => Ok(Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| entry(Value::from(i), v.clone()))
                .collect(),
        )),
        other => Err(EvalError::Type(format!("{} has no keys", describe(other)))),
    }
}

const KEY_NAMES: &[&str] = &["key", "k", "name", "Name", "K", "Key"];
const VALUE_NAMES: &[&str] = &["value", "v", "Value", "V"];

/// Accepts `key`/`k`/`name` (and capitalized) for keys and `value`/`v` for
/// values. Non-string keys are used in their JSON form.
fn from_entries(input: &Value) -> Result<Value, EvalError> {
    let mut out = Map::new();
    for item in iterate(input.clone()) {
        let item = item?;
        let Value::Object(fields) = &item else {
            return Err(EvalError::Type(format!(
                "Cannot index {} with \"key\"",
                item.type_name()
            )));
        };
        let key = KEY_NAMES
            .iter()
            .find_map(|name| fields.get(*name).filter(|k| !matches!(k, Value::Null)))
            .map_or_else(
                || "null".to_string(),
                |k| match k {
                    Value::String(s) => s.clone(),
                    other => to_json(other),
                },
            );
        let value = VALUE_NAMES
            .iter()
            .find_map(|name| fields.get(*name))
            .cloned()
            .unwrap_or_default();
        out.insert(key, value);
    }
    Ok(Value::Object(out))
}

// ========================================
// Ordering
// ========================================

fn array<'v>(input: &'v Value, what: &str) -> Result<&'v [Value], EvalError> {
    match input {
        Value::Array(items) => Ok(items),
        other => Err(EvalError::Type(format!(
            "{} cannot be {}, as it is not an array",
            describe(other),
            what
        ))),
    }
}

fn sort(input: &Value) -> Result<Value, EvalError> {
    let mut items = array(input, "sorted")?.to_vec();
    items.sort();
    Ok(Value::Array(items))
}

fn unique(input: &Value) -> Result<Value, EvalError> {
    let mut items = array(input, "sorted")?.to_vec();
    items.sort();
    items.dedup();
    Ok(Value::Array(items))
}

fn min(input: &Value) -> Result<Value, EvalError> {
    let items = array(input, "searched")?;
    Ok(items.iter().min().cloned().unwrap_or_default())
}

fn max(input: &Value) -> Result<Value, EvalError> {
    let items = array(input, "searched")?;
    Ok(items.iter().max().cloned().unwrap_or_default())
}

/// Each element paired with `[f]` evaluated on it, in input order.
fn keyed(args: &Args<'_>, input: &Value, what: &str) -> Result<Vec<(Value, Value)>, EvalError> {
    array(input, what)?
        .iter()
        .map(|item| {
            let key = args.values(0, item.clone()).collect::<Result<Vec<_>, _>>()?;
            Ok((Value::Array(key), item.clone()))
        })
        .collect()
}

/// Elements grouped by key, groups in key order, elements in input order.
fn groups(args: &Args<'_>, input: &Value) -> Result<Vec<Vec<Value>>, EvalError> {
    let mut pairs = keyed(args, input, "grouped")?;
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    for (key, item) in pairs {
        match groups.last_mut() {
            Some((last, members)) if *last == key => members.push(item),
            Some(_) | None => groups.push((key, vec![item])),
        }
    }
    Ok(groups.into_iter().map(|(_, members)| members).collect())
}

fn sort_by<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        once(keyed(&args, &input, "sorted").map(|mut pairs| {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Array(pairs.into_iter().map(|(_, item)| item).collect())
        }))
    })
}

fn group_by<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        once(groups(&args, &input).map(|groups| {
            Value::Array(groups.into_iter().map(Value::Array).collect())
        }))
    })
}

fn unique_by<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        once(groups(&args, &input).map(|groups| {
            Value::Array(
                groups
                    .into_iter()
                    .filter_map(|members| members.into_iter().next())
                    .collect(),
            )
        }))
    })
}

fn min_by<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        once(keyed(&args, &input, "searched").map(|pairs| {
            pairs
                .into_iter()
                .min_by(|a, b| a.0.cmp(&b.0))
                .map(|(_, item)| item)
                .unwrap_or_default()
        }))
    })
}

fn max_by<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        once(keyed(&args, &input, "searched").map(|pairs| {
            pairs
                .into_iter()
                .max_by(|a, b| a.0.cmp(&b.0))
                .map(|(_, item)| item)
                .unwrap_or_default()
        }))
    })
}

// ========================================
// Reshaping
// ========================================

fn reverse(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
        other => Err(EvalError::Type(format!("Cannot reverse {}", describe(other)))),
    }
}

fn flatten_into(items: &[Value], depth: f64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0.0 => flatten_into(inner, depth - 1.0, out),
            other => out.push(other.clone()),
        }
    }
}

fn flatten(input: &Value) -> Result<Value, EvalError> {
    flatten_depth(input, Value::Number(f64::INFINITY))
}

fn flatten_depth(input: &Value, depth: Value) -> Result<Value, EvalError> {
    let depth = match depth {
        Value::Number(n) if n >= 0.0 => n,
        Value::Number(_) => {
            return Err(EvalError::Type("flatten depth must not be negative".to_string()));
        }
        other => {
            return Err(EvalError::Type(format!(
                "{} is not a valid flatten depth",
                describe(&other)
            )));
        }
    };
    let items = array(input, "flattened")?;
    let mut out = Vec::new();
    flatten_into(items, depth, &mut out);
    Ok(Value::Array(out))
}
