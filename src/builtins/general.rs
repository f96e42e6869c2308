//! Core natives: types, numbers, errors and generator control.

use std::iter;

use tracing::debug;

use crate::{
    evaluator::{
        EvalError, PathIter, Stream, ValueIter, defer, describe, flat_map_ok, iterate, nothing,
        once,
    },
    format::tostring,
    output::to_json,
    path::Path,
    value::Value,
};

use super::{Args, Native, Run};

pub(super) const NATIVES: &[Native] = &[
    Native::new("empty", 0, Run::Generator(empty)).with_paths(empty_paths),
    Native::new("error", 0, Run::Nullary(error)).with_paths(error_paths),
    Native::new("error", 1, Run::Unary(error_with)).with_paths(error_with_paths),
    Native::new("not", 0, Run::Nullary(not)),
    Native::new("type", 0, Run::Nullary(type_of)),
    Native::new("length", 0, Run::Nullary(length)),
    Native::new("tostring", 0, Run::Nullary(to_string)),
    Native::new("tonumber", 0, Run::Nullary(to_number)),
    Native::new("tojson", 0, Run::Nullary(to_json_text)),
    Native::new("fromjson", 0, Run::Nullary(from_json_text)),
    Native::new("floor", 0, Run::Nullary(floor)),
    Native::new("ceil", 0, Run::Nullary(ceil)),
    Native::new("round", 0, Run::Nullary(round)),
    Native::new("sqrt", 0, Run::Nullary(sqrt)),
    Native::new("fabs", 0, Run::Nullary(fabs)),
    Native::new("nan", 0, Run::Nullary(nan)),
    Native::new("infinite", 0, Run::Nullary(infinite)),
    Native::new("isnan", 0, Run::Nullary(isnan)),
    Native::new("isinfinite", 0, Run::Nullary(isinfinite)),
    Native::new("range", 1, Run::Generator(range_upto)),
    Native::new("range", 2, Run::Generator(range_from)),
    Native::new("range", 3, Run::Generator(range_by)),
    Native::new("any", 0, Run::Nullary(any)),
    Native::new("any", 1, Run::Generator(any_of)),
    Native::new("any", 2, Run::Generator(any_in)),
    Native::new("all", 0, Run::Nullary(all)),
    Native::new("all", 1, Run::Generator(all_of)),
    Native::new("all", 2, Run::Generator(all_in)),
    Native::new("first", 1, Run::Generator(first)).with_paths(first_paths),
    Native::new("last", 1, Run::Generator(last)).with_paths(last_paths),
    Native::new("limit", 2, Run::Generator(limit)).with_paths(limit_paths),
    Native::new("isempty", 1, Run::Generator(isempty)),
    Native::new("debug", 0, Run::Nullary(debug_value)),
];

// ========================================
// Errors and emptiness
// ========================================

fn empty<'a>(_: Args<'a>, _: Value) -> ValueIter<'a> {
    nothing()
}

fn empty_paths<'a>(_: Args<'a>, _: Value) -> PathIter<'a> {
    nothing()
}

fn error(input: &Value) -> Result<Value, EvalError> {
    Err(EvalError::User(input.clone()))
}

fn error_with(_: &Value, message: Value) -> Result<Value, EvalError> {
    Err(EvalError::User(message))
}

fn error_paths<'a>(_: Args<'a>, input: Value) -> PathIter<'a> {
    once(Err(EvalError::User(input)))
}

fn error_with_paths<'a>(args: Args<'a>, input: Value) -> PathIter<'a> {
    Box::new(
        args.values(0, input)
            .map(|message| Err::<(Path, Value), _>(message.map_or_else(|e| e, EvalError::User))),
    )
}

fn debug_value(input: &Value) -> Result<Value, EvalError> {
    debug!(value = %to_json(input), "debug");
    Ok(input.clone())
}

// ========================================
// Types and conversions
// ========================================

fn not(input: &Value) -> Result<Value, EvalError> {
    Ok(Value::Boolean(!input.is_truthy()))
}

fn type_of(input: &Value) -> Result<Value, EvalError> {
    Ok(Value::from(input.type_name()))
}

/// Null is 0, numbers give their absolute value, strings count characters.
fn length(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::Null => Ok(Value::Number(0.0)),
        Value::Number(n) => Ok(Value::Number(n.abs())),
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Array(items) => Ok(Value::from(items.len())),
        Value::Object(map) => Ok(Value::from(map.len())),
        Value::Boolean(_) => Err(EvalError::Type(format!(
            "{} has no length",
            describe(input)
        ))),
    }
}

fn to_string(input: &Value) -> Result<Value, EvalError> {
    Ok(Value::String(tostring(input)))
}

fn to_number(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::Number(_) => Ok(input.clone()),
        Value::String(s) => serde_json::from_str::<serde_json::Number>(s.trim())
            .ok()
            .and_then(|n| n.as_f64())
            .map(Value::Number)
            .ok_or_else(|| EvalError::Type(format!("Cannot parse '{}' as a number", s))),
        other => Err(EvalError::Type(format!(
            "{} cannot be parsed as a number",
            describe(other)
        ))),
    }
}

fn to_json_text(input: &Value) -> Result<Value, EvalError> {
    Ok(Value::String(to_json(input)))
}

fn from_json_text(input: &Value) -> Result<Value, EvalError> {
    match input {
        Value::String(s) => Value::from_json_str(s)
            .map_err(|e| EvalError::Type(format!("{} (while parsing '{}')", e, s))),
        other => Err(EvalError::Type(format!(
            "{} cannot be parsed as JSON, only a string can",
            describe(other)
        ))),
    }
}

// ========================================
// Numbers
// ========================================

fn number(input: &Value, name: &str) -> Result<f64, EvalError> {
    input
        .as_f64()
        .ok_or_else(|| EvalError::Type(format!("{} number required for {}", describe(input), name)))
}

fn floor(input: &Value) -> Result<Value, EvalError> {
    number(input, "floor").map(|n| Value::Number(n.floor()))
}

fn ceil(input: &Value) -> Result<Value, EvalError> {
    number(input, "ceil").map(|n| Value::Number(n.ceil()))
}

fn round(input: &Value) -> Result<Value, EvalError> {
    number(input, "round").map(|n| Value::Number(n.round()))
}

fn sqrt(input: &Value) -> Result<Value, EvalError> {
    number(input, "sqrt").map(|n| Value::Number(n.sqrt()))
}

fn fabs(input: &Value) -> Result<Value, EvalError> {
    number(input, "fabs").map(|n| Value::Number(n.abs()))
}

fn nan(_: &Value) -> Result<Value, EvalError> {
    Ok(Value::Number(f64::NAN))
}

fn infinite(_: &Value) -> Result<Value, EvalError> {
    Ok(Value::Number(f64::INFINITY))
}

fn isnan(input: &Value) -> Result<Value, EvalError> {
    number(input, "isnan").map(|n| Value::Boolean(n.is_nan()))
}

fn isinfinite(input: &Value) -> Result<Value, EvalError> {
    number(input, "isinfinite").map(|n| Value::Boolean(n.is_infinite()))
}

// ========================================
// Ranges
// ========================================

fn range_bound(value: &Value) -> Result<f64, EvalError> {
    value
        .as_f64()
        .ok_or_else(|| EvalError::Type("Range bounds must be numeric".to_string()))
}

/// `from, from+by, ...` while strictly before `upto`. A zero step is empty.
fn count<'a>(from: f64, upto: f64, by: f64) -> ValueIter<'a> {
    if by == 0.0 || by.is_nan() {
        return nothing();
    }
    Box::new(
        iter::successors(Some(from), move |x| Some(x + by))
            .take_while(move |x| if by > 0.0 { *x < upto } else { *x > upto })
            .map(|x| Ok(Value::Number(x))),
    )
}

fn range_upto<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    flat_map_ok(args.values(0, input), |upto| match range_bound(&upto) {
        Ok(upto) => count(0.0, upto, 1.0),
        Err(e) => once(Err(e)),
    })
}

fn range_from<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    let froms = args.values(0, input.clone());
    flat_map_ok(froms, move |from| {
        flat_map_ok(args.values(1, input.clone()), move |upto| {
            match (range_bound(&from), range_bound(&upto)) {
                (Ok(from), Ok(upto)) => count(from, upto, 1.0),
                (Err(e), _) | (_, Err(e)) => once(Err(e)),
            }
        })
    })
}

fn range_by<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    let froms = args.values(0, input.clone());
    flat_map_ok(froms, move |from| {
        let args = args.clone();
        let input = input.clone();
        let uptos = args.values(1, input.clone());
        flat_map_ok(uptos, move |upto| {
            let from = from.clone();
            flat_map_ok(args.values(2, input.clone()), move |by| {
                match (range_bound(&from), range_bound(&upto), range_bound(&by)) {
                    (Ok(from), Ok(upto), Ok(by)) => count(from, upto, by),
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => once(Err(e)),
                }
            })
        })
    })
}

// ========================================
// Quantifiers
// ========================================

/// Whether some item makes `cond` produce a value whose truthiness is
/// `wanted`. Stops pulling at the first one.
fn witness<'a>(
    items: ValueIter<'a>,
    cond: impl Fn(Value) -> ValueIter<'a>,
    wanted: bool,
) -> Result<bool, EvalError> {
    for item in items {
        for verdict in cond(item?) {
            if verdict?.is_truthy() == wanted {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn any(input: &Value) -> Result<Value, EvalError> {
    witness(iterate(input.clone()), |v| once(Ok(v)), true).map(Value::Boolean)
}

fn all(input: &Value) -> Result<Value, EvalError> {
    witness(iterate(input.clone()), |v| once(Ok(v)), false).map(|found| Value::Boolean(!found))
}

fn any_of<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        let found = witness(iterate(input), |v| args.values(0, v), true);
        once(found.map(Value::Boolean))
    })
}

fn all_of<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        let found = witness(iterate(input), |v| args.values(0, v), false);
        once(found.map(|found| Value::Boolean(!found)))
    })
}

fn any_in<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        let found = witness(args.values(0, input), |v| args.values(1, v), true);
        once(found.map(Value::Boolean))
    })
}

fn all_in<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || {
        let found = witness(args.values(0, input), |v| args.values(1, v), false);
        once(found.map(|found| Value::Boolean(!found)))
    })
}

// ========================================
// Generator control
// ========================================

fn first<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    Box::new(args.values(0, input).take(1))
}

fn first_paths<'a>(args: Args<'a>, input: Value) -> PathIter<'a> {
    Box::new(args.paths(0, input).take(1))
}

/// The final item of a stream, or its first error.
fn last_of<'a, T: 'a>(items: Stream<'a, T>) -> Stream<'a, T> {
    defer(move || {
        let mut last = None;
        for item in items {
            match item {
                Ok(item) => last = Some(item),
                Err(e) => return once(Err(e)),
            }
        }
        match last {
            Some(item) => once(Ok(item)),
            None => nothing(),
        }
    })
}

fn last<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    last_of(args.values(0, input))
}

fn last_paths<'a>(args: Args<'a>, input: Value) -> PathIter<'a> {
    last_of(args.paths(0, input))
}

fn limit_count(n: &Value) -> Result<usize, EvalError> {
    match n {
        Value::Number(n) if *n > 0.0 => Ok(*n as usize),
        Value::Number(_) => Ok(0),
        other => Err(EvalError::Type(format!(
            "Invalid limit {}: must be a number",
            describe(other)
        ))),
    }
}

fn limit<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    let counts = args.values(0, input.clone());
    flat_map_ok(counts, move |n| match limit_count(&n) {
        Ok(n) => Box::new(args.values(1, input.clone()).take(n)),
        Err(e) => once(Err(e)),
    })
}

fn limit_paths<'a>(args: Args<'a>, input: Value) -> PathIter<'a> {
    let counts = args.values(0, input.clone());
    flat_map_ok(counts, move |n| match limit_count(&n) {
        Ok(n) => Box::new(args.paths(1, input.clone()).take(n)),
        Err(e) => once(Err(e)),
    })
}

fn isempty<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    defer(move || match args.values(0, input).next() {
        None => once(Ok(Value::Boolean(true))),
        Some(Ok(_)) => once(Ok(Value::Boolean(false))),
        Some(Err(e)) => once(Err(e)),
    })
}
