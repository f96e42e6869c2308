//! The evaluation algebra.
//!
//! Every [`Expr`] has two readings. [`Expr::values`] yields the outputs of a
//! filter, and [`Expr::paths`] yields where those outputs live inside the
//! input, each paired with the value found there. Both are lazy boxed
//! iterators: nothing runs until the consumer pulls.

use std::iter;

use crate::{
    ast::{BinOp, Expr, FuncDef, Param, StringPart},
    builtins::{self, Native},
    env::{Env, Resolved},
    format,
    output::to_json,
    path::{self, Path, PathSegment},
    value::{Map, Value},
};

pub mod operators;
mod update;

/// Errors that can occur during evaluation.
///
/// All of them end the sequence they occur in and can be intercepted with
/// `?` or `try ... catch`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Operation applied to values of the wrong type
    #[error("{0}")]
    Type(String),

    /// No function with this name and arity is in scope
    #[error("{name}/{arity} is not defined")]
    UndefinedFunction { name: String, arity: usize },

    /// Reference to an unbound `$name`
    #[error("${0} is not defined")]
    UndefinedVariable(String),

    /// A builtin was used where paths are required but cannot produce them
    #[error("no paths for {0}")]
    NoPaths(String),

    /// A non-addressable filter was used where paths are required
    #[error("{0}")]
    InvalidPath(String),

    /// `@name` with an unknown format
    #[error("{0} is not a valid format")]
    UnknownFormat(String),

    /// Raised by `error` and `error(msg)`
    #[error("{}", user_message(.0))]
    User(Value),
}

fn user_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => format!("{} (not a string)", to_json(other)),
    }
}

impl EvalError {
    /// The value a `catch` handler receives.
    pub fn value(&self) -> Value {
        match self {
            EvalError::User(v) => v.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

/// Short rendering of a value for error messages.
pub(crate) fn preview(value: &Value) -> String {
    let text = to_json(value);
    if text.chars().count() > 11 {
        let head: String = text.chars().take(10).collect();
        format!("{}...", head)
    } else {
        text
    }
}

/// `type (value)` as used in error messages; plain `null` for null.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => format!("{} ({})", other.type_name(), preview(other)),
    }
}

// ========================================
// Streams
// ========================================

pub type Stream<'a, T> = Box<dyn Iterator<Item = Result<T, EvalError>> + 'a>;
pub type ValueIter<'a> = Stream<'a, Value>;
pub type PathIter<'a> = Stream<'a, (Path, Value)>;

/// One of [`Expr::values`] or [`Expr::paths`], for code shared by both.
type Eval<'a, T> = fn(&'a Expr, Value, &Env<'a>) -> Stream<'a, T>;

pub(crate) fn once<'a, T: 'a>(item: Result<T, EvalError>) -> Stream<'a, T> {
    Box::new(iter::once(item))
}

pub(crate) fn nothing<'a, T: 'a>() -> Stream<'a, T> {
    Box::new(iter::empty())
}

/// Postpone building a stream until its first item is pulled.
pub(crate) fn defer<'a, T: 'a>(make: impl FnOnce() -> Stream<'a, T> + 'a) -> Stream<'a, T> {
    Box::new(iter::once_with(make).flatten())
}

/// Flat-map over the successful items; errors pass through unchanged.
pub(crate) fn flat_map_ok<'a, T: 'a, U: 'a>(
    items: Stream<'a, T>,
    mut f: impl FnMut(T) -> Stream<'a, U> + 'a,
) -> Stream<'a, U> {
    Box::new(items.flat_map(move |item| match item {
        Ok(x) => f(x),
        Err(e) => once(Err(e)),
    }))
}

/// The last value of a stream, stopping at the first error.
pub(crate) fn last_value(items: ValueIter<'_>) -> Result<Option<Value>, EvalError> {
    let mut last = None;
    for item in items {
        last = Some(item?);
    }
    Ok(last)
}

fn invalid_paths<'a>(values: ValueIter<'a>) -> PathIter<'a> {
    Box::new(values.map(|item| {
        item.and_then(|v| {
            Err::<(Path, Value), _>(EvalError::InvalidPath(format!(
                "Invalid path expression with result {}",
                preview(&v)
            )))
        })
    }))
}

// ========================================
// Values
// ========================================

impl Expr {
    /// Evaluate this filter against `input`.
    pub fn values<'a>(&'a self, input: Value, env: &Env<'a>) -> ValueIter<'a> {
        match self {
            Expr::Identity => once(Ok(input)),
            Expr::RecursiveDescent => Box::new(descend(input).map(Ok)),
            Expr::Literal(v) => once(Ok(v.clone())),
            Expr::Variable(name) => once(
                env.var(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            ),
            Expr::Str { parts, format } => Box::new(
                interpolate(parts, format.as_deref(), input, env.clone())
                    .map(|item| item.map(Value::String)),
            ),
            Expr::Format(name) => once(format::apply(name, &input).map(Value::String)),

            Expr::Index { target, key } => {
                let env = env.clone();
                let original = input.clone();
                let targets = target.values(input, &env);
                flat_map_ok(targets, move |t| {
                    Box::new(
                        key.values(original.clone(), &env)
                            .map(move |k| k.and_then(|k| path::index(&t, &k))),
                    )
                })
            }
            Expr::Slice { target, from, to } => {
                let env = env.clone();
                let original = input.clone();
                let targets = target.values(input, &env);
                flat_map_ok(targets, move |t| {
                    let env = env.clone();
                    let original = original.clone();
                    let starts = bound_values(from.as_deref(), original.clone(), &env);
                    flat_map_ok(starts, move |start| {
                        let t = t.clone();
                        Box::new(
                            bound_values(to.as_deref(), original.clone(), &env)
                                .map(move |end| end.and_then(|end| path::slice(&t, start, end))),
                        )
                    })
                })
            }
            Expr::Iterate(target) => flat_map_ok(target.values(input, env), iterate),

            Expr::Pipe(lhs, rhs) => {
                let env = env.clone();
                let left = lhs.values(input, &env);
                flat_map_ok(left, move |v| rhs.values(v, &env))
            }
            Expr::Comma(branches) => {
                let env = env.clone();
                Box::new(
                    branches
                        .iter()
                        .flat_map(move |branch| branch.values(input.clone(), &env)),
                )
            }

            Expr::Array(None) => once(Ok(Value::Array(Vec::new()))),
            Expr::Array(Some(inner)) => {
                let env = env.clone();
                defer(move || {
                    once(
                        inner
                            .values(input, &env)
                            .collect::<Result<Vec<_>, _>>()
                            .map(Value::Array),
                    )
                })
            }
            Expr::Object(entries) => build_object(entries, input, env.clone(), Map::new()),

            Expr::Neg(inner) => Box::new(inner.values(input, env).map(|item| {
                item.and_then(|v| match v {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvalError::Type(format!(
                        "{} cannot be negated",
                        describe(&other)
                    ))),
                })
            })),
            Expr::Binary { op, lhs, rhs } => binary(*op, lhs, rhs, input, env),
            Expr::Update { target, value } => {
                let env = env.clone();
                defer(move || once(update::update(target, value, input, &env)))
            }

            Expr::Bind { source, name, body } => {
                let env = env.clone();
                let original = input.clone();
                let sources = source.values(input, &env);
                flat_map_ok(sources, move |v| {
                    body.values(original.clone(), &env.bind_var(name.as_str(), v))
                })
            }
            Expr::Reduce {
                source,
                name,
                init,
                update,
            } => {
                let env = env.clone();
                let original = input.clone();
                let inits = init.values(input, &env);
                flat_map_ok(inits, move |acc| {
                    once(fold(source, name, update, acc, original.clone(), &env))
                })
            }
            Expr::Foreach {
                source,
                name,
                init,
                update,
                extract,
            } => {
                let env = env.clone();
                let original = input.clone();
                let inits = init.values(input, &env);
                flat_map_ok(inits, move |state| {
                    Box::new(Foreach {
                        source: source.values(original.clone(), &env),
                        name,
                        update,
                        extract: extract.as_deref(),
                        env: env.clone(),
                        state,
                        updates: None,
                        extracted: None,
                    })
                })
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                let env = env.clone();
                let original = input.clone();
                let conds = cond.values(input, &env);
                flat_map_ok(conds, move |c| {
                    if c.is_truthy() {
                        then.values(original.clone(), &env)
                    } else {
                        match otherwise {
                            Some(branch) => branch.values(original.clone(), &env),
                            None => once(Ok(original.clone())),
                        }
                    }
                })
            }
            Expr::Try { body, handler } => {
                let env = env.clone();
                let inner = body.values(input, &env);
                let handler = handler.as_deref().map(|h| {
                    Box::new(move |e: EvalError| h.values(e.value(), &env))
                        as Box<dyn FnOnce(EvalError) -> ValueIter<'a> + 'a>
                });
                Box::new(TryIter::new(inner, handler))
            }

            Expr::Call { name, args } => match resolve(name, args.len(), env) {
                Ok(Callee::Closure { body, env: scope }) => body.values(input, &scope),
                Ok(Callee::Def { def, env: scope }) => {
                    call_def(def, args, input, env.clone(), scope, Expr::values)
                }
                Ok(Callee::Value(v)) => once(Ok(v)),
                Ok(Callee::Native(native)) => native.values(args, input, env),
                Err(e) => once(Err(e)),
            },
            Expr::Define { def, rest } => rest.values(input, &env.define(def)),
        }
    }

    /// Locations of this filter's outputs inside `input`, paired with the
    /// values found there.
    pub fn paths<'a>(&'a self, input: Value, env: &Env<'a>) -> PathIter<'a> {
        match self {
            Expr::Identity => once(Ok((Vec::new(), input))),
            Expr::RecursiveDescent => Box::new(descend_paths(input).map(Ok)),

            Expr::Index { target, key } => {
                let env = env.clone();
                let original = input.clone();
                let targets = target.paths(input, &env);
                flat_map_ok(targets, move |(prefix, t)| {
                    Box::new(key.values(original.clone(), &env).map(move |k| {
                        let k = k?;
                        let segment = path::segment_for(&t, &k)?;
                        let value = path::index(&t, &k)?;
                        let mut full = prefix.clone();
                        full.push(segment);
                        Ok((full, value))
                    }))
                })
            }
            Expr::Slice { target, from, to } => {
                let env = env.clone();
                let original = input.clone();
                let targets = target.paths(input, &env);
                flat_map_ok(targets, move |(prefix, t)| {
                    let env = env.clone();
                    let original = original.clone();
                    let starts = bound_values(from.as_deref(), original.clone(), &env);
                    flat_map_ok(starts, move |start| {
                        let t = t.clone();
                        let prefix = prefix.clone();
                        Box::new(bound_values(to.as_deref(), original.clone(), &env).map(
                            move |end| {
                                let end = end?;
                                let value = path::slice(&t, start, end)?;
                                let mut full = prefix.clone();
                                full.push(PathSegment::Slice {
                                    start: start.map(|n| n.floor() as i64),
                                    end: end.map(|n| n.ceil() as i64),
                                });
                                Ok((full, value))
                            },
                        ))
                    })
                })
            }
            Expr::Iterate(target) => {
                flat_map_ok(target.paths(input, env), |(prefix, t)| iterate_paths(prefix, t))
            }

            Expr::Pipe(lhs, rhs) => {
                let env = env.clone();
                let left = lhs.paths(input, &env);
                flat_map_ok(left, move |(prefix, v)| {
                    Box::new(rhs.paths(v, &env).map(move |item| {
                        item.map(|(rest, w)| {
                            let mut full = prefix.clone();
                            full.extend(rest);
                            (full, w)
                        })
                    }))
                })
            }
            Expr::Comma(branches) => {
                let env = env.clone();
                Box::new(
                    branches
                        .iter()
                        .flat_map(move |branch| branch.paths(input.clone(), &env)),
                )
            }

            Expr::Binary {
                op: BinOp::Alternative,
                lhs,
                rhs,
            } => {
                let env = env.clone();
                defer(move || {
                    let mut truthy = lhs
                        .paths(input.clone(), &env)
                        .filter_map(Result::ok)
                        .filter(|(_, v)| v.is_truthy())
                        .peekable();
                    if truthy.peek().is_some() {
                        Box::new(truthy.map(Ok)) as PathIter<'a>
                    } else {
                        rhs.paths(input, &env)
                    }
                })
            }

            Expr::Bind { source, name, body } => {
                let env = env.clone();
                let original = input.clone();
                let sources = source.values(input, &env);
                flat_map_ok(sources, move |v| {
                    body.paths(original.clone(), &env.bind_var(name.as_str(), v))
                })
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                let env = env.clone();
                let original = input.clone();
                let conds = cond.values(input, &env);
                flat_map_ok(conds, move |c| {
                    if c.is_truthy() {
                        then.paths(original.clone(), &env)
                    } else {
                        match otherwise {
                            Some(branch) => branch.paths(original.clone(), &env),
                            None => once(Ok((Vec::new(), original.clone()))),
                        }
                    }
                })
            }
            Expr::Try { body, handler } => {
                let env = env.clone();
                let inner = body.paths(input, &env);
                let handler = handler.as_deref().map(|h| {
                    Box::new(move |e: EvalError| h.paths(e.value(), &env))
                        as Box<dyn FnOnce(EvalError) -> PathIter<'a> + 'a>
                });
                Box::new(TryIter::new(inner, handler))
            }

            Expr::Call { name, args } => match resolve(name, args.len(), env) {
                Ok(Callee::Closure { body, env: scope }) => body.paths(input, &scope),
                Ok(Callee::Def { def, env: scope }) => {
                    call_def(def, args, input, env.clone(), scope, Expr::paths)
                }
                Ok(Callee::Value(v)) => invalid_paths(once(Ok(v))),
                Ok(Callee::Native(native)) => native.paths(args, input, env),
                Err(e) => once(Err(e)),
            },
            Expr::Define { def, rest } => rest.paths(input, &env.define(def)),

            Expr::Literal(_)
            | Expr::Variable(_)
            | Expr::Str { .. }
            | Expr::Format(_)
            | Expr::Array(_)
            | Expr::Object(_)
            | Expr::Neg(_)
            | Expr::Binary { .. }
            | Expr::Update { .. }
            | Expr::Reduce { .. }
            | Expr::Foreach { .. } => invalid_paths(self.values(input, env)),
        }
    }
}

// ========================================
// Structure helpers
// ========================================

/// `..` in pre-order: the value itself, then its descendants depth-first.
fn descend(root: Value) -> impl Iterator<Item = Value> {
    let mut stack = vec![root];
    iter::from_fn(move || {
        let value = stack.pop()?;
        match &value {
            Value::Array(items) => stack.extend(items.iter().rev().cloned()),
            Value::Object(map) => stack.extend(map.values().rev().cloned()),
            _ => {}
        }
        Some(value)
    })
}

fn descend_paths(root: Value) -> impl Iterator<Item = (Path, Value)> {
    let mut stack = vec![(Vec::new(), root)];
    iter::from_fn(move || {
        let (prefix, value) = stack.pop()?;
        match &value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate().rev() {
                    let mut p = prefix.clone();
                    p.push(PathSegment::Index(i as i64));
                    stack.push((p, item.clone()));
                }
            }
            Value::Object(map) => {
                for (key, item) in map.iter().rev() {
                    let mut p = prefix.clone();
                    p.push(PathSegment::Field(key.clone()));
                    stack.push((p, item.clone()));
                }
            }
            _ => {}
        }
        Some((prefix, value))
    })
}

fn cannot_iterate(value: &Value) -> EvalError {
    EvalError::Type(format!("Cannot iterate over {}", describe(value)))
}

pub(crate) fn iterate<'a>(value: Value) -> ValueIter<'a> {
    match value {
        Value::Array(items) => Box::new(items.into_iter().map(Ok)),
        Value::Object(map) => Box::new(map.into_values().map(Ok)),
        other => once(Err(cannot_iterate(&other))),
    }
}

fn iterate_paths<'a>(prefix: Path, value: Value) -> PathIter<'a> {
    match value {
        Value::Array(items) => Box::new(items.into_iter().enumerate().map(move |(i, item)| {
            let mut p = prefix.clone();
            p.push(PathSegment::Index(i as i64));
            Ok((p, item))
        })),
        Value::Object(map) => Box::new(map.into_iter().map(move |(key, item)| {
            let mut p = prefix.clone();
            p.push(PathSegment::Field(key));
            Ok((p, item))
        })),
        other => once(Err(cannot_iterate(&other))),
    }
}

/// Values of an optional slice bound: `None` for a missing bound or null.
fn bound_values<'a>(
    bound: Option<&'a Expr>,
    input: Value,
    env: &Env<'a>,
) -> Stream<'a, Option<f64>> {
    match bound {
        None => once(Ok(None)),
        Some(expr) => Box::new(expr.values(input, env).map(|item| {
            item.and_then(|v| match v {
                Value::Null => Ok(None),
                Value::Number(n) => Ok(Some(n)),
                other => Err(EvalError::Type(format!(
                    "Start and end indices of an array slice must be numbers, got {}",
                    other.type_name()
                ))),
            })
        })),
    }
}

/// Cross product of all field candidates, first field outermost.
fn build_object<'a>(
    entries: &'a [(Expr, Expr)],
    input: Value,
    env: Env<'a>,
    acc: Map,
) -> ValueIter<'a> {
    let Some(((key, value), rest)) = entries.split_first() else {
        return once(Ok(Value::Object(acc)));
    };

    let keys = key.values(input.clone(), &env);
    flat_map_ok(keys, move |k| {
        let k = match k {
            Value::String(s) => s,
            other => {
                return once(Err(EvalError::Type(format!(
                    "Object keys must be strings, got {}",
                    describe(&other)
                ))));
            }
        };
        let input = input.clone();
        let env = env.clone();
        let acc = acc.clone();
        let values = value.values(input.clone(), &env);
        flat_map_ok(values, move |v| {
            let mut next = acc.clone();
            next.insert(k.clone(), v);
            build_object(rest, input.clone(), env.clone(), next)
        })
    })
}

/// String interpolation; the rightmost interpolated part varies slowest.
fn interpolate<'a>(
    parts: &'a [StringPart],
    format: Option<&'a str>,
    input: Value,
    env: Env<'a>,
) -> Stream<'a, String> {
    match parts.split_last() {
        None => once(Ok(String::new())),
        Some((StringPart::Literal(text), rest)) => Box::new(
            interpolate(rest, format, input, env).map(move |item| item.map(|prefix| prefix + text)),
        ),
        Some((StringPart::Interp(expr), rest)) => {
            let values = expr.values(input.clone(), &env);
            flat_map_ok(values, move |v| {
                let piece = match format {
                    Some(name) => format::apply(name, &v),
                    None => Ok(format::tostring(&v)),
                };
                match piece {
                    Ok(piece) => Box::new(
                        interpolate(rest, format, input.clone(), env.clone())
                            .map(move |item| item.map(|prefix| prefix + &piece)),
                    ),
                    Err(e) => once(Err(e)),
                }
            })
        }
    }
}

// ========================================
// Operators
// ========================================

/// Binary operators pair every left value with every right value, the left
/// side varying slowest. `and`/`or` short-circuit per left value and `//`
/// falls back to the right side only when the left yields nothing truthy.
fn binary<'a>(op: BinOp, lhs: &'a Expr, rhs: &'a Expr, input: Value, env: &Env<'a>) -> ValueIter<'a> {
    let env = env.clone();
    match op {
        BinOp::And | BinOp::Or => {
            let lefts = lhs.values(input.clone(), &env);
            flat_map_ok(lefts, move |l| {
                let decided = match op {
                    BinOp::And => !l.is_truthy(),
                    _ => l.is_truthy(),
                };
                if decided {
                    return once(Ok(Value::Boolean(l.is_truthy())));
                }
                Box::new(
                    rhs.values(input.clone(), &env)
                        .map(|r| r.map(|r| Value::Boolean(r.is_truthy()))),
                )
            })
        }
        BinOp::Alternative => defer(move || {
            let mut truthy = lhs
                .values(input.clone(), &env)
                .filter_map(Result::ok)
                .filter(Value::is_truthy)
                .peekable();
            if truthy.peek().is_some() {
                Box::new(truthy.map(Ok)) as ValueIter<'a>
            } else {
                rhs.values(input, &env)
            }
        }),
        _ => {
            let lefts = lhs.values(input.clone(), &env);
            flat_map_ok(lefts, move |l| {
                Box::new(
                    rhs.values(input.clone(), &env)
                        .map(move |r| r.and_then(|r| operators::binary(op, &l, &r))),
                )
            })
        }
    }
}

// ========================================
// Reduce, foreach, try
// ========================================

fn fold<'a>(
    source: &'a Expr,
    name: &'a str,
    update: &'a Expr,
    init: Value,
    input: Value,
    env: &Env<'a>,
) -> Result<Value, EvalError> {
    let mut acc = init;
    for item in source.values(input, env) {
        let scope = env.bind_var(name, item?);
        // an update that yields nothing leaves the accumulator unchanged
        if let Some(next) = last_value(update.values(acc.clone(), &scope))? {
            acc = next;
        }
    }
    Ok(acc)
}

struct Foreach<'a> {
    source: ValueIter<'a>,
    name: &'a str,
    update: &'a Expr,
    extract: Option<&'a Expr>,
    env: Env<'a>,
    state: Value,
    updates: Option<(ValueIter<'a>, Env<'a>)>,
    extracted: Option<ValueIter<'a>>,
}

impl<'a> Iterator for Foreach<'a> {
    type Item = Result<Value, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(extracted) = &mut self.extracted {
                if let Some(item) = extracted.next() {
                    return Some(item);
                }
                self.extracted = None;
            }

            if let Some((updates, scope)) = &mut self.updates {
                match updates.next() {
                    Some(Ok(next)) => {
                        self.state = next.clone();
                        match self.extract {
                            None => return Some(Ok(next)),
                            Some(extract) => {
                                self.extracted = Some(extract.values(next, scope));
                                continue;
                            }
                        }
                    }
                    Some(Err(e)) => return Some(Err(e)),
                    None => self.updates = None,
                }
            }

            match self.source.next()? {
                Ok(item) => {
                    let scope = self.env.bind_var(self.name, item);
                    let updates = self.update.values(self.state.clone(), &scope);
                    self.updates = Some((updates, scope));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Passes items through until the first error, then either stops or
/// switches to the handler's output.
struct TryIter<'a, T> {
    inner: Stream<'a, T>,
    handler: Option<Box<dyn FnOnce(EvalError) -> Stream<'a, T> + 'a>>,
    fallback: Option<Stream<'a, T>>,
    done: bool,
}

impl<'a, T> TryIter<'a, T> {
    fn new(
        inner: Stream<'a, T>,
        handler: Option<Box<dyn FnOnce(EvalError) -> Stream<'a, T> + 'a>>,
    ) -> Self {
        TryIter {
            inner,
            handler,
            fallback: None,
            done: false,
        }
    }
}

impl<'a, T> Iterator for TryIter<'a, T> {
    type Item = Result<T, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(fallback) = &mut self.fallback {
            return fallback.next();
        }
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(Ok(item)) => Some(Ok(item)),
            Some(Err(e)) => {
                self.done = true;
                let handler = self.handler.take()?;
                let fallback = self.fallback.insert(handler(e));
                fallback.next()
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

// ========================================
// Function calls
// ========================================

enum Callee<'a> {
    Closure { body: &'a Expr, env: Env<'a> },
    Def { def: &'a FuncDef, env: Env<'a> },
    Value(Value),
    Native(&'static Native),
}

/// Scope first (arguments and local defs), then natives, then the prelude.
fn resolve<'a>(name: &str, arity: usize, env: &Env<'a>) -> Result<Callee<'a>, EvalError> {
    if let Some(resolved) = env.function(name, arity) {
        return Ok(match resolved {
            Resolved::Closure { body, env } => Callee::Closure { body, env },
            Resolved::Def { def, env } => Callee::Def { def, env },
            Resolved::Value(v) => Callee::Value(v),
        });
    }
    if let Some(native) = builtins::native(name, arity) {
        return Ok(Callee::Native(native));
    }
    if let Some(def) = builtins::prelude_def(name, arity) {
        return Ok(Callee::Def {
            def,
            env: Env::new(),
        });
    }
    Err(EvalError::UndefinedFunction {
        name: name.to_string(),
        arity,
    })
}

fn call_def<'a, T: 'a>(
    def: &'a FuncDef,
    args: &'a [Expr],
    input: Value,
    caller: Env<'a>,
    scope: Env<'a>,
    eval: Eval<'a, T>,
) -> Stream<'a, T> {
    bind_params(&def.params, args, input, caller, scope, &def.body, eval)
}

/// Filter parameters close over the caller's scope; `$` parameters are
/// evaluated up front, one body evaluation per combination of their values.
fn bind_params<'a, T: 'a>(
    params: &'a [Param],
    args: &'a [Expr],
    input: Value,
    caller: Env<'a>,
    scope: Env<'a>,
    body: &'a Expr,
    eval: Eval<'a, T>,
) -> Stream<'a, T> {
    let (Some((param, params)), Some((arg, args))) = (params.split_first(), args.split_first())
    else {
        return eval(body, input, &scope);
    };

    if param.by_value {
        let values = arg.values(input.clone(), &caller);
        flat_map_ok(values, move |v| {
            let scope = scope.bind_value_param(&param.name, v);
            bind_params(params, args, input.clone(), caller.clone(), scope, body, eval)
        })
    } else {
        let scope = scope.bind_closure(&param.name, arg, caller.clone());
        bind_params(params, args, input, caller, scope, body, eval)
    }
}
