//! Compiled filters.
//!
//! [`compile`] lexes and parses a program once; the resulting [`Filter`] can
//! then be run against any number of inputs.
//!
//! # Examples
//!
//! ```
//! use tine_lang::{Value, compile};
//!
//! let filter = compile(".items[] | select(.price > 10) | .name").unwrap();
//! let input = Value::from_json_str(r#"{"items": [
//!     {"name": "pen", "price": 2},
//!     {"name": "lamp", "price": 40}
//! ]}"#).unwrap();
//!
//! let names: Vec<Value> = filter.run(input).collect::<Result<_, _>>().unwrap();
//! assert_eq!(names, vec![Value::from("lamp")]);
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::{
    ast::Expr,
    env::Env,
    evaluator::{EvalError, Stream},
    parser::{ParseError, Parser},
    path::Path,
    value::Value,
};

/// Compile `source` into a reusable filter.
pub fn compile(source: &str) -> Result<Filter, ParseError> {
    let expr = Parser::from_source(source)?.parse_program()?;
    debug!(source, "compiled filter");
    Ok(Filter {
        source: source.to_string(),
        expr,
    })
}

/// A parsed program.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    expr: Expr,
}

impl Filter {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against `input` in a fresh environment.
    pub fn run(&self, input: Value) -> Outputs<'_> {
        Outputs::new(self.expr.values(input, &Env::new()))
    }

    /// Evaluate with `$name` variables bound up front.
    pub fn run_with_vars<I>(&self, input: Value, vars: I) -> Outputs<'_>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let env = vars
            .into_iter()
            .fold(Env::new(), |env, (name, value)| env.bind_var(name, value));
        Outputs::new(self.expr.values(input, &env))
    }

    /// Locations of the outputs inside `input`.
    pub fn paths(&self, input: Value) -> Outputs<'_, Path> {
        let paths = self.expr.paths(input, &Env::new());
        Outputs::new(Box::new(paths.map(|item| item.map(|(p, _)| p))))
    }

    /// All outputs, or the first error.
    pub fn run_all(&self, input: Value) -> Result<Vec<Value>, EvalError> {
        self.run(input).collect()
    }
}

impl FromStr for Filter {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        compile(source)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Lazily produced results of running a filter.
///
/// An error ends the sequence: it is yielded once and nothing follows it.
pub struct Outputs<'f, T = Value> {
    inner: Stream<'f, T>,
    done: bool,
}

impl<'f, T> Outputs<'f, T> {
    fn new(inner: Stream<'f, T>) -> Self {
        Outputs { inner, done: false }
    }
}

impl<T> Iterator for Outputs<'_, T> {
    type Item = Result<T, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.inner.next();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_fuses_outputs() {
        let filter = compile("1, error(\"stop\"), 3").unwrap();
        let results: Vec<_> = filter.run(Value::Null).collect();
        assert_eq!(results.len(), 2);
        assert!(results[1].is_err());
    }

    #[test]
    fn test_vars_are_visible() {
        let filter = compile("$x + 1").unwrap();
        let out = filter
            .run_with_vars(Value::Null, [("x".to_string(), Value::from(41i64))])
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(out, vec![Value::from(42i64)]);
    }

    #[test]
    fn test_from_str() {
        let filter: Filter = ".a".parse().unwrap();
        assert_eq!(filter.to_string(), ".a");
        assert!("(".parse::<Filter>().is_err());
    }
}
