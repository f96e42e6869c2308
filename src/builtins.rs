//! Built-in functions.
//!
//! Builtins come in two kinds. Natives are Rust functions registered here by
//! `name/arity`. Prelude functions are written in the filter language itself
//! and parsed once on first use. A call is resolved against the caller's
//! scope first, then natives, then the prelude, so user definitions shadow
//! both.
//!
//! Most natives map values to values and are lifted over the cartesian
//! product of their argument outputs. Natives that need to drive their
//! arguments themselves (`range`, `first`, `sort_by`, ...) are generators and
//! see the argument expressions directly.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::{
    ast::Expr,
    env::Env,
    evaluator::{EvalError, PathIter, ValueIter, flat_map_ok, once},
    value::Value,
};

mod collections;
mod general;
mod paths;
mod prelude;
mod strings;

pub use prelude::prelude_def;

type Nullary = fn(&Value) -> Result<Value, EvalError>;
type Unary = fn(&Value, Value) -> Result<Value, EvalError>;
type Binary = fn(&Value, Value, Value) -> Result<Value, EvalError>;
type Generator = for<'a> fn(Args<'a>, Value) -> ValueIter<'a>;
type PathGenerator = for<'a> fn(Args<'a>, Value) -> PathIter<'a>;

/// How a native consumes its arguments.
#[derive(Clone, Copy)]
pub enum Run {
    /// No arguments: a function of the input.
    Nullary(Nullary),
    /// Called once per value of the argument.
    Unary(Unary),
    /// Called once per pair of argument values, first argument varying slowest.
    Binary(Binary),
    /// Sees the unevaluated arguments and produces its own stream.
    Generator(Generator),
}

/// A builtin implemented in Rust.
pub struct Native {
    pub name: &'static str,
    pub arity: usize,
    run: Run,
    paths: Option<PathGenerator>,
}

impl Native {
    pub(crate) const fn new(name: &'static str, arity: usize, run: Run) -> Self {
        Native {
            name,
            arity,
            run,
            paths: None,
        }
    }

    /// Make the native usable where paths are required.
    pub(crate) const fn with_paths(mut self, paths: PathGenerator) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn values<'a>(&self, args: &'a [Expr], input: Value, env: &Env<'a>) -> ValueIter<'a> {
        let args = Args {
            exprs: args,
            env: env.clone(),
        };
        match self.run {
            Run::Nullary(f) => once(f(&input)),
            Run::Unary(f) => {
                let values = args.values(0, input.clone());
                Box::new(values.map(move |arg| arg.and_then(|arg| f(&input, arg))))
            }
            Run::Binary(f) => {
                let firsts = args.values(0, input.clone());
                flat_map_ok(firsts, move |a| {
                    let input = input.clone();
                    Box::new(
                        args.values(1, input.clone())
                            .map(move |b| b.and_then(|b| f(&input, a.clone(), b))),
                    )
                })
            }
            Run::Generator(f) => f(args, input),
        }
    }

    pub fn paths<'a>(&self, args: &'a [Expr], input: Value, env: &Env<'a>) -> PathIter<'a> {
        match self.paths {
            Some(f) => f(
                Args {
                    exprs: args,
                    env: env.clone(),
                },
                input,
            ),
            None => once(Err(EvalError::NoPaths(format!(
                "{}/{}",
                self.name, self.arity
            )))),
        }
    }
}

/// The argument expressions of a call, with the caller's scope.
#[derive(Clone)]
pub struct Args<'a> {
    exprs: &'a [Expr],
    env: Env<'a>,
}

impl<'a> Args<'a> {
    fn missing(&self, index: usize) -> EvalError {
        EvalError::Type(format!("missing argument {}", index + 1))
    }

    /// Outputs of argument `index` evaluated against `input`.
    pub fn values(&self, index: usize, input: Value) -> ValueIter<'a> {
        match self.exprs.get(index) {
            Some(expr) => expr.values(input, &self.env),
            None => once(Err(self.missing(index))),
        }
    }

    pub fn paths(&self, index: usize, input: Value) -> PathIter<'a> {
        match self.exprs.get(index) {
            Some(expr) => expr.paths(input, &self.env),
            None => once(Err(self.missing(index))),
        }
    }
}

fn registry() -> &'static HashMap<&'static str, Vec<&'static Native>> {
    static REGISTRY: OnceLock<HashMap<&'static str, Vec<&'static Native>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry: HashMap<&'static str, Vec<&'static Native>> = HashMap::new();
        let tables = [
            general::NATIVES,
            strings::NATIVES,
            collections::NATIVES,
            paths::NATIVES,
        ];
        for native in tables.into_iter().flatten() {
            registry.entry(native.name).or_default().push(native);
        }
        registry
    })
}

/// Look up a native by name and arity.
pub fn native(name: &str, arity: usize) -> Option<&'static Native> {
    registry()
        .get(name)?
        .iter()
        .find(|native| native.arity == arity)
        .copied()
}

/// Every builtin as `name/arity`, natives first.
pub fn names() -> Vec<String> {
    let mut natives: Vec<String> = registry()
        .values()
        .flatten()
        .map(|native| format!("{}/{}", native.name, native.arity))
        .collect();
    natives.sort();
    natives.extend(prelude::names());
    natives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_arity() {
        assert!(native("range", 1).is_some());
        assert!(native("range", 3).is_some());
        assert!(native("range", 4).is_none());
        assert!(native("no_such_builtin", 0).is_none());
    }

    #[test]
    fn test_no_duplicate_natives() {
        for (name, natives) in registry() {
            let mut arities: Vec<usize> = natives.iter().map(|n| n.arity).collect();
            arities.sort();
            arities.dedup();
            assert_eq!(arities.len(), natives.len(), "{} registered twice", name);
        }
    }

    #[test]
    fn test_prelude_is_reachable() {
        assert!(prelude_def("map", 1).is_some());
        assert!(prelude_def("select", 1).is_some());
        assert!(native("map", 1).is_none());
    }
}
