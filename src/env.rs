//! Lexical scope for evaluation.
//!
//! An [`Env`] is an immutable linked chain of frames. Binding returns a new
//! `Env` and leaves the old one untouched, so a binding is only visible to the
//! sub-evaluation it was handed to and sibling branches never observe it.

use std::borrow::Cow;
use std::rc::Rc;

use crate::{
    ast::{Expr, FuncDef},
    value::Value,
};

#[derive(Debug, Clone, Default)]
pub struct Env<'a>(Option<Rc<Frame<'a>>>);

#[derive(Debug)]
struct Frame<'a> {
    binding: Binding<'a>,
    parent: Env<'a>,
}

#[derive(Debug)]
enum Binding<'a> {
    /// `$name`. Value parameters (`def f($x)`) are also callable as `x/0`.
    Var {
        name: Cow<'a, str>,
        value: Value,
        callable: bool,
    },
    /// A filter argument: `name/0` evaluates `body` in the caller's scope.
    Closure {
        name: &'a str,
        body: &'a Expr,
        env: Env<'a>,
    },
    /// A local `def`.
    Def(&'a FuncDef),
}

/// What a function name resolved to.
pub enum Resolved<'a> {
    /// Argument closure with the scope it was written in.
    Closure { body: &'a Expr, env: Env<'a> },
    /// Local definition with the scope it was defined in (including itself).
    Def { def: &'a FuncDef, env: Env<'a> },
    /// Value parameter used as a function.
    Value(Value),
}

impl<'a> Env<'a> {
    pub fn new() -> Self {
        Env(None)
    }

    fn push(&self, binding: Binding<'a>) -> Env<'a> {
        Env(Some(Rc::new(Frame {
            binding,
            parent: self.clone(),
        })))
    }

    pub fn bind_var(&self, name: impl Into<Cow<'a, str>>, value: Value) -> Env<'a> {
        self.push(Binding::Var {
            name: name.into(),
            value,
            callable: false,
        })
    }

    pub fn bind_value_param(&self, name: &'a str, value: Value) -> Env<'a> {
        self.push(Binding::Var {
            name: Cow::Borrowed(name),
            value,
            callable: true,
        })
    }

    pub fn bind_closure(&self, name: &'a str, body: &'a Expr, env: Env<'a>) -> Env<'a> {
        self.push(Binding::Closure { name, body, env })
    }

    pub fn define(&self, def: &'a FuncDef) -> Env<'a> {
        self.push(Binding::Def(def))
    }

    fn frames(&self) -> impl Iterator<Item = &Rc<Frame<'a>>> {
        std::iter::successors(self.0.as_ref(), |frame| frame.parent.0.as_ref())
    }

    /// Innermost binding of `$name`.
    pub fn var(&self, name: &str) -> Option<&Value> {
        self.frames().find_map(|frame| match &frame.binding {
            Binding::Var { name: n, value, .. } if n == name => Some(value),
            _ => None,
        })
    }

    /// Innermost function binding matching both name and arity.
    pub fn function(&self, name: &str, arity: usize) -> Option<Resolved<'a>> {
        self.frames().find_map(|frame| match &frame.binding {
            Binding::Closure { name: n, body, env } if *n == name && arity == 0 => {
                Some(Resolved::Closure {
                    body: *body,
                    env: env.clone(),
                })
            }
            Binding::Var {
                name: n,
                value,
                callable: true,
            } if n == name && arity == 0 => Some(Resolved::Value(value.clone())),
            Binding::Def(def) if def.name == name && def.arity() == arity => Some(Resolved::Def {
                def: *def,
                env: Env(Some(Rc::clone(frame))),
            }),
            _ => None,
        })
    }
}
