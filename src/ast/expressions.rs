use crate::ast::{BinOp, FuncDef};
use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed filter.
///
/// Every node maps one input value to a lazy sequence of outputs, see
/// [`Expr::values`](crate::ast::Expr::values) and
/// [`Expr::paths`](crate::ast::Expr::paths).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identity (`.`)
    Identity,

    /// Recursive descent (`..`)
    RecursiveDescent,

    /// Literal number, string without interpolation, boolean or null
    ///
    /// # Example
    /// ```text
    /// 42
    /// "hello"
    /// true
    /// ```
    Literal(Value),

    /// String with interpolated parts, optionally rendered through a format
    ///
    /// # Example
    /// ```text
    /// "id: \(.id)"
    /// @base64 "token=\(.token)"
    /// ```
    Str {
        parts: Vec<StringPart>,
        format: Option<String>,
    },

    /// Bare format applied to the input (`@csv`)
    Format(String),

    /// Variable reference (`$name`)
    Variable(String),

    /// Indexing. The key is evaluated against the same input as the target.
    ///
    /// # Example
    /// ```text
    /// .name        →  Index { target: Identity, key: "name" }
    /// .items[0]
    /// $row[.col]
    /// ```
    Index { target: Box<Expr>, key: Box<Expr> },

    /// Slicing with optional bounds (`.[a:b]`, `.[:b]`, `.[a:]`)
    Slice {
        target: Box<Expr>,
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },

    /// Value iterator (`.[]`, `.items[]`)
    Iterate(Box<Expr>),

    /// Sequential composition (`a | b`)
    Pipe(Box<Expr>, Box<Expr>),

    /// Fan-out over branches in order (`a, b, c`)
    Comma(Vec<Expr>),

    /// Array construction; `None` is the empty literal `[]`
    Array(Option<Box<Expr>>),

    /// Object construction: one (key, value) filter pair per field
    Object(Vec<(Expr, Expr)>),

    /// Prefix minus
    Neg(Box<Expr>),

    /// Binary operator
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Update-assignment (`target |= value`)
    ///
    /// Compound forms are desugared by the parser:
    /// ```text
    /// .a += 1  →  Update { target: .a, value: . + 1 }
    /// ```
    Update { target: Box<Expr>, value: Box<Expr> },

    /// `source as $name | body`
    Bind {
        source: Box<Expr>,
        name: String,
        body: Box<Expr>,
    },

    /// `reduce source as $name (init; update)`
    Reduce {
        source: Box<Expr>,
        name: String,
        init: Box<Expr>,
        update: Box<Expr>,
    },

    /// `foreach source as $name (init; update; extract)`
    Foreach {
        source: Box<Expr>,
        name: String,
        init: Box<Expr>,
        update: Box<Expr>,
        extract: Option<Box<Expr>>,
    },

    /// `if cond then a else b end`; `elif` nests into `otherwise`
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },

    /// `try body catch handler`, and postfix `?` with no handler
    Try {
        body: Box<Expr>,
        handler: Option<Box<Expr>>,
    },

    /// Function call by name and arity
    Call { name: String, args: Vec<Expr> },

    /// `def name(params): body; rest`
    Define { def: FuncDef, rest: Box<Expr> },
}

/// One piece of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Literal(String),
    Interp(Expr),
}

impl Expr {
    pub fn string(s: impl Into<String>) -> Expr {
        Expr::Literal(Value::String(s.into()))
    }

    pub fn field(name: impl Into<String>) -> Expr {
        Expr::Index {
            target: Box::new(Expr::Identity),
            key: Box::new(Expr::string(name)),
        }
    }

    pub fn pipe(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Pipe(Box::new(lhs), Box::new(rhs))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            name: name.into(),
            args,
        }
    }
}
