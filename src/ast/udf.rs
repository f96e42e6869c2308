use crate::ast::Expr;

/// A locally defined function (`def name(params): body;`).
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    /// Function name
    pub name: String,

    /// Parameters, in declaration order
    pub params: Vec<Param>,

    /// Function body (pre-parsed AST)
    pub body: Box<Expr>,
}

impl FuncDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A function parameter.
///
/// `def f(g)` binds `g` as a filter closure. `def f($v)` evaluates the
/// argument and binds each of its values to `$v` (and `v/0`).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub by_value: bool,
}
