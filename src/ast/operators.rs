/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Arithmetic
    /// Addition, concatenation or merge (`+`)
    Add,
    /// Subtraction or array difference (`-`)
    Subtract,
    /// Multiplication, string repeat or deep merge (`*`)
    Multiply,
    /// Division or string split (`/`)
    Divide,
    /// Integer remainder (`%`)
    Modulo,

    // Logical
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,

    /// Alternative (`//`): left values that are truthy, else the right side
    Alternative,
}

impl BinOp {
    /// Binding weight used by the shunting-yard pass. Lower binds looser.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Alternative => 20,
            BinOp::Or => 24,
            BinOp::And => 26,
            BinOp::Equal
            | BinOp::NotEqual
            | BinOp::LessThan
            | BinOp::GreaterThan
            | BinOp::LessEqual
            | BinOp::GreaterEqual => 30,
            BinOp::Add | BinOp::Subtract => 50,
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => 100,
        }
    }

    pub fn is_right_assoc(self) -> bool {
        matches!(self, BinOp::Alternative)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Alternative => "//",
        }
    }
}

/// Weight of `|=` and the compound `op=` forms: loosest of all, right associative.
pub const UPDATE_PRECEDENCE: u8 = 10;
