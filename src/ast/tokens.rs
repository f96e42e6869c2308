use std::fmt;

use crate::ast::BinOp;

/// A lexical token together with the character offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Token { kind, offset }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Number literal, always stored as a double
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 1e3
    /// ```
    Number(f64),

    /// A chunk of quoted string text with escapes already resolved.
    ///
    /// An interpolated string is split into several chunks:
    /// ```text
    /// "a\(.x)b"  →  Quote("a") InterpStart Field("x") InterpEnd Quote("b")
    /// ```
    Quote(String),

    /// Identifier index (`.name`)
    ///
    /// # Examples
    /// ```text
    /// .user
    /// .item_count
    /// ```
    Field(String),

    /// Variable reference (`$name`)
    Variable(String),

    /// Function name or bare object key
    Ident(String),

    // Structural
    /// Identity (`.`)
    Dot,
    /// Recursive descent (`..`)
    DotDot,
    /// Index on the input (`.[`)
    DotSquare,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Pipe,
    Colon,
    Semicolon,
    /// Error suppression (`?`)
    Question,
    /// Format prefix (`@`)
    At,
    /// Opens an embedded `\(` inside a string
    InterpStart,
    /// Closes an embedded sub-expression
    InterpEnd,

    // Keywords
    As,
    Reduce,
    Foreach,
    Def,
    Import,
    Include,
    If,
    Then,
    Elif,
    Else,
    End,
    True,
    False,
    Null,
    And,
    Or,
    Try,
    Catch,

    // Operators
    /// Binary operator (`+ - * / % // == != < > <= >=`)
    Op(BinOp),

    /// Update-assignment (`|=`), or compound `op=` carrying its operator
    ///
    /// # Examples
    /// ```text
    /// .a |= . + 1     →  Update(None)
    /// .a += 1         →  Update(Some(Add))
    /// .a //= 0        →  Update(Some(Alternative))
    /// ```
    Update(Option<BinOp>),

    Eof,
}

impl TokenKind {
    /// Maps a reserved word to its keyword token.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "as" => TokenKind::As,
            "reduce" => TokenKind::Reduce,
            "foreach" => TokenKind::Foreach,
            "def" => TokenKind::Def,
            "import" => TokenKind::Import,
            "include" => TokenKind::Include,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "end" => TokenKind::End,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            _ => return None,
        };
        Some(kind)
    }

    /// The source spelling of a keyword token, if this is one.
    pub fn keyword_name(&self) -> Option<&'static str> {
        let name = match self {
            TokenKind::As => "as",
            TokenKind::Reduce => "reduce",
            TokenKind::Foreach => "foreach",
            TokenKind::Def => "def",
            TokenKind::Import => "import",
            TokenKind::Include => "include",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::End => "end",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.keyword_name() {
            return write!(f, "'{}'", name);
        }
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Quote(s) => write!(f, "string {:?}", s),
            TokenKind::Field(name) => write!(f, "'.{}'", name),
            TokenKind::Variable(name) => write!(f, "'${}'", name),
            TokenKind::Ident(name) => write!(f, "'{}'", name),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::DotDot => write!(f, "'..'"),
            TokenKind::DotSquare => write!(f, "'.['"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::At => write!(f, "'@'"),
            TokenKind::InterpStart => write!(f, "'\\('"),
            TokenKind::InterpEnd => write!(f, "end of interpolation"),
            TokenKind::Op(op) => write!(f, "'{}'", op.symbol()),
            TokenKind::Update(None) => write!(f, "'|='"),
            TokenKind::Update(Some(op)) => write!(f, "'{}='", op.symbol()),
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "{:?}", self),
        }
    }
}
