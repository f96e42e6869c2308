use crate::{
    ast::{BinOp, Expr, FuncDef, Param, StringPart, Token, TokenKind, operators::UPDATE_PRECEDENCE},
    lexer::{LexError, Lexer},
    value::Value,
};
use std::mem;

/// Errors raised while turning tokens into a filter tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: TokenKind, offset: usize },

    #[error("expected {expected}, found {found} at offset {offset}")]
    Expected {
        expected: String,
        found: TokenKind,
        offset: usize,
    },

    #[error("{construct} is not supported (offset {offset})")]
    Unsupported { construct: String, offset: usize },

    #[error("lex error: {0}")]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::Expected { offset, .. }
            | ParseError::Unsupported { offset, .. } => *offset,
            ParseError::Lex(e) => e.offset(),
        }
    }
}

/// Parse `tokens` from index `start` until a token whose kind is in `stop`
/// (compared by variant) or the end of input.
///
/// Returns the parsed node and the index of the token that stopped it.
pub fn parse(
    tokens: &[Token],
    start: usize,
    stop: &[TokenKind],
) -> Result<(Expr, usize), ParseError> {
    let mut parser = Parser::new(tokens.to_vec());
    parser.position = start;
    let expr = parser.parse_until(stop)?;
    Ok((expr, parser.position))
}

/// An infix operator waiting on the shunting-yard stack.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinOp),
    Update(Option<BinOp>),
}

impl Infix {
    fn precedence(self) -> u8 {
        match self {
            Infix::Binary(op) => op.precedence(),
            Infix::Update(_) => UPDATE_PRECEDENCE,
        }
    }

    fn is_right_assoc(self) -> bool {
        match self {
            Infix::Binary(op) => op.is_right_assoc(),
            Infix::Update(_) => true,
        }
    }

    fn apply(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            Infix::Binary(op) => Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Infix::Update(None) => Expr::Update {
                target: Box::new(lhs),
                value: Box::new(rhs),
            },
            Infix::Update(Some(op)) => Expr::Update {
                target: Box::new(lhs),
                value: Box::new(Expr::Binary {
                    op,
                    lhs: Box::new(Expr::Identity),
                    rhs: Box::new(rhs),
                }),
            },
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.offset + 1);
            tokens.push(Token::new(TokenKind::Eof, end));
        }
        Parser {
            tokens,
            position: 0,
        }
    }

    /// Lex `source` and prepare a parser over its tokens.
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        Ok(Parser::new(Lexer::new(source).tokenize()?))
    }

    /// Parse a complete program, requiring all input to be consumed.
    pub fn parse_program(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_until(&[])?;
        match self.kind() {
            TokenKind::Eof => Ok(expr),
            _ => Err(self.unexpected()),
        }
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn offset(&self) -> usize {
        self.current().offset
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    /// Take the current token kind, leaving `Eof` in its place, and advance.
    fn take(&mut self) -> TokenKind {
        let index = self.position.min(self.tokens.len() - 1);
        let kind = mem::replace(&mut self.tokens[index].kind, TokenKind::Eof);
        self.advance();
        kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(self.kind()) == mem::discriminant(kind)
    }

    fn stops(&self, stop: &[TokenKind]) -> bool {
        stop.iter().any(|k| self.check(k))
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.kind().clone(),
            offset: self.offset(),
        }
    }

    fn expected(&self, what: &str) -> ParseError {
        ParseError::Expected {
            expected: what.to_string(),
            found: self.kind().clone(),
            offset: self.offset(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(&kind.to_string()))
        }
    }

    fn expect_variable(&mut self) -> Result<String, ParseError> {
        match self.kind() {
            TokenKind::Variable(_) => match self.take() {
                TokenKind::Variable(name) => Ok(name),
                _ => Err(self.unexpected()),
            },
            _ => Err(self.expected("a variable")),
        }
    }

    // ========================================
    // Pipes, commas and bindings
    // ========================================

    /// The single recursive entry point: everything nested parses through here.
    pub fn parse_until(&mut self, stop: &[TokenKind]) -> Result<Expr, ParseError> {
        let expr = self.parse_pipe(stop)?;
        if self.stops(stop) || self.check(&TokenKind::Eof) {
            Ok(expr)
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_pipe(&mut self, stop: &[TokenKind]) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Def) {
            let def = self.parse_def()?;
            let rest = self.parse_pipe(stop)?;
            return Ok(Expr::Define {
                def,
                rest: Box::new(rest),
            });
        }

        let lhs = self.parse_comma(stop)?;

        match self.kind() {
            TokenKind::Pipe if !self.stops(stop) => {
                self.advance();
                let rhs = self.parse_pipe(stop)?;
                Ok(Expr::pipe(lhs, rhs))
            }
            TokenKind::As => {
                self.advance();
                let name = self.expect_variable()?;
                self.expect(TokenKind::Pipe)?;
                let body = self.parse_pipe(stop)?;
                Ok(Expr::Bind {
                    source: Box::new(lhs),
                    name,
                    body: Box::new(body),
                })
            }
            _ => Ok(lhs),
        }
    }

    fn parse_comma(&mut self, stop: &[TokenKind]) -> Result<Expr, ParseError> {
        let mut branches = vec![self.parse_expr()?];
        while self.check(&TokenKind::Comma) && !self.stops(stop) {
            self.advance();
            branches.push(self.parse_expr()?);
        }

        if branches.len() == 1 {
            Ok(branches.remove(0))
        } else {
            Ok(Expr::Comma(branches))
        }
    }

    // ========================================
    // Operators
    // ========================================

    fn current_infix(&self) -> Option<Infix> {
        match self.kind() {
            TokenKind::Op(op) => Some(Infix::Binary(*op)),
            TokenKind::And => Some(Infix::Binary(BinOp::And)),
            TokenKind::Or => Some(Infix::Binary(BinOp::Or)),
            TokenKind::Update(op) => Some(Infix::Update(*op)),
            _ => None,
        }
    }

    /// Operand (operator operand)* resolved with a shunting-yard stack.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut operands = vec![self.parse_operand()?];
        let mut operators: Vec<Infix> = Vec::new();

        while let Some(op) = self.current_infix() {
            self.advance();
            while let Some(&top) = operators.last() {
                let binds_tighter = top.precedence() > op.precedence()
                    || (top.precedence() == op.precedence() && !op.is_right_assoc());
                if !binds_tighter {
                    break;
                }
                operators.pop();
                Self::reduce_top(&mut operands, top)?;
            }
            operators.push(op);
            operands.push(self.parse_operand()?);
        }

        while let Some(top) = operators.pop() {
            Self::reduce_top(&mut operands, top)?;
        }

        operands.pop().ok_or(ParseError::Unsupported {
            construct: "empty expression".to_string(),
            offset: 0,
        })
    }

    fn reduce_top(operands: &mut Vec<Expr>, op: Infix) -> Result<(), ParseError> {
        match (operands.pop(), operands.pop()) {
            (Some(rhs), Some(lhs)) => {
                operands.push(op.apply(lhs, rhs));
                Ok(())
            }
            _ => Err(ParseError::Unsupported {
                construct: "dangling operator".to_string(),
                offset: 0,
            }),
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Op(BinOp::Subtract)) {
            self.advance();
            let operand = self.parse_operand()?;
            return Ok(match operand {
                Expr::Literal(Value::Number(n)) => Expr::Literal(Value::Number(-n)),
                other => Expr::Neg(Box::new(other)),
            });
        }
        self.parse_term_run()
    }

    // ========================================
    // Terms
    // ========================================

    /// A primary term followed by any run of suffixes: `.a.b[0][]?`, `$x.name`.
    fn parse_term_run(&mut self) -> Result<Expr, ParseError> {
        let mut acc = self.parse_primary()?;

        loop {
            match self.kind() {
                TokenKind::Field(_) => {
                    let TokenKind::Field(name) = self.take() else {
                        return Err(self.unexpected());
                    };
                    acc = Expr::Index {
                        target: Box::new(acc),
                        key: Box::new(Expr::string(name)),
                    };
                }
                TokenKind::Dot if self.next_is_quote() => {
                    self.advance();
                    let key = self.parse_string(None)?;
                    acc = Expr::Index {
                        target: Box::new(acc),
                        key: Box::new(key),
                    };
                }
                TokenKind::DotSquare | TokenKind::LBracket => {
                    self.advance();
                    acc = self.parse_bracket_suffix(acc)?;
                }
                TokenKind::Question => {
                    self.advance();
                    acc = Expr::Try {
                        body: Box::new(acc),
                        handler: None,
                    };
                }
                _ => return Ok(acc),
            }
        }
    }

    fn next_is_quote(&self) -> bool {
        matches!(
            self.tokens.get(self.position + 1).map(|t| &t.kind),
            Some(TokenKind::Quote(_))
        )
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.kind() {
            TokenKind::Dot => {
                if self.next_is_quote() {
                    self.advance();
                    let key = self.parse_string(None)?;
                    return Ok(Expr::Index {
                        target: Box::new(Expr::Identity),
                        key: Box::new(key),
                    });
                }
                self.advance();
                Ok(Expr::Identity)
            }
            TokenKind::DotDot => {
                self.advance();
                Ok(Expr::RecursiveDescent)
            }
            TokenKind::DotSquare => {
                self.advance();
                self.parse_bracket_suffix(Expr::Identity)
            }
            TokenKind::Quote(_) => self.parse_string(None),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_until(&[TokenKind::RParen])?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                if self.check(&TokenKind::RBracket) {
                    self.advance();
                    return Ok(Expr::Array(None));
                }
                let inner = self.parse_until(&[TokenKind::RBracket])?;
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::Array(Some(Box::new(inner))))
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_object()
            }
            TokenKind::At => {
                self.advance();
                self.parse_format()
            }
            TokenKind::Reduce => {
                self.advance();
                self.parse_reduce()
            }
            TokenKind::Foreach => {
                self.advance();
                self.parse_foreach()
            }
            TokenKind::If => {
                self.advance();
                self.parse_if()
            }
            TokenKind::Try => {
                self.advance();
                self.parse_try()
            }
            TokenKind::Import | TokenKind::Include => Err(ParseError::Unsupported {
                construct: format!("{} directive", self.kind()),
                offset,
            }),
            _ => match self.take() {
                TokenKind::Field(name) => Ok(Expr::field(name)),
                TokenKind::Number(n) => Ok(Expr::Literal(Value::Number(n))),
                TokenKind::Variable(name) => Ok(Expr::Variable(name)),
                TokenKind::True => Ok(Expr::Literal(Value::Boolean(true))),
                TokenKind::False => Ok(Expr::Literal(Value::Boolean(false))),
                TokenKind::Null => Ok(Expr::Literal(Value::Null)),
                TokenKind::Ident(name) => self.parse_call(name),
                found => Err(ParseError::UnexpectedToken { found, offset }),
            },
        }
    }

    /// Called after `[` or `.[`: index, slice or iterate over `target`.
    fn parse_bracket_suffix(&mut self, target: Expr) -> Result<Expr, ParseError> {
        let target = Box::new(target);

        if self.check(&TokenKind::RBracket) {
            self.advance();
            return Ok(Expr::Iterate(target));
        }

        if self.check(&TokenKind::Colon) {
            self.advance();
            let to = self.parse_until(&[TokenKind::RBracket])?;
            self.expect(TokenKind::RBracket)?;
            return Ok(Expr::Slice {
                target,
                from: None,
                to: Some(Box::new(to)),
            });
        }

        let key = self.parse_until(&[TokenKind::Colon, TokenKind::RBracket])?;
        if self.check(&TokenKind::Colon) {
            self.advance();
            let to = if self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_until(&[TokenKind::RBracket])?))
            };
            self.expect(TokenKind::RBracket)?;
            return Ok(Expr::Slice {
                target,
                from: Some(Box::new(key)),
                to,
            });
        }

        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Index {
            target,
            key: Box::new(key),
        })
    }

    /// A quoted string, possibly interpolated. Literal-only strings fold to
    /// a plain value.
    fn parse_string(&mut self, format: Option<String>) -> Result<Expr, ParseError> {
        let mut parts = Vec::new();

        loop {
            if !matches!(self.kind(), TokenKind::Quote(_)) {
                return Err(self.expected("a string"));
            }
            if let TokenKind::Quote(chunk) = self.take()
                && !chunk.is_empty()
            {
                parts.push(StringPart::Literal(chunk));
            }

            if !self.check(&TokenKind::InterpStart) {
                break;
            }
            self.advance();
            let inner = self.parse_until(&[TokenKind::InterpEnd])?;
            self.expect(TokenKind::InterpEnd)?;
            parts.push(StringPart::Interp(inner));
        }

        if parts.iter().all(|p| matches!(p, StringPart::Literal(_))) {
            let text: String = parts
                .into_iter()
                .filter_map(|p| match p {
                    StringPart::Literal(s) => Some(s),
                    StringPart::Interp(_) => None,
                })
                .collect();
            return Ok(Expr::string(text));
        }

        Ok(Expr::Str { parts, format })
    }

    fn parse_format(&mut self) -> Result<Expr, ParseError> {
        let name = match self.kind() {
            TokenKind::Ident(_) => match self.take() {
                TokenKind::Ident(name) => name,
                _ => return Err(self.unexpected()),
            },
            _ => return Err(self.expected("a format name after '@'")),
        };

        if matches!(self.kind(), TokenKind::Quote(_)) {
            self.parse_string(Some(name))
        } else {
            Ok(Expr::Format(name))
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, ParseError> {
        let mut args = Vec::new();
        if self.check(&TokenKind::LParen) {
            self.advance();
            let stop = [TokenKind::Semicolon, TokenKind::RParen];
            args.push(self.parse_until(&stop)?);
            while self.check(&TokenKind::Semicolon) {
                self.advance();
                args.push(self.parse_until(&stop)?);
            }
            self.expect(TokenKind::RParen)?;
        }
        Ok(Expr::Call { name, args })
    }

    // ========================================
    // Object construction
    // ========================================

    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();

        if self.check(&TokenKind::RBrace) {
            self.advance();
            return Ok(Expr::Object(entries));
        }

        loop {
            let (key, shorthand) = self.parse_object_key()?;

            let value = if self.check(&TokenKind::Colon) {
                self.advance();
                self.parse_until(&[TokenKind::Comma, TokenKind::RBrace])?
            } else {
                shorthand.ok_or_else(|| self.expected("':'"))?
            };
            entries.push((key, value));

            match self.kind() {
                TokenKind::Comma => self.advance(),
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(Expr::Object(entries));
                }
                _ => return Err(self.expected("',' or '}'")),
            }
        }
    }

    /// The key filter of one field plus the value it implies when the field
    /// has no `: value` part.
    fn parse_object_key(&mut self) -> Result<(Expr, Option<Expr>), ParseError> {
        if let Some(word) = self.kind().keyword_name() {
            self.advance();
            return Ok((Expr::string(word), Some(Expr::field(word))));
        }

        match self.kind() {
            TokenKind::Ident(_) => {
                let TokenKind::Ident(name) = self.take() else {
                    return Err(self.unexpected());
                };
                Ok((Expr::string(name.clone()), Some(Expr::field(name))))
            }
            TokenKind::Variable(_) => {
                let TokenKind::Variable(name) = self.take() else {
                    return Err(self.unexpected());
                };
                if self.check(&TokenKind::Colon) {
                    Ok((Expr::Variable(name), None))
                } else {
                    Ok((Expr::string(name.clone()), Some(Expr::Variable(name))))
                }
            }
            TokenKind::Quote(_) => {
                let key = self.parse_string(None)?;
                let implied = Expr::Index {
                    target: Box::new(Expr::Identity),
                    key: Box::new(key.clone()),
                };
                Ok((key, Some(implied)))
            }
            TokenKind::At => {
                self.advance();
                let key = self.parse_format()?;
                Ok((key, None))
            }
            TokenKind::LParen => {
                self.advance();
                let key = self.parse_until(&[TokenKind::RParen])?;
                self.expect(TokenKind::RParen)?;
                Ok((key, None))
            }
            _ => Err(self.expected("an object key")),
        }
    }

    // ========================================
    // Control constructs
    // ========================================

    fn parse_reduce(&mut self) -> Result<Expr, ParseError> {
        let source = self.parse_term_run()?;
        self.expect(TokenKind::As)?;
        let name = self.expect_variable()?;
        self.expect(TokenKind::LParen)?;
        let init = self.parse_until(&[TokenKind::Semicolon])?;
        self.expect(TokenKind::Semicolon)?;
        let update = self.parse_until(&[TokenKind::RParen])?;
        self.expect(TokenKind::RParen)?;

        Ok(Expr::Reduce {
            source: Box::new(source),
            name,
            init: Box::new(init),
            update: Box::new(update),
        })
    }

    fn parse_foreach(&mut self) -> Result<Expr, ParseError> {
        let source = self.parse_term_run()?;
        self.expect(TokenKind::As)?;
        let name = self.expect_variable()?;
        self.expect(TokenKind::LParen)?;
        let init = self.parse_until(&[TokenKind::Semicolon])?;
        self.expect(TokenKind::Semicolon)?;
        let update = self.parse_until(&[TokenKind::Semicolon, TokenKind::RParen])?;
        let extract = if self.check(&TokenKind::Semicolon) {
            self.advance();
            Some(Box::new(self.parse_until(&[TokenKind::RParen])?))
        } else {
            None
        };
        self.expect(TokenKind::RParen)?;

        Ok(Expr::Foreach {
            source: Box::new(source),
            name,
            init: Box::new(init),
            update: Box::new(update),
            extract,
        })
    }

    /// Called after `if` or `elif`; consumes through the closing `end`.
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_until(&[TokenKind::Then])?;
        self.expect(TokenKind::Then)?;
        let then = self.parse_until(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;

        let otherwise = match self.kind() {
            TokenKind::Elif => {
                self.advance();
                Some(Box::new(self.parse_if()?))
            }
            TokenKind::Else => {
                self.advance();
                let otherwise = self.parse_until(&[TokenKind::End])?;
                self.expect(TokenKind::End)?;
                Some(Box::new(otherwise))
            }
            _ => {
                self.expect(TokenKind::End)?;
                None
            }
        };

        Ok(Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise,
        })
    }

    fn parse_try(&mut self) -> Result<Expr, ParseError> {
        let body = self.parse_term_run()?;
        let handler = if self.check(&TokenKind::Catch) {
            self.advance();
            Some(Box::new(self.parse_term_run()?))
        } else {
            None
        };
        Ok(Expr::Try {
            body: Box::new(body),
            handler,
        })
    }

    /// `def name: body;` or `def name(f; $v): body;`
    fn parse_def(&mut self) -> Result<FuncDef, ParseError> {
        self.expect(TokenKind::Def)?;
        let name = match self.kind() {
            TokenKind::Ident(_) => match self.take() {
                TokenKind::Ident(name) => name,
                _ => return Err(self.unexpected()),
            },
            _ => return Err(self.expected("a function name")),
        };

        let mut params = Vec::new();
        if self.check(&TokenKind::LParen) {
            self.advance();
            loop {
                let param = match self.kind() {
                    TokenKind::Ident(_) | TokenKind::Variable(_) => match self.take() {
                        TokenKind::Variable(name) => Param {
                            name,
                            by_value: true,
                        },
                        TokenKind::Ident(name) => Param {
                            name,
                            by_value: false,
                        },
                        _ => return Err(self.unexpected()),
                    },
                    _ => return Err(self.expected("a parameter name")),
                };
                params.push(param);
                if self.check(&TokenKind::Semicolon) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        self.expect(TokenKind::Colon)?;
        let body = self.parse_until(&[TokenKind::Semicolon])?;
        self.expect(TokenKind::Semicolon)?;

        Ok(FuncDef {
            name,
            params,
            body: Box::new(body),
        })
    }
}
