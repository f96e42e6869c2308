use crate::ast::{BinOp, Token, TokenKind};

/// Errors raised while scanning filter source. Offsets count characters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid escape sequence '\\{ch}' at offset {offset}")]
    InvalidEscape { ch: char, offset: usize },

    #[error("unterminated interpolation starting at offset {offset}")]
    UnterminatedInterpolation { offset: usize },

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unsupported operator '{op}' at offset {offset} (did you mean '==' or '!='?)")]
    UnsupportedOperator { op: String, offset: usize },

    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnterminatedString { offset }
            | LexError::InvalidEscape { offset, .. }
            | LexError::UnterminatedInterpolation { offset }
            | LexError::UnexpectedChar { offset, .. }
            | LexError::UnsupportedOperator { offset, .. }
            | LexError::InvalidNumber { offset, .. } => *offset,
        }
    }
}

/// Tokenize `text` starting at character `start`.
///
/// Returns the tokens (terminated by `Eof`) and the offset scanning stopped at.
pub fn tokenize(text: &str, start: usize) -> Result<(Vec<Token>, usize), LexError> {
    let mut lexer = Lexer::new(text);
    lexer.position = start;
    let mut tokens = Vec::new();
    lexer.scan(None, &mut tokens)?;
    tokens.push(Token::new(TokenKind::Eof, lexer.position));
    Ok((tokens, lexer.position))
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        self.scan(None, &mut tokens)?;
        tokens.push(Token::new(TokenKind::Eof, self.position));
        Ok(tokens)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while let Some(c) = self.current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Scan tokens until end of input, or, inside an interpolation opened at
    /// `interp`, until the `)` that balances it.
    fn scan(&mut self, interp: Option<usize>, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let mut depth = 0usize;

        loop {
            self.skip_whitespace();
            let start = self.position;
            let Some(ch) = self.current_char() else {
                return match interp {
                    Some(offset) => Err(LexError::UnterminatedInterpolation { offset }),
                    None => Ok(()),
                };
            };

            let kind = match ch {
                '"' => {
                    self.read_string(tokens)?;
                    continue;
                }
                '(' => {
                    depth += 1;
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    if interp.is_some() && depth == 0 {
                        return Ok(());
                    }
                    depth = depth.saturating_sub(1);
                    TokenKind::RParen
                }
                '.' => self.read_dot(),
                '$' => {
                    if self
                        .peek_char(1)
                        .is_some_and(|c| c.is_alphabetic() || c == '_')
                    {
                        self.advance();
                        TokenKind::Variable(self.read_identifier())
                    } else {
                        return Err(LexError::UnexpectedChar { ch, offset: start });
                    }
                }
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semicolon),
                ':' => self.single(TokenKind::Colon),
                '?' => self.single(TokenKind::Question),
                '@' => self.single(TokenKind::At),
                '|' => {
                    if self.peek_char(1) == Some('=') {
                        self.advance();
                        self.advance();
                        TokenKind::Update(None)
                    } else {
                        self.single(TokenKind::Pipe)
                    }
                }
                '+' => self.arithmetic(BinOp::Add),
                '-' => self.arithmetic(BinOp::Subtract),
                '*' => self.arithmetic(BinOp::Multiply),
                '%' => self.arithmetic(BinOp::Modulo),
                '/' => {
                    if self.peek_char(1) == Some('/') {
                        self.advance();
                        self.arithmetic(BinOp::Alternative)
                    } else {
                        self.arithmetic(BinOp::Divide)
                    }
                }
                '=' => {
                    if self.peek_char(1) == Some('=') {
                        self.advance();
                        self.advance();
                        TokenKind::Op(BinOp::Equal)
                    } else {
                        return Err(LexError::UnsupportedOperator {
                            op: "=".to_string(),
                            offset: start,
                        });
                    }
                }
                '!' => {
                    if self.peek_char(1) == Some('=') {
                        self.advance();
                        self.advance();
                        TokenKind::Op(BinOp::NotEqual)
                    } else {
                        return Err(LexError::UnsupportedOperator {
                            op: "!".to_string(),
                            offset: start,
                        });
                    }
                }
                '<' => self.comparison(BinOp::LessThan, BinOp::LessEqual),
                '>' => self.comparison(BinOp::GreaterThan, BinOp::GreaterEqual),
                c if c.is_ascii_digit() => self.read_number()?,
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_identifier();
                    TokenKind::keyword(&ident).unwrap_or(TokenKind::Ident(ident))
                }
                c => return Err(LexError::UnexpectedChar { ch: c, offset: start }),
            };

            tokens.push(Token::new(kind, start));
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// `op` or its compound `op=` form.
    fn arithmetic(&mut self, op: BinOp) -> TokenKind {
        self.advance();
        if self.current_char() == Some('=') {
            self.advance();
            TokenKind::Update(Some(op))
        } else {
            TokenKind::Op(op)
        }
    }

    fn comparison(&mut self, strict: BinOp, inclusive: BinOp) -> TokenKind {
        self.advance();
        if self.current_char() == Some('=') {
            self.advance();
            TokenKind::Op(inclusive)
        } else {
            TokenKind::Op(strict)
        }
    }

    fn read_dot(&mut self) -> TokenKind {
        self.advance();
        match self.current_char() {
            Some('.') => {
                self.advance();
                TokenKind::DotDot
            }
            Some('[') => {
                self.advance();
                TokenKind::DotSquare
            }
            Some(c) if c.is_alphabetic() || c == '_' => TokenKind::Field(self.read_identifier()),
            _ => TokenKind::Dot,
        }
    }

    fn read_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    number.extend(self.current_char());
                    self.advance();
                }
                while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
                    number.push(ch);
                    self.advance();
                }
            }
        }

        number
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| LexError::InvalidNumber {
                text: number,
                offset: start,
            })
    }

    /// Scan a quoted string, emitting `Quote` chunks around any `\(...)`.
    fn read_string(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let start = self.position;
        self.advance(); // opening quote

        let mut chunk = String::new();
        let mut chunk_start = start;

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    tokens.push(Token::new(TokenKind::Quote(chunk), chunk_start));
                    return Ok(());
                }
                '\\' => {
                    let escape_at = self.position;
                    self.advance();
                    match self.current_char() {
                        Some('n') => chunk.push('\n'),
                        Some('t') => chunk.push('\t'),
                        Some('r') => chunk.push('\r'),
                        Some('b') => chunk.push('\u{8}'),
                        Some('f') => chunk.push('\u{c}'),
                        Some('/') => chunk.push('/'),
                        Some('\\') => chunk.push('\\'),
                        Some('"') => chunk.push('"'),
                        Some('u') => {
                            let c = self.read_unicode_escape(escape_at)?;
                            chunk.push(c);
                            continue;
                        }
                        Some('(') => {
                            tokens.push(Token::new(
                                TokenKind::Quote(std::mem::take(&mut chunk)),
                                chunk_start,
                            ));
                            tokens.push(Token::new(TokenKind::InterpStart, escape_at));
                            self.advance();
                            self.scan(Some(escape_at), tokens)?;
                            tokens.push(Token::new(TokenKind::InterpEnd, self.position - 1));
                            chunk_start = self.position;
                            continue;
                        }
                        Some(other) => {
                            return Err(LexError::InvalidEscape {
                                ch: other,
                                offset: escape_at,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { offset: start }),
                    }
                    self.advance();
                }
                _ => {
                    chunk.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { offset: start })
    }

    /// Called with the cursor on the `u` of `\uXXXX`. Leaves the cursor after
    /// the escape, combining a following low surrogate when present.
    fn read_unicode_escape(&mut self, escape_at: usize) -> Result<char, LexError> {
        self.advance();
        let high = self.read_hex4(escape_at)?;

        if (0xD800..0xDC00).contains(&high)
            && self.current_char() == Some('\\')
            && self.peek_char(1) == Some('u')
        {
            let low_at = self.position;
            self.advance();
            self.advance();
            let low = self.read_hex4(low_at)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            // unpaired high surrogate followed by an unrelated escape
            self.position = low_at;
            return Ok(char::REPLACEMENT_CHARACTER);
        }

        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_hex4(&mut self, escape_at: usize) -> Result<u32, LexError> {
        let mut code = 0u32;
        for _ in 0..4 {
            match self.current_char().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    self.advance();
                }
                None => {
                    return Err(LexError::InvalidEscape {
                        ch: 'u',
                        offset: escape_at,
                    });
                }
            }
        }
        Ok(code)
    }
}

#[cfg(test)]
fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("if then elif else end and or"),
        vec![
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Elif,
            TokenKind::Else,
            TokenKind::End,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_pipe_and_update() {
    assert_eq!(
        kinds(".a |= . | .b += 1"),
        vec![
            TokenKind::Field("a".to_string()),
            TokenKind::Update(None),
            TokenKind::Dot,
            TokenKind::Pipe,
            TokenKind::Field("b".to_string()),
            TokenKind::Update(Some(BinOp::Add)),
            TokenKind::Number(1.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_alternative_forms() {
    assert_eq!(
        kinds("// //= /"),
        vec![
            TokenKind::Op(BinOp::Alternative),
            TokenKind::Update(Some(BinOp::Alternative)),
            TokenKind::Op(BinOp::Divide),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_interpolation_nests() {
    assert_eq!(
        kinds(r#""a\("b\(1)")c""#),
        vec![
            TokenKind::Quote("a".to_string()),
            TokenKind::InterpStart,
            TokenKind::Quote("b".to_string()),
            TokenKind::InterpStart,
            TokenKind::Number(1.0),
            TokenKind::InterpEnd,
            TokenKind::Quote(String::new()),
            TokenKind::InterpEnd,
            TokenKind::Quote("c".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_single_equals_rejected() {
    let err = Lexer::new(".a = 1").tokenize().unwrap_err();
    assert_eq!(
        err,
        LexError::UnsupportedOperator {
            op: "=".to_string(),
            offset: 3
        }
    );
}

#[test]
fn test_tokenize_reports_end_offset() {
    let (tokens, end) = tokenize("xx .a", 3).unwrap();
    assert_eq!(tokens[0], Token::new(TokenKind::Field("a".to_string()), 3));
    assert_eq!(end, 5);
}
