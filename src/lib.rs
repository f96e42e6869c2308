pub mod ast;
pub mod builtins;
#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod evaluator;
pub mod filter;
pub mod format;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod value;

pub use ast::{BinOp, Expr, Token, TokenKind};
pub use env::Env;
pub use evaluator::EvalError;
pub use filter::{Filter, Outputs, compile};
pub use lexer::{LexError, Lexer};
pub use output::{Printer, render, to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use path::{Path, PathSegment};
pub use value::{Map, Value};
