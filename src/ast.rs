//! # Tine Filter Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the tine filter
//! language, a jq-style language where every program maps one JSON input to
//! zero or more outputs.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Filter nodes (access, construction, control flow)
//! - **[operators]** - Binary operators and their precedence
//! - **[udf]** - Local function definitions (`def`)
//!
//! ## Quick Start
//!
//! ```text
//! .users[] | select(.active) | {name, email}
//! ```
//!
//! This filter yields one small object per active user.
//!
//! ## Core Concepts
//!
//! ### Multiple outputs
//!
//! Filters produce sequences. `,` concatenates sequences, `|` feeds every
//! output of the left side into the right side, and constructions such as
//! `{a: (1,2)}` take the cross product of their parts.
//!
//! ### Values and paths
//!
//! Addressable filters (`.a`, `.[0]`, `.[]`, `..`, `select(f)`, ...) can also
//! report *where* their outputs live. Update-assignment uses those paths:
//!
//! ```text
//! .items[].price |= . * 2
//! ```
//!
//! ### Numeric indices
//!
//! - Non-negative indices count from the start of an array
//! - Negative indices count from the end (`.[-1]` is the last element)
//! - Out of range indices yield `null`
pub mod expressions;
pub mod operators;
pub mod tokens;
pub mod udf;

pub use expressions::{Expr, StringPart};
pub use operators::BinOp;
pub use tokens::{Token, TokenKind};
pub use udf::{FuncDef, Param};
