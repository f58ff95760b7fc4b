//! Lucene query string parsing
//!
//! Supports syntax like:
//! - `title:rust AND tags:(tutorial OR guide)`
//! - `status:published AND created_at:[2024-01-01 TO 2024-12-31]`
//! - `content:"exact phrase"~2`
//! - `title:prog* OR author:john~`
//! - `(a b)^2 AND NOT draft AND name:/joh?n/`
//!
//! # Grammar
//!
//! ```text
//! expr      := or_expr
//! or_expr   := and_expr (OR and_expr)*
//! and_expr  := impl_expr (AND impl_expr)*
//! impl_expr := unary (unary)*              -- 2+ operands: unknown operation
//! unary     := (NOT | '+' | '-') unary | postfix
//! postfix   := atom (TILDE num? | CARET num)*
//! atom      := TERM ':' atom_body | atom_body
//! atom_body := '(' expr ')' | range | PHRASE | REGEX | TERM | '*'
//! range     := ('[' | '{') bound TO bound (']' | '}')
//! ```
//!
//! Whitespace is preserved as node trivia: reprinting a parsed tree with
//! `to_string()` gives back the original input.

pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::QueryParser;

use crate::error::Result;
use crate::tree::Node;

/// Parse a Lucene query string into a tree
pub fn parse(input: &str) -> Result<Node> {
    tracing::debug!(query = input, "parsing query string");
    QueryParser::new(input)?.parse()
}
