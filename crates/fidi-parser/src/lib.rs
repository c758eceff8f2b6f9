//! # fidi Parser
//!
//! Lexer and LALR(1) parser for the fidi graph language. The parser does
//! not build a graph itself: it hands every completed statement to an
//! [`Actions`] implementation, which decides what a node or edge means.
//!
//! ## Usage
//!
//! ```
//! # use fidi_core::error::Diagnostic;
//! # use fidi_parser::{Actions, Attribute, EdgeDecl, NodeDecl, ParserConfig, SyntaxError, parse};
//! #[derive(Default)]
//! struct Count {
//!     nodes: usize,
//!     edges: usize,
//! }
//!
//! impl Actions for Count {
//!     fn declare_node(&mut self, _: NodeDecl) {
//!         self.nodes += 1;
//!     }
//!     fn declare_edge(&mut self, _: EdgeDecl) {
//!         self.edges += 1;
//!     }
//!     fn set_attribute(&mut self, _: Attribute) {}
//!     fn report(&mut self, _: Diagnostic) {}
//! }
//!
//! fn main() -> Result<(), SyntaxError> {
//!     let mut count = Count::default();
//!     parse(".web []; .db []; web -> db;", &mut count, ParserConfig::default())?;
//!     assert_eq!((count.nodes, count.edges), (2, 1));
//!     Ok(())
//! }
//! ```

mod actions;
mod error;
pub mod grammar;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod symbol;
mod tokens;

pub use actions::{Actions, Attribute, EdgeDecl, NodeDecl};
pub use error::SyntaxError;
pub use lexer::{Lexer, tokenize};
pub use parser::{Parser, ParserConfig};
pub use tokens::{LexError, Token, TokenKind};

use fidi_core::Location;

/// Parse `source` from the beginning of a file.
///
/// # Errors
///
/// Returns [`SyntaxError`] when the input cannot be recovered from.
pub fn parse(
    source: &str,
    actions: &mut impl Actions,
    config: ParserConfig,
) -> Result<(), SyntaxError> {
    parse_at(source, Location::default(), actions, config)
}

/// Parse `source` as text that starts at `origin` in an enclosing file, so
/// diagnostics point into that file.
///
/// # Errors
///
/// Returns [`SyntaxError`] when the input cannot be recovered from.
pub fn parse_at(
    source: &str,
    origin: Location,
    actions: &mut impl Actions,
    config: ParserConfig,
) -> Result<(), SyntaxError> {
    Parser::new(Lexer::with_origin(source, origin), config).parse(actions)
}
