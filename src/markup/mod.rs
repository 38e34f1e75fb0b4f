//! Parser for HTML fragments
//!
//! Compiled templates are handed to the document host as plain markup. The
//! in-memory host turns that markup into nodes with this parser: a two-mode
//! `logos` lexer feeds a `chumsky` grammar that builds a [`Node`] tree.

pub mod ast;
pub mod entities;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::parse_fragment;
pub use lexer::lex;
