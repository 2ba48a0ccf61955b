//! JavaScript front end shared by the linter and the transpiler.
//!
//! Sources are lexed into tokens that keep their leading trivia, nested
//! into a bracket tree, and printed back. There is no full AST: lint rules
//! and transform passes work on the bracket tree with the helpers in
//! [`syntax`].

pub mod lexer;
pub mod printer;
pub mod syntax;
pub mod token;
pub mod tree;

pub use printer::{print, print_nodes, print_trimmed};
pub use token::{
    Fragment, Group, JsxAttr, JsxAttrValue, JsxChild, JsxElement, Node, Template, Token, TokenKind,
};

use crate::error::Result;

/// Parse a source text into a fragment.
pub fn parse(source: &str) -> Result<Fragment> {
    lexer::Lexer::new(source).tokenize()
}

/// Parse generated code and return its nodes.
///
/// Passes build replacement code as text and splice the parsed nodes back
/// into the tree.
pub fn parse_nodes(source: &str) -> Result<Vec<Node>> {
    Ok(parse(source)?.nodes)
}
