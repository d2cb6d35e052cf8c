//! Parser and AST for Mustache templates.
//!
//! Parsing is a single pass: the scanner hands the parser raw text up to the
//! next delimiter, and the parser builds a tree of [`Node`]s while tracking
//! `{{=<% %>=}}` delimiter changes and standalone-line elision.

pub mod ast;
pub mod error;
mod lexer;
mod parser;

pub use ast::{
    Delimiters, Node, PartialNode, SectionNode, Tag, TagType, Template, TextNode, VariableNode,
    DEFAULT_CLOSE, DEFAULT_OPEN,
};
pub use error::{ParseError, ParseErrorKind};
pub use parser::Parser;

/// Parse template source using the default `{{ }}` delimiters.
pub fn parse(source: &str) -> Result<Template, ParseError> {
    parse_with_delimiters(source, &Delimiters::default())
}

/// Parse template source starting with the given delimiters.
///
/// Lambda sections re-parse their expansion with the delimiters that were in
/// effect where the section was opened.
pub fn parse_with_delimiters(
    source: &str,
    delimiters: &Delimiters,
) -> Result<Template, ParseError> {
    let result = Parser::with_delimiters(source, delimiters.clone()).parse();
    match &result {
        Ok(template) => tracing::trace!(nodes = template.nodes().len(), "parsed template"),
        Err(err) => tracing::debug!(line = err.line, error = %err.kind, "template parse failed"),
    }
    result
}
