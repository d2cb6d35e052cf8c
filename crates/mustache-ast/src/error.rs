//! Parse errors for Mustache templates.

use thiserror::Error;

/// What went wrong while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty tag")]
    EmptyTag,

    #[error("unmatched open tag")]
    UnmatchedOpenTag,

    #[error("unmatched close tag")]
    UnmatchedCloseTag,

    #[error("interleaved closing tag: {0}")]
    InterleavedClosingTag(String),

    #[error("Section {0} has no closing tag")]
    UnclosedSection(String),

    #[error("Invalid meta tag")]
    InvalidMetaTag,
}

/// A structural template error, tagged with the 1-based line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    /// The message without the line prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}
