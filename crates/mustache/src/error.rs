//! Error types for the Mustache renderer.

use thiserror::Error;

pub use mustache_ast::{ParseError, ParseErrorKind};

use crate::partials::LoaderError;

/// All errors that can occur while parsing or rendering a template
#[derive(Error, Debug)]
pub enum MustacheError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("missing variable \"{name}\"")]
    MissingVariable { name: String },

    #[error("failed to load partial '{name}': {source}")]
    Partial {
        name: String,
        #[source]
        source: LoaderError,
    },

    #[error("partial '{name}' exceeds maximum nesting depth of {limit}")]
    PartialDepth { name: String, limit: usize },

    #[error("lambda error: {message}")]
    Lambda { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MustacheError {
    /// Build a lambda error from any message
    pub fn lambda(message: impl Into<String>) -> Self {
        MustacheError::Lambda {
            message: message.into(),
        }
    }
}

/// Result type alias for Mustache operations
pub type Result<T> = std::result::Result<T, MustacheError>;
