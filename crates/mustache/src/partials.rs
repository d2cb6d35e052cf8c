//! Partial template providers.
//!
//! A provider maps a partial name to a parsed template. Unknown names are not
//! an error: they resolve to an empty template so that `{{>missing}}` renders
//! nothing. Errors are reserved for faults inside the provider itself.

use mustache_ast::Template;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Opaque error returned by a [`PartialProvider`]
pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// Source of partial templates, shared by concurrent renders.
pub trait PartialProvider: Send + Sync {
    /// Fetch the partial called `name`.
    fn get(&self, name: &str) -> Result<Template, LoaderError>;
}

/// Rejected partial name for a file-backed provider
#[derive(Debug, Error)]
#[error("invalid partial name '{0}': must be a relative path without '..'")]
pub struct InvalidPartialName(pub String);

/// In-memory partials, keyed by name and parsed on lookup
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    partials: HashMap<String, String>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a partial
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), source.into());
        self
    }

    /// Builder form of [`StaticProvider::insert`]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticProvider {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            partials: iter
                .into_iter()
                .map(|(name, source)| (name.into(), source.into()))
                .collect(),
        }
    }
}

impl PartialProvider for StaticProvider {
    fn get(&self, name: &str) -> Result<Template, LoaderError> {
        match self.partials.get(name) {
            Some(source) => Ok(mustache_ast::parse(source)?),
            None => Ok(Template::empty()),
        }
    }
}

/// Partials loaded from disk.
///
/// For a partial `NAME`, every directory in `paths` is searched in order, and
/// within each directory every extension in `extensions`; the first existing
/// `DIR/NAME+EXT` wins.
#[derive(Debug, Clone)]
pub struct FileProvider {
    paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl Default for FileProvider {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from(".")],
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["", ".mustache", ".stache"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl FileProvider {
    /// Search the given directories with the default extensions
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            extensions: default_extensions(),
        }
    }

    /// Replace the list of extensions tried for each name
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        self.paths.iter().find_map(|dir| {
            self.extensions
                .iter()
                .map(|ext| dir.join(format!("{name}{ext}")))
                .find(|path| path.is_file())
        })
    }
}

impl PartialProvider for FileProvider {
    fn get(&self, name: &str) -> Result<Template, LoaderError> {
        validate_partial_name(name)?;

        let Some(path) = self.find(name) else {
            tracing::debug!(partial = name, "partial not found on disk");
            return Ok(Template::empty());
        };

        let source = fs::read_to_string(&path)?;
        tracing::debug!(partial = name, path = %path.display(), "loaded partial");
        Ok(mustache_ast::parse(&source)?)
    }
}

/// Partial names are relative paths that stay inside the search directory
fn validate_partial_name(name: &str) -> Result<(), InvalidPartialName> {
    let escapes = Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(InvalidPartialName(name.to_string()));
    }
    Ok(())
}
