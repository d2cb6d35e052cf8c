//! Mustache - logic-less templates
//!
//! A parser and renderer for the Mustache template language with:
//! - HTML escaping by default, with a pluggable escape function
//! - Sections, inverted sections, partials and delimiter changes
//! - Struct-like context values through the [`Resolve`] adapter
//! - Lambdas and layout composition
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//!
//! let result = mustache::render(
//!     "Hello, {{name}}!",
//!     [json!({"name": "World"})],
//! ).unwrap();
//!
//! assert_eq!(result, "Hello, World!");
//! ```

// Public modules
pub mod context;
pub mod error;
pub mod html_escape;
pub mod partials;
pub mod renderer;
pub mod value;

pub use mustache_ast as ast;

pub use context::ContextStack;
pub use error::{MustacheError, Result};
pub use mustache_ast::{Delimiters, ParseError, ParseErrorKind, Tag, TagType};
pub use partials::{FileProvider, LoaderError, PartialProvider, StaticProvider};
pub use renderer::Renderer;
pub use value::{Lambda, Object, RenderFn, Resolve, Value};

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Escape function applied to `{{name}}` output
pub type EscapeFn = fn(&str) -> String;

/// Per-template rendering options
#[derive(Clone, Copy)]
pub struct RenderOptions {
    /// Render a variable that cannot be resolved as empty text instead of
    /// failing with [`MustacheError::MissingVariable`].
    pub allow_missing_variables: bool,
    pub escape: EscapeFn,
    /// Nesting limit for partials, reached only by runaway recursion.
    pub max_partial_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            allow_missing_variables: true,
            escape: html_escape::escape,
            max_partial_depth: 128,
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("allow_missing_variables", &self.allow_missing_variables)
            .field("max_partial_depth", &self.max_partial_depth)
            .finish_non_exhaustive()
    }
}

impl RenderOptions {
    pub fn with_allow_missing_variables(mut self, allow: bool) -> Self {
        self.allow_missing_variables = allow;
        self
    }

    pub fn with_escape(mut self, escape: EscapeFn) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }
}

/// Main template struct for parsing once and rendering multiple times.
///
/// A `Template` is immutable and can be rendered from several threads at
/// once; every render builds its own context stack.
#[derive(Clone)]
pub struct Template {
    ast: mustache_ast::Template,
    partials: Option<Arc<dyn PartialProvider>>,
    options: RenderOptions,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("ast", &self.ast)
            .field("has_partials", &self.partials.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Template {
    /// Parse a template source string.
    ///
    /// The template has no partial provider, so every `{{>name}}` renders as
    /// empty text; nothing is read from disk. Use
    /// [`Template::parse_with_partials`] or [`Template::with_partials`] to
    /// supply partials.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    ///
    /// let tmpl = mustache::Template::parse("Hello, {{name}}!").unwrap();
    /// let result = tmpl.render([json!({"name": "Alice"})]).unwrap();
    /// assert_eq!(result, "Hello, Alice!");
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            ast: mustache_ast::parse(source)?,
            partials: None,
            options: RenderOptions::default(),
        })
    }

    /// Parse a template whose partials come from `partials`
    ///
    /// # Example
    ///
    /// ```rust
    /// use mustache::StaticProvider;
    /// use serde_json::json;
    ///
    /// let partials = StaticProvider::new().with("user", "<b>{{name}}</b>");
    /// let tmpl = mustache::Template::parse_with_partials("{{>user}}", partials).unwrap();
    /// assert_eq!(tmpl.render([json!({"name": "Ann"})]).unwrap(), "<b>Ann</b>");
    /// ```
    pub fn parse_with_partials(
        source: &str,
        partials: impl PartialProvider + 'static,
    ) -> Result<Self> {
        Ok(Self::parse(source)?.with_partials(Arc::new(partials)))
    }

    /// Parse a template file. Partials are looked up next to the file.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_file_with_partials(path, FileProvider::new([dir]))
    }

    /// Parse a template file whose partials come from `partials`
    pub fn parse_file_with_partials(
        path: impl AsRef<Path>,
        partials: impl PartialProvider + 'static,
    ) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        Self::parse_with_partials(&source, partials)
    }

    /// Share an existing provider with this template
    pub fn with_partials(mut self, partials: Arc<dyn PartialProvider>) -> Self {
        self.partials = Some(partials);
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Render against `contexts`. The first context is searched first.
    pub fn render(&self, contexts: impl IntoIterator<Item = impl Into<Value>>) -> Result<String> {
        let mut buffer = Vec::new();
        self.render_to(&mut buffer, contexts)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Render into `out`, stopping at the first error
    pub fn render_to(
        &self,
        out: &mut dyn Write,
        contexts: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Result<()> {
        let mut stack = ContextStack::new(contexts.into_iter().map(Into::into));
        let mut renderer = Renderer::new(self.options, self.partials.as_deref());
        renderer.render(&self.ast, &mut stack, out)
    }

    /// Render this template, then render `layout` with the result available
    /// as `{{{content}}}` on top of the same contexts.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    ///
    /// let page = mustache::Template::parse("<h1>{{title}}</h1>").unwrap();
    /// let layout = mustache::Template::parse("<body>{{{content}}}</body>").unwrap();
    /// let result = page.render_in_layout(&layout, [json!({"title": "Hi"})]).unwrap();
    /// assert_eq!(result, "<body><h1>Hi</h1></body>");
    /// ```
    pub fn render_in_layout(
        &self,
        layout: &Template,
        contexts: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Result<String> {
        let mut buffer = Vec::new();
        self.render_in_layout_to(layout, &mut buffer, contexts)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn render_in_layout_to(
        &self,
        layout: &Template,
        out: &mut dyn Write,
        contexts: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Result<()> {
        let contexts: Vec<Value> = contexts.into_iter().map(Into::into).collect();
        let content = self.render(contexts.iter().cloned())?;

        let frame = Value::Map(HashMap::from([("content".to_string(), Value::String(content))]));
        layout.render_to(out, std::iter::once(frame).chain(contexts))
    }

    /// The tags of this template, as a tree
    pub fn tags(&self) -> Vec<Tag<'_>> {
        self.ast.tags()
    }

    /// Get a reference to the parsed template
    pub fn ast(&self) -> &mustache_ast::Template {
        &self.ast
    }
}

/// Convenience function: parse a template
pub fn parse(source: &str) -> Result<Template> {
    Template::parse(source)
}

/// Convenience function: parse and render in one call. Partials render as
/// empty text; see [`render_partials`].
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let result = mustache::render(
///     "{{#items}}[{{.}}]{{/items}}",
///     [json!({"items": [1, 2, 3]})],
/// ).unwrap();
///
/// assert_eq!(result, "[1][2][3]");
/// ```
pub fn render(source: &str, contexts: impl IntoIterator<Item = impl Into<Value>>) -> Result<String> {
    Template::parse(source)?.render(contexts)
}

/// Convenience function: parse and render into `out`
pub fn render_to(
    source: &str,
    out: &mut dyn Write,
    contexts: impl IntoIterator<Item = impl Into<Value>>,
) -> Result<()> {
    Template::parse(source)?.render_to(out, contexts)
}

/// Convenience function: parse and render with a partial provider
pub fn render_partials(
    source: &str,
    partials: impl PartialProvider + 'static,
    contexts: impl IntoIterator<Item = impl Into<Value>>,
) -> Result<String> {
    Template::parse_with_partials(source, partials)?.render(contexts)
}

/// Convenience function: render `source` inside `layout_source`
pub fn render_in_layout(
    source: &str,
    layout_source: &str,
    contexts: impl IntoIterator<Item = impl Into<Value>>,
) -> Result<String> {
    let layout = Template::parse(layout_source)?;
    Template::parse(source)?.render_in_layout(&layout, contexts)
}

/// Convenience function: render `source` inside `layout_source`, both
/// drawing partials from `partials`
pub fn render_in_layout_partials(
    source: &str,
    layout_source: &str,
    partials: impl PartialProvider + 'static,
    contexts: impl IntoIterator<Item = impl Into<Value>>,
) -> Result<String> {
    let partials: Arc<dyn PartialProvider> = Arc::new(partials);
    let layout = Template::parse(layout_source)?.with_partials(Arc::clone(&partials));
    Template::parse(source)?
        .with_partials(partials)
        .render_in_layout(&layout, contexts)
}

/// Convenience function: parse and render a template file
pub fn render_file(
    path: impl AsRef<Path>,
    contexts: impl IntoIterator<Item = impl Into<Value>>,
) -> Result<String> {
    Template::parse_file(path)?.render(contexts)
}

/// Convenience function: render a template file inside a layout file
pub fn render_file_in_layout(
    path: impl AsRef<Path>,
    layout_path: impl AsRef<Path>,
    contexts: impl IntoIterator<Item = impl Into<Value>>,
) -> Result<String> {
    let layout = Template::parse_file(layout_path)?;
    Template::parse_file(path)?.render_in_layout(&layout, contexts)
}
