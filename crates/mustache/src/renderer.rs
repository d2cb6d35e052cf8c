//! Renderer for evaluating a parsed Mustache template against a context stack.

use crate::context::ContextStack;
use crate::error::{MustacheError, Result};
use crate::partials::PartialProvider;
use crate::value::{Lambda, Value};
use crate::RenderOptions;
use mustache_ast::{Delimiters, Node, PartialNode, SectionNode, Template, VariableNode};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// Renderer for one render call.
///
/// Holds the partials resolved so far, keyed by name and indentation, so a
/// recursive partial is fetched and parsed once per call.
pub struct Renderer<'a> {
    options: RenderOptions,
    partials: Option<&'a dyn PartialProvider>,
    resolved: HashMap<(String, String), Arc<Template>>,
    depth: usize,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer. Without a provider every partial renders empty.
    pub fn new(options: RenderOptions, partials: Option<&'a dyn PartialProvider>) -> Self {
        Self {
            options,
            partials,
            resolved: HashMap::new(),
            depth: 0,
        }
    }

    /// Render `template` into `out`. Output already written stays written if
    /// a later node fails.
    pub fn render(
        &mut self,
        template: &Template,
        stack: &mut ContextStack,
        out: &mut dyn Write,
    ) -> Result<()> {
        self.render_nodes(template.nodes(), stack, out)
    }

    fn render_nodes(
        &mut self,
        nodes: &[Node],
        stack: &mut ContextStack,
        out: &mut dyn Write,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(n) => out.write_all(n.text.as_bytes())?,
                Node::Variable(n) => self.render_variable(n, stack, out)?,
                Node::Section(n) => self.render_section(n, stack, out)?,
                Node::Partial(n) => self.render_partial(n, stack, out)?,
            }
        }
        Ok(())
    }

    fn render_to_string(&mut self, nodes: &[Node], stack: &mut ContextStack) -> Result<String> {
        let mut buffer = Vec::new();
        self.render_nodes(nodes, stack, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn render_variable(
        &mut self,
        node: &VariableNode,
        stack: &mut ContextStack,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Some(value) = stack.lookup(&node.name) else {
            tracing::debug!(name = %node.name, line = node.line, "missing variable");
            if self.options.allow_missing_variables {
                return Ok(());
            }
            return Err(MustacheError::MissingVariable {
                name: node.name.clone(),
            });
        };

        let text = match &value {
            Value::Lambda(lambda) => {
                tracing::trace!(name = %node.name, "invoking lambda from variable tag");
                let source = self.invoke_lambda(lambda, "", &Delimiters::default(), stack)?;
                let expansion = mustache_ast::parse(&source)?;
                self.render_to_string(expansion.nodes(), stack)?
            }
            other => other.stringify(),
        };

        if node.escape {
            out.write_all((self.options.escape)(&text).as_bytes())?;
        } else {
            out.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    fn render_section(
        &mut self,
        node: &SectionNode,
        stack: &mut ContextStack,
        out: &mut dyn Write,
    ) -> Result<()> {
        // A missing section name is falsey, never an error.
        let value = stack.lookup(&node.name).unwrap_or_default();

        if node.inverted {
            if value.is_empty() {
                self.render_nodes(&node.children, stack, out)?;
            }
            return Ok(());
        }

        if value.is_empty() {
            return Ok(());
        }

        match value {
            Value::Array(items) => {
                for item in items {
                    self.render_in_frame(&node.children, item, stack, out)?;
                }
                Ok(())
            }
            Value::Map(_) | Value::Struct(_) => self.render_in_frame(&node.children, value, stack, out),
            Value::Lambda(lambda) => {
                tracing::trace!(name = %node.name, "invoking lambda from section");
                let text = self.invoke_lambda(&lambda, &node.raw_body, &node.delimiters, stack)?;
                let expansion = mustache_ast::parse_with_delimiters(&text, &node.delimiters)?;
                self.render_nodes(expansion.nodes(), stack, out)
            }
            _ => {
                let top = stack.top();
                self.render_in_frame(&node.children, top, stack, out)
            }
        }
    }

    fn render_in_frame(
        &mut self,
        nodes: &[Node],
        frame: Value,
        stack: &mut ContextStack,
        out: &mut dyn Write,
    ) -> Result<()> {
        stack.push(frame);
        let result = self.render_nodes(nodes, stack, out);
        stack.pop();
        result
    }

    /// Call `lambda` with `text`, handing it a callback that renders against
    /// the current stack using `delimiters`.
    fn invoke_lambda(
        &mut self,
        lambda: &Lambda,
        text: &str,
        delimiters: &Delimiters,
        stack: &mut ContextStack,
    ) -> Result<String> {
        let mut render = |source: &str| -> Result<String> {
            let template = mustache_ast::parse_with_delimiters(source, delimiters)?;
            self.render_to_string(template.nodes(), stack)
        };
        lambda.invoke(text, &mut render)
    }

    fn render_partial(
        &mut self,
        node: &PartialNode,
        stack: &mut ContextStack,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Some(provider) = self.partials else {
            return Ok(());
        };

        if self.depth >= self.options.max_partial_depth {
            return Err(MustacheError::PartialDepth {
                name: node.name.clone(),
                limit: self.options.max_partial_depth,
            });
        }

        let partial = self.resolve_partial(provider, node)?;

        self.depth += 1;
        let result = self.render_nodes(partial.nodes(), stack, out);
        self.depth -= 1;
        result
    }

    fn resolve_partial(
        &mut self,
        provider: &dyn PartialProvider,
        node: &PartialNode,
    ) -> Result<Arc<Template>> {
        let key = (node.name.clone(), node.indent.clone());
        if let Some(partial) = self.resolved.get(&key) {
            return Ok(Arc::clone(partial));
        }

        let template = provider.get(&node.name).map_err(|source| {
            tracing::debug!(partial = %node.name, error = %source, "partial provider failed");
            MustacheError::Partial {
                name: node.name.clone(),
                source,
            }
        })?;
        let partial = Arc::new(template.indented(&node.indent)?);
        tracing::debug!(partial = %node.name, indent = node.indent.len(), "resolved partial");

        self.resolved.insert(key, Arc::clone(&partial));
        Ok(partial)
    }
}
