use std::fmt;

use crate::error::ParseError;

pub const DEFAULT_OPEN: &str = "{{";
pub const DEFAULT_CLOSE: &str = "}}";

/// An open/close tag marker pair, e.g. `{{` / `}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN, DEFAULT_CLOSE)
    }
}

/// A parsed template. Immutable once built.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn new(source: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            source: source.into(),
            nodes,
        }
    }

    /// A template with no content. Used for partials that cannot be found.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The source text this template was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The tags of this template, as a tree. Text and comments are skipped.
    pub fn tags(&self) -> Vec<Tag<'_>> {
        extract_tags(&self.nodes)
    }

    /// Re-parse this template with `indent` prepended to every source line.
    ///
    /// This is how a standalone partial tag passes its indentation on to the
    /// partial it includes.
    pub fn indented(&self, indent: &str) -> Result<Template, ParseError> {
        if indent.is_empty() {
            return Ok(self.clone());
        }
        crate::parse(&indent_lines(&self.source, indent))
    }
}

fn indent_lines(source: &str, indent: &str) -> String {
    let mut output = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        output.push_str(indent);
        output.push_str(line);
    }
    output
}

/// All node kinds a template is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(TextNode),
    Variable(VariableNode),
    Section(SectionNode),
    Partial(PartialNode),
}

/// Literal output.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
}

/// `{{name}}`, or `{{{name}}}` / `{{&name}}` with `escape == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode {
    pub name: String,
    pub escape: bool,
    pub line: usize,
}

/// `{{#name}}...{{/name}}`, or `{{^name}}...{{/name}}` when inverted.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub name: String,
    pub inverted: bool,
    pub start_line: usize,
    pub children: Vec<Node>,
    /// The unparsed body between the open and close tags.
    pub raw_body: String,
    /// Delimiters in effect when the section was opened.
    pub delimiters: Delimiters,
}

/// `{{>name}}`. Resolved by a partial provider at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialNode {
    pub name: String,
    /// Leading whitespace of a standalone partial tag, empty otherwise.
    pub indent: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Variable,
    Section,
    InvertedSection,
    Partial,
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagType::Variable => "Variable",
            TagType::Section => "Section",
            TagType::InvertedSection => "InvertedSection",
            TagType::Partial => "Partial",
        };
        f.write_str(name)
    }
}

/// A view of one tag in a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub kind: TagType,
    pub name: &'a str,
    /// Child tags; only sections have any.
    pub tags: Vec<Tag<'a>>,
}

fn extract_tags(nodes: &[Node]) -> Vec<Tag<'_>> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Text(_) => None,
            Node::Variable(v) => Some(Tag {
                kind: TagType::Variable,
                name: &v.name,
                tags: Vec::new(),
            }),
            Node::Section(s) => Some(Tag {
                kind: if s.inverted {
                    TagType::InvertedSection
                } else {
                    TagType::Section
                },
                name: &s.name,
                tags: extract_tags(&s.children),
            }),
            Node::Partial(p) => Some(Tag {
                kind: TagType::Partial,
                name: &p.name,
                tags: Vec::new(),
            }),
        })
        .collect()
}
