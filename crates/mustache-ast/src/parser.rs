use crate::ast::{
    Delimiters, Node, PartialNode, SectionNode, Template, TextNode, VariableNode,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Scanner;

/// Recursive descent parser for Mustache templates.
///
/// The parser owns the lexical state (cursor, line, current delimiters) and
/// threads it through every recursive section parse.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    delimiters: Delimiters,
}

/// A tag body, classified by its leading sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawTag<'a> {
    Comment,
    SectionOpen { name: &'a str, inverted: bool },
    SectionClose { name: &'a str },
    Partial { name: &'a str },
    SetDelimiters { open: &'a str, close: &'a str },
    Variable { name: &'a str, escape: bool },
}

impl RawTag<'_> {
    /// Interpolation tags never qualify for standalone-line elision.
    fn standalone_candidate(&self) -> bool {
        !matches!(self, RawTag::Variable { .. })
    }
}

/// The section whose body is being parsed.
struct OpenSection<'a> {
    name: &'a str,
    start_line: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser using the default `{{ }}` delimiters
    pub fn new(source: &'a str) -> Self {
        Self::with_delimiters(source, Delimiters::default())
    }

    /// Create a parser starting with the given delimiters
    pub fn with_delimiters(source: &'a str, delimiters: Delimiters) -> Self {
        Self {
            scanner: Scanner::new(source),
            delimiters,
        }
    }

    /// Parse the whole source into a template
    pub fn parse(mut self) -> Result<Template, ParseError> {
        let (nodes, _) = self.parse_nodes(None)?;
        Ok(Template::new(self.scanner.source(), nodes))
    }

    /// Parse nodes until end of input (top level) or until the close tag of
    /// `section`. Returns the nodes and the byte offset where the terminating
    /// close tag starts.
    fn parse_nodes(
        &mut self,
        section: Option<&OpenSection<'_>>,
    ) -> Result<(Vec<Node>, usize), ParseError> {
        let mut nodes = Vec::new();

        loop {
            let (text, found) = self.scanner.read_until(&self.delimiters.open);
            if !found {
                if let Some(open) = section {
                    return Err(ParseError::new(
                        open.start_line,
                        ParseErrorKind::UnclosedSection(open.name.to_string()),
                    ));
                }
                push_text(&mut nodes, text);
                self.scanner.finish();
                return Ok((nodes, self.scanner.pos()));
            }

            let tag_start = self.scanner.pos() - self.delimiters.open.len();
            let tag_line = self.scanner.line();
            let mut text = &text[..text.len() - self.delimiters.open.len()];
            let tag = self.read_tag()?;

            let indent = if tag.standalone_candidate() {
                self.consume_standalone(tag_start)
            } else {
                None
            };
            if let Some(indent) = indent {
                text = text.strip_suffix(indent).unwrap_or(text);
            }
            push_text(&mut nodes, text);

            match tag {
                RawTag::Comment => {}
                RawTag::SectionOpen { name, inverted } => {
                    nodes.push(Node::Section(self.parse_section(name, inverted, tag_line)?));
                }
                RawTag::SectionClose { name } => {
                    return match section {
                        Some(open) if open.name == name => Ok((nodes, tag_start)),
                        Some(_) => Err(self.error(ParseErrorKind::InterleavedClosingTag(
                            name.to_string(),
                        ))),
                        None => Err(self.error(ParseErrorKind::UnmatchedCloseTag)),
                    };
                }
                RawTag::Partial { name } => nodes.push(Node::Partial(PartialNode {
                    name: name.to_string(),
                    indent: indent.unwrap_or_default().to_string(),
                    line: tag_line,
                })),
                RawTag::SetDelimiters { open, close } => {
                    self.delimiters = Delimiters::new(open, close);
                }
                RawTag::Variable { name, escape } => nodes.push(Node::Variable(VariableNode {
                    name: name.to_string(),
                    escape,
                    line: tag_line,
                })),
            }
        }
    }

    fn parse_section(
        &mut self,
        name: &str,
        inverted: bool,
        start_line: usize,
    ) -> Result<SectionNode, ParseError> {
        let delimiters = self.delimiters.clone();
        let body_start = self.scanner.pos();

        let open = OpenSection { name, start_line };
        let (children, body_end) = self.parse_nodes(Some(&open))?;

        Ok(SectionNode {
            name: name.to_string(),
            inverted,
            start_line,
            children,
            raw_body: self.scanner.source()[body_start..body_end].to_string(),
            delimiters,
        })
    }

    /// Read the tag body after an open delimiter, up to and including the
    /// close delimiter, and classify it.
    fn read_tag(&mut self) -> Result<RawTag<'a>, ParseError> {
        let (raw, found) = if self.scanner.peek() == Some(b'{') {
            let marker = format!("}}{}", self.delimiters.close);
            self.scanner.read_until(&marker)
        } else {
            self.scanner.read_until(&self.delimiters.close)
        };
        if !found {
            return Err(self.error(ParseErrorKind::UnmatchedOpenTag));
        }

        let body = raw[..raw.len() - self.delimiters.close.len()].trim();
        self.classify(body)
    }

    fn classify(&self, body: &'a str) -> Result<RawTag<'a>, ParseError> {
        let Some(&sigil) = body.as_bytes().first() else {
            return Err(self.error(ParseErrorKind::EmptyTag));
        };
        // Sigils are ASCII; a multi-byte first char is always a plain name.
        let rest = body.get(1..).unwrap_or_default();

        let tag = match sigil {
            b'!' => RawTag::Comment,
            b'#' | b'^' => RawTag::SectionOpen {
                name: self.tag_name(rest)?,
                inverted: sigil == b'^',
            },
            b'/' => RawTag::SectionClose {
                name: self.tag_name(rest)?,
            },
            b'>' => RawTag::Partial {
                name: self.tag_name(rest)?,
            },
            b'=' => self.classify_delimiters(rest)?,
            b'{' => RawTag::Variable {
                name: self.tag_name(rest.strip_suffix('}').unwrap_or(rest))?,
                escape: false,
            },
            b'&' => RawTag::Variable {
                name: self.tag_name(rest)?,
                escape: false,
            },
            _ => RawTag::Variable {
                name: body,
                escape: true,
            },
        };
        Ok(tag)
    }

    /// `rest` is the tag body after the leading `=`.
    fn classify_delimiters(&self, rest: &'a str) -> Result<RawTag<'a>, ParseError> {
        let inner = rest
            .strip_suffix('=')
            .ok_or_else(|| self.error(ParseErrorKind::InvalidMetaTag))?;

        let mut parts = inner.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(open), Some(close), None) => Ok(RawTag::SetDelimiters { open, close }),
            _ => Err(self.error(ParseErrorKind::InvalidMetaTag)),
        }
    }

    fn tag_name(&self, text: &'a str) -> Result<&'a str, ParseError> {
        let name = text.trim();
        if name.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyTag));
        }
        Ok(name)
    }

    /// If the tag that started at `tag_start` sits alone on its line, consume
    /// the rest of that line (trailing blanks and the line ending) and return
    /// the indentation in front of the tag.
    fn consume_standalone(&mut self, tag_start: usize) -> Option<&'a str> {
        let indent = self.scanner.line_prefix_before(tag_start)?;
        let remainder = self.scanner.blank_line_remainder()?;
        self.scanner.advance(remainder);
        Some(indent)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.scanner.line(), kind)
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::Text(TextNode {
            text: text.to_string(),
        }));
    }
}
