//! Raw scanner over template source.
//!
//! The parser never tokenizes ahead: delimiters can be redefined in the
//! middle of a document, so it asks the scanner for "everything up to the
//! next occurrence of this marker" one tag at a time.

/// Cursor over the template source that keeps a 1-based line counter.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned at the start of `source`
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
        }
    }

    /// Scan forward for the next literal occurrence of `marker`.
    ///
    /// On a hit, returns everything from the cursor up to and including the
    /// marker and moves the cursor past it. On a miss, returns the rest of the
    /// input with `false` and leaves the cursor where it was; the caller
    /// decides whether that is fatal.
    pub fn read_until(&mut self, marker: &str) -> (&'a str, bool) {
        let rest = self.rest();
        match rest.find(marker) {
            Some(index) => {
                let consumed = &rest[..index + marker.len()];
                self.advance(consumed.len());
                (consumed, true)
            }
            None => (rest, false),
        }
    }

    /// Move the cursor forward by `len` bytes, counting the newlines crossed.
    pub fn advance(&mut self, len: usize) {
        let end = (self.pos + len).min(self.source.len());
        self.line += count_newlines(&self.source[self.pos..end]);
        self.pos = end;
    }

    /// Move the cursor to the end of input.
    pub fn finish(&mut self) {
        self.advance(self.source.len() - self.pos);
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Byte offset of the cursor.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current 1-based line.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    /// Whether the text between the previous newline (or start of input) and
    /// `offset` is only spaces and tabs. Returns that indentation if so.
    pub fn line_prefix_before(&self, offset: usize) -> Option<&'a str> {
        let head = &self.source[..offset];
        let line_start = head.rfind('\n').map_or(0, |i| i + 1);
        let prefix = &head[line_start..];
        prefix.bytes().all(is_inline_space).then_some(prefix)
    }

    /// Length of the trailing spaces/tabs plus line ending that follow the
    /// cursor, if the rest of the current line is blank. End of input counts
    /// as a line ending.
    pub fn blank_line_remainder(&self) -> Option<usize> {
        let rest = self.rest().as_bytes();
        let spaces = rest.iter().take_while(|b| is_inline_space(**b)).count();
        match &rest[spaces..] {
            [] => Some(spaces),
            [b'\n', ..] => Some(spaces + 1),
            [b'\r', b'\n', ..] => Some(spaces + 2),
            _ => None,
        }
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

fn is_inline_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
