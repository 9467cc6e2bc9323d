//! Lookahead reader: a character cursor with checkpoints.
//!
//! Every recognizer reads through a [`Reader`]. Speculation is a [`Mark`] taken before
//! the attempt and a [`Reader::rewind`] after it fails, however many characters the
//! attempt examined. Marks are plain positions, so speculation nests freely.

use std::sync::Arc;

use miette::{NamedSource, SourceSpan};

use crate::errors::{to_source_span, ErrorKind, ErrorReporting, SourceContext, TorontoError};
use crate::syntax::Span;

/// A checkpoint in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

pub struct Reader {
    chars: Vec<(usize, char)>,
    cursor: usize,
    byte_len: usize,
    source: Arc<NamedSource<String>>,
}

impl Reader {
    pub fn new(source: &SourceContext) -> Self {
        Self {
            chars: source.content.char_indices().collect(),
            cursor: 0,
            byte_len: source.content.len(),
            source: source.to_named_source(),
        }
    }

    /// Returns the next character and advances, or `None` at end of input.
    pub fn next_char(&mut self) -> Option<char> {
        let (_, ch) = *self.chars.get(self.cursor)?;
        self.cursor += 1;
        Some(ch)
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).map(|(_, ch)| *ch)
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.cursor)
    }

    /// Undoes everything read since `mark`.
    pub fn rewind(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.chars.len());
        self.cursor = mark.0;
    }

    /// Number of characters consumed since `mark`.
    pub fn consumed_since(&self, mark: Mark) -> usize {
        self.cursor.saturating_sub(mark.0)
    }

    /// True if the input at the cursor starts with `literal`. Never moves the cursor.
    pub fn at(&self, literal: &str) -> bool {
        let mut rest = self.chars[self.cursor..].iter().map(|(_, ch)| *ch);
        literal.chars().all(|expected| rest.next() == Some(expected))
    }

    /// Consumes `literal` if the input starts with it; otherwise consumes nothing.
    pub fn eat(&mut self, literal: &str) -> bool {
        if !self.at(literal) {
            return false;
        }
        self.cursor += literal.chars().count();
        true
    }

    /// Byte offset of the cursor in the source text.
    pub fn offset(&self) -> usize {
        self.offset_of(self.mark())
    }

    pub fn offset_of(&self, mark: Mark) -> usize {
        self.chars
            .get(mark.0)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.byte_len)
    }

    /// Span from `mark` to the cursor.
    pub fn span_from(&self, mark: Mark) -> Span {
        Span {
            start: self.offset_of(mark),
            end: self.offset(),
        }
    }

    /// The rest of the current line, for diagnostics.
    pub fn rest_of_line(&self) -> String {
        self.chars[self.cursor..]
            .iter()
            .map(|(_, ch)| *ch)
            .take_while(|ch| *ch != '\n')
            .collect()
    }
}

impl ErrorReporting for Reader {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> TorontoError {
        let mut error = TorontoError::unlocated(kind, span, "lex");
        error.source_info.source = Some(Arc::clone(&self.source));
        error
    }
}

impl Reader {
    /// Reports `kind` with a span running from `mark` to the cursor.
    pub fn report_from(&self, kind: ErrorKind, mark: Mark) -> TorontoError {
        self.report(kind, to_source_span(self.span_from(mark)))
    }
}
