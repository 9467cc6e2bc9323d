//! # Tokenizer Chain
//!
//! A [`Chain`] is an ordered list of [`Recognizer`]s. At each position the chain tries
//! its recognizers in order; the first one that matches consumes input and produces a
//! [`Token`]. A recognizer that does not match may read as far as it likes: the chain
//! rewinds the reader to where the attempt started before trying the next one.
//!
//! Recognizers that contain other tokens (brackets, prefixes) call back into the whole
//! chain, so the grammar is open: adding a recognizer to the chain makes it available
//! inside every bracket as well.
//!
//! ## Standard chain
//!
//! | Recognizer | Surface | Tree |
//! |------------|---------|------|
//! | `comment`  | `;` or `//` to end of line | skipped |
//! | `list`     | `( ... )` | `(...)` |
//! | `vector`   | `[ ... ]` | `(vector ...)` |
//! | `record`   | `{ ... }` | `(record ...)` |
//! | `escape`   | `< ... >` | `(escape ...)` |
//! | `text`     | `'...'`, `"..."`, `` `...` `` | atom, delimiters kept |
//! | `preserve` | `%X` | `(preserve X)` |
//! | `eval`     | `$X` | `(eval X)` |
//! | `spread`   | `...X` | `(spread X)` |
//! | `bare`     | anything else | atom |

use std::fmt;

use crate::errors::{ErrorKind, TorontoError};
use crate::syntax::reader::Reader;
use crate::syntax::{Tree, ESCAPE, EVAL, PRESERVE, RECORD, SPREAD, VECTOR};

// ============================================================================
// CORE TYPES
// ============================================================================

/// What a matching recognizer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Node(Tree),
    /// Input was consumed but nothing was read: whitespace, comments, end of input.
    Skip,
}

/// Tells a recognizer that the enclosing bracket's close delimiter starts at the cursor.
pub type Boundary<'a> = &'a dyn Fn(&Reader) -> bool;

pub trait Recognizer: Send + Sync {
    /// Name used to find the recognizer in a chain.
    fn name(&self) -> &str;

    /// Attempts to read one token at the cursor.
    ///
    /// `Ok(None)` means "no match". The cursor position after a non-match does not
    /// matter; the chain rewinds it.
    fn recognize(
        &self,
        reader: &mut Reader,
        chain: &Chain,
        boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError>;
}

// ============================================================================
// CHAIN
// ============================================================================

#[derive(Default)]
pub struct Chain {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl Chain {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The chain that reads the standard surface syntax.
    pub fn standard() -> Self {
        Chain::empty()
            .with(Comment::standard())
            .with(Bracketed::list("list", "(", ")"))
            .with(Bracketed::tagged("vector", "[", "]", VECTOR))
            .with(Bracketed::tagged("record", "{", "}", RECORD))
            .with(Bracketed::new("escape", "<", ">", escape_transform).guarded(escape_guard))
            .with(Delimited::standard())
            .with(Prefixed::new("preserve", "%", PRESERVE))
            .with(Prefixed::new("eval", "$", EVAL))
            .with(Prefixed::new("spread", "...", SPREAD))
            .with(BareToken::standard())
    }

    pub fn with(mut self, recognizer: impl Recognizer + 'static) -> Self {
        self.push(recognizer);
        self
    }

    pub fn push(&mut self, recognizer: impl Recognizer + 'static) {
        self.recognizers.push(Box::new(recognizer));
    }

    /// Inserts a recognizer at `index`, or at the end if `index` is past it.
    pub fn insert(&mut self, index: usize, recognizer: impl Recognizer + 'static) {
        let index = index.min(self.recognizers.len());
        self.recognizers.insert(index, Box::new(recognizer));
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.recognizers.iter().position(|r| r.name() == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Recognizer>> {
        let index = self.position(name)?;
        Some(self.recognizers.remove(index))
    }

    pub fn names(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Reads one token, trying each recognizer in order.
    ///
    /// At end of input with nothing matching this is `Skip`; anywhere else it is a
    /// lexical error.
    pub fn read_token(
        &self,
        reader: &mut Reader,
        boundary: Option<Boundary<'_>>,
    ) -> Result<Token, TorontoError> {
        for recognizer in &self.recognizers {
            let mark = reader.mark();
            match recognizer.recognize(reader, self, boundary)? {
                Some(token) => return Ok(token),
                None => reader.rewind(mark),
            }
        }
        if reader.is_at_end() {
            return Ok(Token::Skip);
        }
        Err(self.unrecognized(reader))
    }

    /// Reads one token for a caller that collects children.
    ///
    /// `Skip` becomes `None`. A skip that consumed nothing before the end of input
    /// would loop forever, so it is reported instead.
    pub fn read_child(
        &self,
        reader: &mut Reader,
        boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Tree>, TorontoError> {
        let mark = reader.mark();
        match self.read_token(reader, boundary)? {
            Token::Node(tree) => Ok(Some(tree)),
            Token::Skip if reader.consumed_since(mark) == 0 && !reader.is_at_end() => {
                Err(self.unrecognized(reader))
            }
            Token::Skip => Ok(None),
        }
    }

    fn unrecognized(&self, reader: &Reader) -> TorontoError {
        let mark = reader.mark();
        reader.report_from(
            ErrorKind::UnrecognizedToken {
                found: reader.rest_of_line(),
            },
            mark,
        )
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("recognizers", &self.names())
            .finish()
    }
}

// ============================================================================
// BRACKETED
// ============================================================================

type Transform = Box<dyn Fn(Vec<Tree>) -> Tree + Send + Sync>;

/// Reads `open child... close`, reading each child through the whole chain.
pub struct Bracketed {
    name: String,
    open: String,
    close: String,
    guard: Option<fn(Option<char>) -> bool>,
    transform: Transform,
}

impl Bracketed {
    pub fn new(
        name: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
        transform: impl Fn(Vec<Tree>) -> Tree + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            open: open.into(),
            close: close.into(),
            guard: None,
            transform: Box::new(transform),
        }
    }

    /// A bracket whose children become a plain list.
    pub fn list(name: &str, open: &str, close: &str) -> Self {
        Self::new(name, open, close, Tree::List)
    }

    /// A bracket whose children become `(tag children...)`.
    pub fn tagged(name: &str, open: &str, close: &str, tag: &'static str) -> Self {
        Self::new(name, open, close, move |children| Tree::tagged(tag, children))
    }

    /// Only match when `guard` accepts the character after the open delimiter.
    pub fn guarded(mut self, guard: fn(Option<char>) -> bool) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl Recognizer for Bracketed {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(
        &self,
        reader: &mut Reader,
        chain: &Chain,
        _boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError> {
        let open = reader.mark();
        if !reader.eat(&self.open) {
            return Ok(None);
        }
        if let Some(guard) = self.guard {
            if !guard(reader.peek()) {
                return Ok(None);
            }
        }

        let close = self.close.as_str();
        let at_close: Boundary<'_> = &|r: &Reader| r.at(close);
        let mut children = Vec::new();
        loop {
            if reader.eat(close) {
                return Ok(Some(Token::Node((self.transform)(children))));
            }
            if reader.is_at_end() {
                return Err(reader.report_from(
                    ErrorKind::UnterminatedList {
                        close: self.close.clone(),
                    },
                    open,
                ));
            }
            if let Some(child) = chain.read_child(reader, Some(at_close))? {
                children.push(child);
            }
        }
    }
}

fn escape_guard(next: Option<char>) -> bool {
    matches!(next, Some(ch) if !ch.is_whitespace() && !matches!(ch, '=' | '<' | '>'))
}

fn escape_transform(mut children: Vec<Tree>) -> Tree {
    let inner = if children.len() == 1 {
        children.remove(0)
    } else {
        Tree::List(children)
    };
    Tree::tagged(ESCAPE, [inner])
}

// ============================================================================
// PREFIXED
// ============================================================================

/// Reads `prefix X` as `(operator X)`.
pub struct Prefixed {
    name: String,
    prefix: String,
    operator: String,
}

impl Prefixed {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            operator: operator.into(),
        }
    }
}

impl Recognizer for Prefixed {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(
        &self,
        reader: &mut Reader,
        chain: &Chain,
        boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError> {
        if !reader.eat(&self.prefix) {
            return Ok(None);
        }
        // A prefix with nothing after it is an ordinary atom.
        match chain.read_token(reader, boundary)? {
            Token::Node(inner) => Ok(Some(Token::Node(Tree::tagged(&self.operator, [inner])))),
            Token::Skip => Ok(None),
        }
    }
}

// ============================================================================
// DELIMITED TEXT
// ============================================================================

/// Quoted text. Backslash escapes are kept as written and the quotes are part of the atom.
pub struct Delimited {
    quotes: Vec<char>,
}

impl Delimited {
    pub fn new(quotes: impl IntoIterator<Item = char>) -> Self {
        Self {
            quotes: quotes.into_iter().collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(['\'', '"', '`'])
    }
}

impl Recognizer for Delimited {
    fn name(&self) -> &str {
        "text"
    }

    fn recognize(
        &self,
        reader: &mut Reader,
        _chain: &Chain,
        _boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError> {
        let open = reader.mark();
        let Some(quote) = reader.next_char().filter(|ch| self.quotes.contains(ch)) else {
            return Ok(None);
        };

        let unterminated = |reader: &Reader| {
            reader.report_from(ErrorKind::UnterminatedLiteral { delimiter: quote }, open)
        };
        let mut text = String::from(quote);
        loop {
            match reader.next_char() {
                None => return Err(unterminated(&*reader)),
                Some('\\') => {
                    text.push('\\');
                    match reader.next_char() {
                        Some(escaped) => text.push(escaped),
                        None => return Err(unterminated(&*reader)),
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    if ch == quote {
                        return Ok(Some(Token::Node(Tree::Atom(text))));
                    }
                }
            }
        }
    }
}

// ============================================================================
// COMMENT
// ============================================================================

pub struct Comment {
    markers: Vec<String>,
}

impl Comment {
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new([";", "//"])
    }
}

impl Recognizer for Comment {
    fn name(&self) -> &str {
        "comment"
    }

    fn recognize(
        &self,
        reader: &mut Reader,
        _chain: &Chain,
        _boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError> {
        if !self.markers.iter().any(|marker| reader.eat(marker)) {
            return Ok(None);
        }
        while let Some(ch) = reader.next_char() {
            if ch == '\n' {
                break;
            }
        }
        Ok(Some(Token::Skip))
    }
}

// ============================================================================
// BARE TOKEN
// ============================================================================

/// Catch-all: a run of non-whitespace characters. Always matches.
///
/// A token ends early where one of its `stops` begins, so a comment marker glued to
/// the end of a token still starts a comment. A stop at the very start of a token is
/// read as part of it.
pub struct BareToken {
    stops: Vec<String>,
}

impl BareToken {
    pub fn new(stops: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            stops: stops.into_iter().map(Into::into).collect(),
        }
    }

    /// Stops at the standard comment markers.
    pub fn standard() -> Self {
        Self::new([";", "//"])
    }
}

impl Recognizer for BareToken {
    fn name(&self) -> &str {
        "bare"
    }

    fn recognize(
        &self,
        reader: &mut Reader,
        _chain: &Chain,
        boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError> {
        let mut text = String::new();
        loop {
            if boundary.is_some_and(|at_close| at_close(reader)) {
                break;
            }
            if !text.is_empty() && self.stops.iter().any(|stop| reader.at(stop)) {
                break;
            }
            match reader.next_char() {
                Some(ch) if !ch.is_whitespace() => text.push(ch),
                // Trailing whitespace belongs to the token.
                _ => break,
            }
        }
        if text.is_empty() {
            Ok(Some(Token::Skip))
        } else {
            Ok(Some(Token::Node(Tree::Atom(text))))
        }
    }
}
