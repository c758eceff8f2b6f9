//! Source positions for tokens, graph elements and diagnostics.
//!
//! A [`Location`] is a single point in the source (1-based line and column
//! plus a byte offset). A [`Span`] is a byte range that also remembers where
//! it starts, so any diagnostic built from it can report a line and column
//! without going back to the source text.

use std::{fmt, ops::Range};

use serde::Serialize;

/// A point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    line: u32,
    column: u32,
    offset: usize,
}

impl Location {
    /// Create a location from a 1-based line and column and a byte offset.
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The 1-based column number, counted in characters.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// The byte offset from the start of the outermost source buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the location reached after consuming `text` from here.
    pub fn advance(self, text: &str) -> Self {
        let mut next = self;
        for ch in text.chars() {
            if ch == '\n' {
                next.line += 1;
                next.column = 1;
            } else {
                next.column += 1;
            }
        }
        next.offset += text.len();
        next
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A byte range in the source, anchored at its starting [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: Location,
    end: usize,
}

impl Span {
    /// Create a span starting at `start` and ending at byte offset `end`.
    pub fn new(start: Location, end: usize) -> Self {
        debug_assert!(end >= start.offset(), "span end precedes its start");
        Self { start, end }
    }

    /// Create an empty span at `location`.
    pub fn empty(location: Location) -> Self {
        Self::new(location, location.offset())
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start.offset()
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start.offset()
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The location of the first byte.
    pub fn location(&self) -> Location {
        self.start
    }

    /// 1-based line of the first byte.
    pub fn line(&self) -> u32 {
        self.start.line()
    }

    /// 1-based column of the first byte.
    pub fn column(&self) -> u32 {
        self.start.column()
    }

    /// The byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        let start = if other.start() < self.start() {
            other.start
        } else {
            self.start
        };
        Span::new(start, self.end.max(other.end))
    }
}

/// A value paired with the span it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    /// Create a new spanned value from a value and span information
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Get a reference to the underlying value
    pub fn inner(&self) -> &T {
        &self.value
    }

    /// Consume the Spanned wrapper and return just the inner value
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Transform the value while keeping the span.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }
}
