//! Tokens produced by the [`Lexer`](crate::Lexer).

use std::fmt;

use fidi_core::{Location, Span, error::ErrorCode};

/// What went wrong while recognising a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnexpectedChar(char),
    UnterminatedString,
    /// The character following the backslash.
    InvalidEscape(char),
    MalformedNumber,
    UnterminatedPayload,
}

impl LexError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LexError::UnterminatedString => ErrorCode::E001,
            LexError::UnexpectedChar(_) => ErrorCode::E002,
            LexError::InvalidEscape(_) => ErrorCode::E003,
            LexError::MalformedNumber => ErrorCode::E004,
            LexError::UnterminatedPayload => ErrorCode::E005,
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            LexError::UnexpectedChar(_) => "remove this character",
            LexError::UnterminatedString => "add closing `\"` before the end of the line",
            LexError::InvalidEscape(_) => "valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"`",
            LexError::MalformedNumber => {
                "numbers are signed 64-bit integers; quote values such as `\"8080abc\"`"
            }
            LexError::UnterminatedPayload => "add the closing `}` of the payload",
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar(ch) => write!(f, "unexpected character `{}`", ch.escape_debug()),
            LexError::UnterminatedString => write!(f, "unterminated string literal"),
            LexError::InvalidEscape(ch) => {
                write!(f, "invalid escape sequence `\\{}`", ch.escape_debug())
            }
            LexError::MalformedNumber => write!(f, "malformed number"),
            LexError::UnterminatedPayload => write!(f, "unterminated payload"),
        }
    }
}

/// Token kinds together with their semantic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'src> {
    Identifier(&'src str),
    /// String literal with escapes processed.
    String(String),
    Number(i64),
    /// Raw text between the braces of a `{ ... }` block.
    Payload(&'src str),

    Dot,
    Arrow,
    Equals,
    Comma,
    LeftBracket,
    RightBracket,
    Semicolon,

    Eof,
    Error(LexError),
}

/// A token with its source text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    kind: TokenKind<'src>,
    text: &'src str,
    span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind<'src>, text: &'src str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn kind(&self) -> &TokenKind<'src> {
        &self.kind
    }

    pub fn into_kind(self) -> TokenKind<'src> {
        self.kind
    }

    /// The exact source text of the token, including quotes and braces.
    pub fn text(&self) -> &'src str {
        self.text
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn location(&self) -> Location {
        self.span.location()
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Payload(_) => write!(f, "payload block"),
            _ => write!(f, "`{}`", self.text),
        }
    }
}
