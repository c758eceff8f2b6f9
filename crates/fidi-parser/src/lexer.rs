//! Lexical analyzer for fidi source text.
//!
//! The [`Lexer`] hands out one [`Token`] at a time, which is what the
//! table-driven parser consumes. Lexical errors do not stop the lexer: they
//! come back as [`TokenKind::Error`] tokens so the parser can decide whether
//! to report and skip them or to fail.
//!
//! Whitespace, `//` comments and `#` comments are skipped. Once the input is
//! exhausted every further call returns [`TokenKind::Eof`].

use winnow::{
    Parser as _,
    ascii::{digit1, multispace1},
    combinator::{alt, opt, preceded, repeat},
    error::ModalResult,
    token::{literal, none_of, one_of, take_while},
};

use fidi_core::{Location, Span};

use crate::tokens::{LexError, Token, TokenKind};

type Input<'a> = &'a str;

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a line comment starting with `//` or `#`
fn line_comment<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    preceded(alt(("//", "#")), take_while(0.., |c| c != '\n')).parse_next(input)
}

/// Skip any run of whitespace and comments
fn trivia(input: &mut Input<'_>) -> ModalResult<()> {
    repeat(0.., alt((multispace1.void(), line_comment.void()))).parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    (
        one_of(is_identifier_start),
        take_while(0.., is_identifier_char),
    )
        .take()
        .parse_next(input)
}

/// Parse an optionally negative run of decimal digits
fn number_text<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    (opt('-'), digit1).take().parse_next(input)
}

/// Parse punctuation (`->` must come before anything starting with `-`)
fn punctuation<'a>(input: &mut Input<'a>) -> ModalResult<TokenKind<'a>> {
    alt((
        literal("->").value(TokenKind::Arrow),
        '.'.value(TokenKind::Dot),
        '='.value(TokenKind::Equals),
        ','.value(TokenKind::Comma),
        '['.value(TokenKind::LeftBracket),
        ']'.value(TokenKind::RightBracket),
        ';'.value(TokenKind::Semicolon),
    ))
    .parse_next(input)
}

fn escape(input: &mut Input<'_>) -> ModalResult<char> {
    one_of(['n', 't', 'r', '"', '\\'])
        .map(|c| match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            other => other,
        })
        .parse_next(input)
}

/// A single character of a string body, with escapes processed. Stops at a
/// closing quote, a newline, or a backslash not followed by a valid escape.
fn string_char(input: &mut Input<'_>) -> ModalResult<char> {
    alt((preceded('\\', escape), none_of(['"', '\\', '\n']))).parse_next(input)
}

fn string_body(input: &mut Input<'_>) -> ModalResult<String> {
    repeat(0.., string_char)
        .fold(String::new, |mut acc, c| {
            acc.push(c);
            acc
        })
        .parse_next(input)
}

/// Streaming lexer over one source buffer.
///
/// Locations are reported relative to an origin, so a nested buffer (for
/// example a payload lifted out of a larger file) can be lexed with
/// positions that point into the outer file.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    rest: &'src str,
    position: Location,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_origin(source, Location::default())
    }

    /// Lex `source` as if it started at `origin` in some enclosing text.
    pub fn with_origin(source: &'src str, origin: Location) -> Self {
        Self {
            source,
            rest: source,
            position: origin,
        }
    }

    /// Restart on a new buffer, dropping all state from the previous one.
    pub fn reset(&mut self, source: &'src str) {
        *self = Self::new(source);
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Location of the next unconsumed character.
    pub fn location(&self) -> Location {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.rest.is_empty()
    }

    /// Produce the next token. Returns [`TokenKind::Eof`] forever once the
    /// input is exhausted.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_trivia();

        let start = self.position;
        let before = self.rest;
        let mut chars = before.chars();
        let Some(first) = chars.next() else {
            return Token::new(TokenKind::Eof, "", Span::empty(start));
        };

        let kind = match first {
            '"' => self.lex_string(),
            '{' => self.lex_payload(),
            c if c.is_ascii_digit() => self.lex_number(),
            '-' if chars.next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            _ => self.lex_simple(first),
        };

        let consumed = before.len() - self.rest.len();
        let text = &before[..consumed];
        self.position = start.advance(text);
        Token::new(kind, text, Span::new(start, start.offset() + consumed))
    }

    fn skip_trivia(&mut self) {
        let before = self.rest;
        if trivia(&mut self.rest).is_err() {
            self.rest = before;
        }
        let consumed = before.len() - self.rest.len();
        self.position = self.position.advance(&before[..consumed]);
    }

    fn lex_simple(&mut self, first: char) -> TokenKind<'src> {
        if let Ok(kind) = punctuation(&mut self.rest) {
            return kind;
        }
        if let Ok(name) = identifier(&mut self.rest) {
            return TokenKind::Identifier(name);
        }
        self.rest = &self.rest[first.len_utf8()..];
        TokenKind::Error(LexError::UnexpectedChar(first))
    }

    fn lex_number(&mut self) -> TokenKind<'src> {
        let Ok(text) = number_text(&mut self.rest) else {
            return TokenKind::Error(LexError::MalformedNumber);
        };
        if self.rest.starts_with(is_identifier_char) {
            // `8080abc`: swallow the whole run so it is reported once.
            let _: ModalResult<&str> =
                take_while(0.., is_identifier_char).parse_next(&mut self.rest);
            return TokenKind::Error(LexError::MalformedNumber);
        }
        match text.parse::<i64>() {
            Ok(value) => TokenKind::Number(value),
            Err(_) => TokenKind::Error(LexError::MalformedNumber),
        }
    }

    fn lex_string(&mut self) -> TokenKind<'src> {
        let mut rest = &self.rest[1..];
        let body = string_body(&mut rest).unwrap_or_default();

        let kind = match rest.chars().next() {
            Some('"') => {
                rest = &rest[1..];
                TokenKind::String(body)
            }
            Some('\\') => {
                let after = &rest[1..];
                match after.chars().next() {
                    Some(invalid) if invalid != '\n' => {
                        rest = skip_rest_of_string(&after[invalid.len_utf8()..]);
                        TokenKind::Error(LexError::InvalidEscape(invalid))
                    }
                    _ => {
                        rest = after;
                        TokenKind::Error(LexError::UnterminatedString)
                    }
                }
            }
            _ => TokenKind::Error(LexError::UnterminatedString),
        };

        self.rest = rest;
        kind
    }

    fn lex_payload(&mut self) -> TokenKind<'src> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (index, ch) in self.rest.char_indices() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    in_string = false;
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.rest[1..index];
                        self.rest = &self.rest[index + 1..];
                        return TokenKind::Payload(inner);
                    }
                }
                _ => {}
            }
        }

        self.rest = &self.rest[self.rest.len()..];
        TokenKind::Error(LexError::UnterminatedPayload)
    }
}

/// After an invalid escape, skip to just past the closing quote on the same
/// line, or to the end of the line if there is none.
fn skip_rest_of_string(rest: &str) -> &str {
    let mut escaped = false;
    for (index, ch) in rest.char_indices() {
        match ch {
            '\n' => return &rest[index..],
            '"' if !escaped => return &rest[index + 1..],
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            _ => {}
        }
        escaped = false;
    }
    &rest[rest.len()..]
}

/// Lex `source` to completion. The final token is always
/// [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
