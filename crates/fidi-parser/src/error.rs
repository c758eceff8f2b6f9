//! The terminal failure of a parse.

use thiserror::Error;

use fidi_core::{Span, error::{Diagnostic, ErrorCode}};

use crate::{
    grammar::Terminal,
    tokens::{LexError, Token},
};

/// A syntax error the parser could not (or was not allowed to) recover from.
///
/// Carries the offending token and the tokens that would have been
/// accepted in its place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}", line = .span.line(), column = .span.column())]
pub struct SyntaxError {
    message: String,
    token: String,
    span: Span,
    expected: Vec<Terminal>,
    code: ErrorCode,
    help: Option<String>,
}

impl SyntaxError {
    pub(crate) fn unexpected(token: &Token<'_>, expected: Vec<Terminal>) -> Self {
        let (message, code) = if token.is_eof() {
            ("unexpected end of input".to_string(), ErrorCode::E101)
        } else {
            (format!("unexpected {token}"), ErrorCode::E100)
        };
        let help = (!expected.is_empty()).then(|| format!("expected {}", list(&expected)));
        Self {
            message,
            token: token.text().to_string(),
            span: token.span(),
            expected,
            code,
            help,
        }
    }

    pub(crate) fn lexical(token: &Token<'_>, error: &LexError) -> Self {
        Self {
            message: error.to_string(),
            token: token.text().to_string(),
            span: token.span(),
            expected: Vec::new(),
            code: error.code(),
            help: Some(error.help().to_string()),
        }
    }

    /// The tables handed the driver a stack it does not know how to reduce.
    pub(crate) fn internal(span: Span, what: &str) -> Self {
        Self {
            message: format!("internal parser error: {what}"),
            token: String::new(),
            span,
            expected: Vec::new(),
            code: ErrorCode::E100,
            help: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source text of the offending token. Empty at end of input.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn line(&self) -> u32 {
        self.span.line()
    }

    pub fn column(&self) -> u32 {
        self.span.column()
    }

    pub fn expected(&self) -> &[Terminal] {
        &self.expected
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = if self.expected.is_empty() {
            "here"
        } else {
            "unexpected token"
        };
        let diagnostic = Diagnostic::error(&self.message)
            .with_code(self.code)
            .with_label(self.span, label);
        match &self.help {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        }
    }
}

/// `a`, `a or b`, `a, b or c`
fn list(terminals: &[Terminal]) -> String {
    match terminals {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<_> = init.iter().map(Terminal::to_string).collect();
            format!("{} or {last}", init.join(", "))
        }
    }
}
