//! Entries of the parser stack.

use fidi_core::{Span, Spanned, Value};

use crate::{
    actions::{Attribute, EdgeDecl, NodeDecl},
    error::SyntaxError,
    grammar::State,
    tokens::{Token, TokenKind},
};

/// Semantic value carried by a stack entry: either a shifted token or the
/// result of a reduction.
#[derive(Debug, Clone)]
pub(crate) enum SemanticValue<'src> {
    /// Reductions with nothing to hand on (`stmts`, `stmt`) and the
    /// bottom-of-stack marker.
    Empty,
    Token(Token<'src>),
    Value(Spanned<Value>),
    Attribute(Attribute),
    Attributes(Vec<Attribute>),
    EdgeHead {
        source: Option<Spanned<String>>,
        target: Spanned<String>,
    },
    Payload(Option<Spanned<String>>),
    NodeDecl(NodeDecl),
    EdgeDecl(EdgeDecl),
}

#[derive(Debug, Clone)]
pub(crate) struct Symbol<'src> {
    state: State,
    value: SemanticValue<'src>,
    span: Span,
}

impl<'src> Symbol<'src> {
    pub fn new(state: State, value: SemanticValue<'src>, span: Span) -> Self {
        Self { state, value, span }
    }

    pub fn shifted(state: State, token: Token<'src>) -> Self {
        let span = token.span();
        Self::new(state, SemanticValue::Token(token), span)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// The right-hand side of a reduction, consumed left to right.
///
/// A mismatch between what a rule expects and what is on the stack can only
/// come from inconsistent tables, so it is reported as an internal error
/// rather than a panic.
pub(crate) struct Children<'src> {
    symbols: std::vec::IntoIter<Symbol<'src>>,
    span: Span,
}

impl<'src> Children<'src> {
    pub fn new(symbols: Vec<Symbol<'src>>, span: Span) -> Self {
        Self {
            symbols: symbols.into_iter(),
            span,
        }
    }

    fn next(&mut self, what: &str) -> Result<Symbol<'src>, SyntaxError> {
        self.symbols
            .next()
            .ok_or_else(|| SyntaxError::internal(self.span, what))
    }

    fn mismatch(&self, what: &str) -> SyntaxError {
        SyntaxError::internal(self.span, &format!("expected {what} on the stack"))
    }

    /// Skip a symbol whose value is not needed (punctuation).
    pub fn skip(&mut self) -> Result<(), SyntaxError> {
        self.next("punctuation").map(|_| ())
    }

    pub fn token(&mut self) -> Result<Token<'src>, SyntaxError> {
        match self.next("token")?.value {
            SemanticValue::Token(token) => Ok(token),
            _ => Err(self.mismatch("token")),
        }
    }

    pub fn identifier(&mut self) -> Result<Spanned<String>, SyntaxError> {
        let token = self.token()?;
        let span = token.span();
        match token.into_kind() {
            TokenKind::Identifier(name) => Ok(Spanned::new(name.to_string(), span)),
            _ => Err(self.mismatch("identifier")),
        }
    }

    pub fn value(&mut self) -> Result<Spanned<Value>, SyntaxError> {
        match self.next("value")?.value {
            SemanticValue::Value(value) => Ok(value),
            _ => Err(self.mismatch("value")),
        }
    }

    pub fn attribute(&mut self) -> Result<Attribute, SyntaxError> {
        match self.next("attribute")?.value {
            SemanticValue::Attribute(attribute) => Ok(attribute),
            _ => Err(self.mismatch("attribute")),
        }
    }

    pub fn attributes(&mut self) -> Result<Vec<Attribute>, SyntaxError> {
        match self.next("attribute list")?.value {
            SemanticValue::Attributes(attributes) => Ok(attributes),
            _ => Err(self.mismatch("attribute list")),
        }
    }

    pub fn edge_head(
        &mut self,
    ) -> Result<(Option<Spanned<String>>, Spanned<String>), SyntaxError> {
        match self.next("edge head")?.value {
            SemanticValue::EdgeHead { source, target } => Ok((source, target)),
            _ => Err(self.mismatch("edge head")),
        }
    }

    pub fn payload(&mut self) -> Result<Option<Spanned<String>>, SyntaxError> {
        match self.next("payload")?.value {
            SemanticValue::Payload(payload) => Ok(payload),
            _ => Err(self.mismatch("payload")),
        }
    }

    pub fn node_decl(&mut self) -> Result<NodeDecl, SyntaxError> {
        match self.next("node declaration")?.value {
            SemanticValue::NodeDecl(decl) => Ok(decl),
            _ => Err(self.mismatch("node declaration")),
        }
    }

    pub fn edge_decl(&mut self) -> Result<EdgeDecl, SyntaxError> {
        match self.next("edge declaration")?.value {
            SemanticValue::EdgeDecl(decl) => Ok(decl),
            _ => Err(self.mismatch("edge declaration")),
        }
    }
}
