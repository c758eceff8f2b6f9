//! Callbacks through which the parser hands fully reduced statements to
//! whoever is building the graph.

use fidi_core::{Span, Spanned, Value, error::Diagnostic};

/// `key = value`, inside a node's brackets, as an edge option, or as a
/// top-level setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: Spanned<String>,
    pub value: Spanned<Value>,
}

/// `.name [ key = value, ... ]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDecl {
    pub name: Spanned<String>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// `source -> target opts { payload }` or the implicit `-> target ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDecl {
    pub source: Option<Spanned<String>>,
    pub target: Spanned<String>,
    pub options: Vec<Attribute>,
    /// Text between the braces. The span covers that text only.
    pub payload: Option<Spanned<String>>,
    pub span: Span,
}

/// Receiver of parser output.
///
/// Each `declare_*`/`set_attribute` call corresponds to exactly one
/// statement, delivered only once the statement has been completely reduced.
pub trait Actions {
    fn declare_node(&mut self, decl: NodeDecl);

    fn declare_edge(&mut self, decl: EdgeDecl);

    fn set_attribute(&mut self, attribute: Attribute);

    /// Recovered syntax errors and skipped lexical errors.
    fn report(&mut self, diagnostic: Diagnostic);
}
