//! Structural failures raised while a graph is built or checked.

use thiserror::Error;

use crate::{
    error::{Diagnostic, ErrorCode, Severity},
    span::Span,
};

/// Why a graph mutation or structural check failed.
///
/// Converted into a [`Diagnostic`] with [`DiagnosticKind::into_diagnostic`]
/// once the location of the offending statement is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("node `{name}` is declared more than once")]
    DuplicateDeclaration { name: String, first: Span },

    #[error("reference to undeclared node `{name}`")]
    UnresolvedReference { name: String },

    #[error("edge `{from} -> {to}` of kind `{kind}` is declared more than once")]
    DuplicateEdge {
        from: String,
        to: String,
        kind: String,
        first: Span,
    },

    #[error("cycle detected: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("edge to `{to}` has no source node")]
    MissingSource { to: String },
}

impl DiagnosticKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            DiagnosticKind::DuplicateDeclaration { .. } => ErrorCode::E201,
            DiagnosticKind::UnresolvedReference { .. } => ErrorCode::E200,
            DiagnosticKind::DuplicateEdge { .. } => ErrorCode::E202,
            DiagnosticKind::CycleDetected { .. } => ErrorCode::E300,
            DiagnosticKind::MissingSource { .. } => ErrorCode::E206,
        }
    }

    /// Duplicate declarations keep the first node and are only warnings.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DuplicateDeclaration { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Build a diagnostic pointing at `span`, the statement that failed.
    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        let message = self.to_string();
        let diag = match self.severity() {
            Severity::Error => Diagnostic::error(message),
            Severity::Warning => Diagnostic::warning(message),
        }
        .with_code(self.code());

        match self {
            DiagnosticKind::DuplicateDeclaration { first, .. } => diag
                .with_label(span, "duplicate declaration")
                .with_secondary_label(first, "first declared here")
                .with_help("the first declaration is kept; remove or rename this one"),
            DiagnosticKind::UnresolvedReference { name } => diag
                .with_label(span, format!("`{name}` is never declared"))
                .with_help(format!("declare it with `.{name} [ ]`")),
            DiagnosticKind::DuplicateEdge { first, .. } => diag
                .with_label(span, "duplicate edge")
                .with_secondary_label(first, "first declared here")
                .with_help("use a different `kind` to declare a second relation"),
            DiagnosticKind::CycleDetected { .. } => diag
                .with_label(span, "this edge closes the cycle")
                .with_help("nodes in a cycle have no execution order"),
            DiagnosticKind::MissingSource { .. } => diag
                .with_label(span, "no node is declared before this edge")
                .with_help("write the source explicitly: `source -> target;`"),
        }
    }
}
