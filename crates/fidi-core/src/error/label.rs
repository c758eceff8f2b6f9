//! Spans of a unit singled out by a diagnostic.

use std::fmt;

use crate::span::{Location, Span};

/// What a label contributes to its diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelRole {
    /// The statement at fault. The first primary label places the diagnostic.
    Primary,
    /// Related statements, e.g. the edge a duplicate collides with.
    Secondary,
}

/// A message pinned to a span of the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    role: LabelRole,
}

impl Label {
    pub fn new(role: LabelRole, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role,
        }
    }

    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(LabelRole::Primary, span, message)
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(LabelRole::Secondary, span, message)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Line, column and offset of the labelled statement.
    pub fn location(&self) -> Location {
        self.span.location()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> LabelRole {
        self.role
    }

    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Primary
    }
}

/// `line:column: message`, as used for notes in serialized responses.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let span = Span::new(Location::new(2, 1, 7), 14);
        let label = Label::primary(span, "duplicate edge");

        assert_eq!(label.role(), LabelRole::Primary);
        assert!(label.is_primary());
        assert_eq!(label.span().len(), 7);
        assert_eq!(label.location().line(), 2);
    }

    #[test]
    fn test_secondary_label_display() {
        let span = Span::new(Location::new(4, 3, 30), 36);
        let label = Label::secondary(span, "first declared here");

        assert!(!label.is_primary());
        assert_eq!(label.to_string(), "4:3: first declared here");
    }
}
