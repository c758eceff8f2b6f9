//! Named graph entities.

use indexmap::IndexMap;

use crate::{span::Span, value::Value};

/// Attribute mapping of a node, kept in declaration order.
pub type Attributes = IndexMap<String, Value>;

/// A declared entity: `.name [ key = value, ... ]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Attributes,
    span: Span,
}

impl Node {
    pub fn new(name: impl Into<String>, attributes: Attributes, span: Span) -> Self {
        Self {
            name: name.into(),
            attributes,
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Span of the whole declaration.
    pub fn span(&self) -> Span {
        self.span
    }
}
