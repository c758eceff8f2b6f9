//! Attribute values.

use std::fmt;

use serde::Serialize;

/// The value on the right-hand side of `key = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A quoted string with escapes already processed.
    Str(String),
    Number(i64),
    /// A bare identifier such as `true` or `backend`.
    Ident(String),
}

impl Value {
    /// The textual content of string and identifier values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Ident(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interpret the value as a flag: `true`/`false` identifiers or numbers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Ident(s) if s == "true" => Some(true),
            Value::Ident(s) if s == "false" => Some(false),
            Value::Number(n) => Some(*n != 0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Ident(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}
