//! Error codes for the fidi diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Graph construction errors
//! - `E3xx` - Lint errors

use std::fmt;

use serde::{Serialize, Serializer};

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but the line ended before it closed.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that does not start any token.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are: `\n`, `\r`, `\t`, `\\`, `\"`.
    E003,

    /// Malformed number.
    ///
    /// A digit run is directly followed by identifier characters, or the
    /// value does not fit in a signed 64-bit integer.
    E004,

    /// Unterminated payload.
    ///
    /// A `{` payload block was never closed.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Unexpected end of input.
    ///
    /// The input ended before a complete statement was parsed.
    E101,

    // =========================================================================
    // Graph Construction Errors (E2xx)
    // =========================================================================
    /// Unresolved reference.
    ///
    /// An edge names a node that is never declared.
    E200,

    /// Duplicate declaration.
    ///
    /// A node with this name has already been declared.
    E201,

    /// Duplicate edge.
    ///
    /// An edge with the same source, target and kind already exists.
    E202,

    /// Invalid edge option value.
    E203,

    /// Unknown edge option.
    E204,

    /// Setting assigned more than once.
    E205,

    /// Edge without a source.
    ///
    /// A `-> target` shorthand appears before any node declaration.
    E206,

    // =========================================================================
    // Lint Errors (E3xx)
    // =========================================================================
    /// Cycle detected.
    E300,

    /// Unused node.
    ///
    /// A node is declared but no edge refers to it.
    E301,

    /// Payload nesting too deep.
    E302,

    /// Invalid response code.
    ///
    /// The `response` setting is not a number between 1 and 599.
    E303,

    /// Node without an address.
    ///
    /// Only reported when addresses are required. A node needs a `url`, or
    /// both `hostname` and `port`.
    E304,

    /// Invalid address attribute.
    ///
    /// A `port` that is not a number between 1 and 65535, or an empty
    /// `hostname` or one containing a double quote.
    E305,

    /// Invalid timing setting.
    ///
    /// `predelay`, `postdelay` and `timeout_sec` take non-negative numbers;
    /// `timeout_usec` must also stay below one million.
    E306,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Graph construction errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            // Lint errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "malformed number",
            ErrorCode::E005 => "unterminated payload",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            // Graph construction errors
            ErrorCode::E200 => "unresolved reference",
            ErrorCode::E201 => "duplicate declaration",
            ErrorCode::E202 => "duplicate edge",
            ErrorCode::E203 => "invalid edge option value",
            ErrorCode::E204 => "unknown edge option",
            ErrorCode::E205 => "setting assigned more than once",
            ErrorCode::E206 => "edge without a source",
            // Lint errors
            ErrorCode::E300 => "cycle detected",
            ErrorCode::E301 => "unused node",
            ErrorCode::E302 => "payload nesting too deep",
            ErrorCode::E303 => "invalid response code",
            ErrorCode::E304 => "node without an address",
            ErrorCode::E305 => "invalid address attribute",
            ErrorCode::E306 => "invalid timing setting",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
