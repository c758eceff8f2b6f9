//! Diagnostics shared by every fidi phase.
//!
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - [`DiagnosticKind`], the structural failures raised while building a graph
//!
//! # Example
//!
//! ```
//! # use fidi_core::error::{Diagnostic, ErrorCode};
//! # use fidi_core::{Location, Span};
//!
//! let span = Span::new(Location::new(3, 1, 40), 52);
//! let first = Span::new(Location::new(1, 1, 0), 12);
//!
//! let diag = Diagnostic::warning("node `cache` is declared more than once")
//!     .with_code(ErrorCode::E201)
//!     .with_label(span, "duplicate declaration")
//!     .with_secondary_label(first, "first declared here")
//!     .with_help("remove the duplicate or use a different name");
//! assert_eq!(diag.location().map(|l| l.line()), Some(3));
//! ```

mod diagnostic;
mod error_code;
mod kind;
mod label;
mod severity;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use kind::DiagnosticKind;
pub use label::{Label, LabelRole};
pub use severity::Severity;
