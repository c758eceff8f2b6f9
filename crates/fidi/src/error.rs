//! Error types for fidi operations.
//!
//! [`FidiError`] is what [`Driver::run`](crate::Driver::run) and the
//! collaborators around it return. Lint findings are not errors: they are
//! the successful result of the `lint` mode.

use std::io;

use thiserror::Error;

use fidi_core::error::Diagnostic;
use fidi_parser::SyntaxError;

use crate::app::Trace;

/// Why a unit could not be executed.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The unit carries error diagnostics and is refused as a whole.
    #[error("unit rejected with {} error(s)", .diagnostics.len())]
    Rejected { diagnostics: Vec<Diagnostic> },

    #[error("cycle detected: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// Execution stopped at `node`. `trace` holds the nodes that completed.
    #[error("node `{node}` failed: {message}")]
    NodeFailed {
        node: String,
        message: String,
        trace: Box<Trace>,
    },
}

/// The main error type for fidi operations.
///
/// The `Syntax` variant keeps the source text alongside the error so that
/// front ends can render it with context.
#[derive(Debug, Error)]
pub enum FidiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Syntax { err: SyntaxError, src: String },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("unit did not finish within {0} ms")]
    Timeout(u64),

    #[error("scheduled unit did not complete: {0}")]
    Task(String),
}

impl FidiError {
    /// Create a new `Syntax` error with the associated source code.
    pub fn new_syntax_error(err: SyntaxError, src: impl Into<String>) -> Self {
        Self::Syntax {
            err,
            src: src.into(),
        }
    }
}
