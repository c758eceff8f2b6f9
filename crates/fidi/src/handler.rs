//! The request/response contract around a [`Driver`].
//!
//! A request is source text plus a [`Mode`]. Whatever happens, the
//! [`RequestHandler`] answers with a [`Response`] that serializes to JSON:
//!
//! ```json
//! { "status": "diagnostics", "outcome": { "diagnostics": [ ... ] } }
//! ```
//!
//! | status             | when                                           | code |
//! |--------------------|------------------------------------------------|------|
//! | `ok`               | executed, or linted without errors             | 200* |
//! | `diagnostics`      | linted with at least one error                 | 400  |
//! | `syntax_error`     | the parser gave up                             | 400  |
//! | `rejected`         | execution refused (errors or a cycle)          | 400  |
//! | `execution_failed` | a node failed, or the unit did not finish      | 500  |
//!
//! \* An executed unit answers with its `response` setting.

use log::{debug, info};
use serde::Serialize;

use fidi_core::error::{Diagnostic, DiagnosticKind, ErrorCode, Severity};
use fidi_parser::SyntaxError;

use crate::{
    app::Trace,
    behavior::{Mode, Outcome},
    config::AppConfig,
    driver::Driver,
    error::{ExecutionError, FidiError},
    lint::LintReport,
};

/// Coarse result of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Diagnostics,
    SyntaxError,
    Rejected,
    ExecutionFailed,
}

/// A diagnostic flattened for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireDiagnostic {
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    /// Secondary labels as `line:column: message`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
}

impl WireDiagnostic {
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn column(&self) -> Option<u32> {
        self.column
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

impl From<&Diagnostic> for WireDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        let location = diagnostic.location();
        Self {
            severity: diagnostic.severity(),
            code: diagnostic.code(),
            message: diagnostic.message().to_string(),
            line: location.map(|location| location.line()),
            column: location.map(|location| location.column()),
            help: diagnostic.help().map(str::to_string),
            notes: diagnostic
                .labels()
                .iter()
                .filter(|label| !label.is_primary())
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// A syntax error flattened for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireSyntaxError {
    code: ErrorCode,
    message: String,
    line: u32,
    column: u32,
    token: String,
    expected: Vec<String>,
}

impl From<&SyntaxError> for WireSyntaxError {
    fn from(err: &SyntaxError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
            line: err.line(),
            column: err.column(),
            token: err.token().to_string(),
            expected: err.expected().iter().map(ToString::to_string).collect(),
        }
    }
}

/// The payload of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Trace(Trace),
    Diagnostics {
        diagnostics: Vec<WireDiagnostic>,
        #[serde(skip_serializing_if = "Option::is_none")]
        dot: Option<String>,
    },
    Syntax(WireSyntaxError),
    Failure {
        #[serde(skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace: Option<Trace>,
    },
}

/// The answer to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    status: Status,
    outcome: Body,
}

impl Response {
    pub fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Executed(trace) => Self {
                status: Status::Ok,
                outcome: Body::Trace(trace),
            },
            Outcome::Linted(report) => Self::from_report(report),
        }
    }

    pub fn from_error(err: &FidiError) -> Self {
        match err {
            FidiError::Syntax { err, .. } => Self {
                status: Status::SyntaxError,
                outcome: Body::Syntax(err.into()),
            },
            FidiError::Execution(ExecutionError::Rejected { diagnostics }) => Self {
                status: Status::Rejected,
                outcome: Body::Diagnostics {
                    diagnostics: diagnostics.iter().map(WireDiagnostic::from).collect(),
                    dot: None,
                },
            },
            FidiError::Execution(ExecutionError::CycleDetected { path }) => {
                let kind = DiagnosticKind::CycleDetected { path: path.clone() };
                let diagnostic = Diagnostic::error(kind.to_string()).with_code(kind.code());
                Self {
                    status: Status::Rejected,
                    outcome: Body::Diagnostics {
                        diagnostics: vec![WireDiagnostic::from(&diagnostic)],
                        dot: None,
                    },
                }
            }
            FidiError::Execution(ExecutionError::NodeFailed {
                node,
                message,
                trace,
            }) => Self {
                status: Status::ExecutionFailed,
                outcome: Body::Failure {
                    node: Some(node.clone()),
                    message: message.clone(),
                    trace: Some(trace.as_ref().clone()),
                },
            },
            other => Self {
                status: Status::ExecutionFailed,
                outcome: Body::Failure {
                    node: None,
                    message: other.to_string(),
                    trace: None,
                },
            },
        }
    }

    fn from_report(report: LintReport) -> Self {
        let status = if report.has_errors() {
            Status::Diagnostics
        } else {
            Status::Ok
        };
        Self {
            status,
            outcome: Body::Diagnostics {
                diagnostics: report.diagnostics().iter().map(WireDiagnostic::from).collect(),
                dot: Some(report.dot().to_string()),
            },
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn outcome(&self) -> &Body {
        &self.outcome
    }

    /// The trace of an executed (or partially executed) unit.
    pub fn trace(&self) -> Option<&Trace> {
        match &self.outcome {
            Body::Trace(trace) => Some(trace),
            Body::Failure { trace, .. } => trace.as_ref(),
            _ => None,
        }
    }

    /// HTTP-like status code.
    pub fn code(&self) -> u16 {
        match (self.status, &self.outcome) {
            (Status::Ok, Body::Trace(trace)) => u16::try_from(trace.response()).unwrap_or(200),
            (Status::Ok, _) => 200,
            (Status::Diagnostics | Status::SyntaxError | Status::Rejected, _) => 400,
            (Status::ExecutionFailed, _) => 500,
        }
    }

    /// # Errors
    ///
    /// Only if serialization itself fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Result<Outcome, FidiError>> for Response {
    fn from(result: Result<Outcome, FidiError>) -> Self {
        match result {
            Ok(outcome) => Response::from_outcome(outcome),
            Err(err) => Response::from_error(&err),
        }
    }
}

/// Answers requests with a fresh [`Driver`] each.
#[derive(Debug, Clone, Default)]
pub struct RequestHandler {
    config: AppConfig,
}

impl RequestHandler {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn handle(&self, source: &str, mode: Mode) -> Response {
        debug!(mode:%, bytes = source.len(); "Handling request");
        let response = Response::from(Driver::from_config(mode, &self.config).run(source));
        info!(status:? = response.status(), code = response.code(); "Request handled");
        response
    }
}
