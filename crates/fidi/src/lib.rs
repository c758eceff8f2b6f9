//! fidi - A small language for describing and exercising service call graphs.
//!
//! A fidi unit declares nodes (services) and the calls between them. The
//! [`Driver`] parses a unit into a [`Graph`] and hands it
//! to one of two behaviors:
//!
//! - `app` executes the graph in topological order and produces a [`Trace`].
//! - `lint` checks its structure and produces a [`LintReport`].
//!
//! [`RequestHandler`] wraps this in a serializable request/response
//! contract, and [`AppCaller`] schedules units on a Tokio runtime.
//!
//! # Examples
//!
//! ```
//! use fidi::{Driver, Mode, Outcome, config::AppConfig};
//!
//! let source = r#"
//!     .web [hostname = "web", port = 8080]
//!     .db []
//!     web -> db repeat = 2;
//! "#;
//!
//! let mut driver = Driver::from_config(Mode::App, &AppConfig::default());
//! let Outcome::Executed(trace) = driver.run(source).expect("valid unit") else {
//!     unreachable!("app mode executes");
//! };
//! assert_eq!(trace.order(), vec!["web", "db"]);
//! assert_eq!(trace.steps()[0].stages()[0].fan_out(), 2);
//! ```

pub mod config;

mod app;
mod behavior;
mod caller;
mod checks;
mod driver;
mod error;
mod handler;
mod lint;

pub use fidi_core::{Graph, error::Diagnostic};

pub use app::{
    AppDriver, Call, DEFAULT_PATH, DEFAULT_RESPONSE, NodeExecutor, Stage, Step, Trace,
    TraceExecutor,
};
pub use behavior::{Behavior, Mode, Outcome, Unit};
pub use caller::AppCaller;
pub use checks::RESPONSE_CODES;
pub use driver::Driver;
pub use error::{ExecutionError, FidiError};
pub use handler::{Body, RequestHandler, Response, Status, WireDiagnostic, WireSyntaxError};
pub use lint::{LintDriver, LintReport};

pub use fidi_parser::SyntaxError;
