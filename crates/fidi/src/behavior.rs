//! What a [`Driver`](crate::Driver) does with a unit once it is parsed.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use fidi_core::{Graph, error::Diagnostic};

use crate::{
    app::{AppDriver, Trace},
    config::AppConfig,
    error::ExecutionError,
    lint::{LintDriver, LintReport},
};

/// Processing mode requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    App,
    Lint,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::App => f.write_str("app"),
            Mode::Lint => f.write_str("lint"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(Mode::App),
            "lint" => Ok(Mode::Lint),
            other => Err(format!("unknown mode `{other}`, expected `app` or `lint`")),
        }
    }
}

/// A finalized compilation unit: its graph and everything reported while
/// building it.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    graph: Graph,
    diagnostics: Vec<Diagnostic>,
}

impl Unit {
    pub fn new(graph: Graph, diagnostics: Vec<Diagnostic>) -> Self {
        Self { graph, diagnostics }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Graph, Vec<Diagnostic>) {
        (self.graph, self.diagnostics)
    }
}

/// The result of processing a unit.
#[derive(Debug, Clone)]
pub enum Outcome {
    Executed(Trace),
    Linted(LintReport),
}

impl Outcome {
    pub fn trace(&self) -> Option<&Trace> {
        match self {
            Outcome::Executed(trace) => Some(trace),
            Outcome::Linted(_) => None,
        }
    }

    pub fn lint_report(&self) -> Option<&LintReport> {
        match self {
            Outcome::Linted(report) => Some(report),
            Outcome::Executed(_) => None,
        }
    }
}

/// The two ways of processing a unit.
pub enum Behavior {
    Execute(AppDriver),
    Lint(LintDriver),
}

impl Behavior {
    pub fn for_mode(mode: Mode, config: &AppConfig) -> Self {
        match mode {
            Mode::App => Behavior::Execute(AppDriver::new(config.app())),
            Mode::Lint => Behavior::Lint(LintDriver::new(config)),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Behavior::Execute(_) => Mode::App,
            Behavior::Lint(_) => Mode::Lint,
        }
    }

    /// # Errors
    ///
    /// Only execution can fail; linting always yields a report.
    pub fn process(&mut self, unit: Unit) -> Result<Outcome, ExecutionError> {
        match self {
            Behavior::Execute(app) => app.execute(unit).map(Outcome::Executed),
            Behavior::Lint(lint) => Ok(Outcome::Linted(lint.lint(unit))),
        }
    }
}
