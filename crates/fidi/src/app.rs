//! The `app` behavior: execute a unit's graph.
//!
//! Nodes run in topological order (ties broken by declaration order). For
//! each node the [`AppDriver`] resolves its outgoing call stages and hands
//! them to a [`NodeExecutor`]. The default [`TraceExecutor`] performs no I/O
//! and only records what would be called, which makes execution
//! deterministic and testable.
//!
//! Top-level settings shape the resulting [`Trace`]:
//!
//! | setting     | effect                                              |
//! |-------------|-----------------------------------------------------|
//! | `response`  | response code reported for the unit (default 200)   |
//! | `predelay`  | milliseconds to wait before the calls are issued    |
//! | `postdelay` | milliseconds to wait after the calls completed      |
//! | `timeout_sec`, `timeout_usec` | timeout for the calls nodes issue |
//! | `healthy`   | health flag reported alongside the response         |
//! | `log_<lvl>` | message logged at `error`, `warn`, `info`, ...      |
//!
//! A unit whose settings or node addresses fail the value checks is
//! rejected before anything runs.

use log::{Level, debug, info, log, warn};
use serde::Serialize;

use fidi_core::{CallStage, Graph, Node, Value, error::DiagnosticKind};

use crate::{behavior::Unit, checks, config::AppSection, error::ExecutionError};

/// Response code used when the unit does not set `response`.
pub const DEFAULT_RESPONSE: i64 = 200;

/// Path appended to `http://<hostname>:<port>` when a node has no `path`.
pub const DEFAULT_PATH: &str = "/fidi";

/// One outgoing call, issued `repeat` times in parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    target: String,
    kind: String,
    repeat: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    has_payload: bool,
}

impl Call {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Where the target can be reached, if its attributes say so.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn has_payload(&self) -> bool {
        self.has_payload
    }
}

/// Calls sharing a sequence number. A stage completes before the next starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    sequence: u32,
    calls: Vec<Call>,
}

impl Stage {
    fn resolve(graph: &Graph, stage: &CallStage<'_>) -> Self {
        let calls = stage
            .calls()
            .iter()
            .map(|edge| Call {
                target: edge.target().to_string(),
                kind: edge.kind().to_string(),
                repeat: edge.details().repeat(),
                address: graph.node(edge.target()).and_then(address),
                has_payload: edge.details().payload().is_some(),
            })
            .collect();
        Self {
            sequence: stage.sequence(),
            calls,
        }
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Total number of calls in flight during this stage.
    pub fn fan_out(&self) -> u32 {
        self.calls.iter().map(Call::repeat).sum()
    }
}

/// One executed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    node: String,
    stages: Vec<Stage>,
}

impl Step {
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// The result of executing a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    steps: Vec<Step>,
    response: i64,
    predelay_ms: u64,
    postdelay_ms: u64,
    /// From `timeout_sec` and `timeout_usec`, for calls the nodes issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    call_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    healthy: Option<bool>,
}

impl Trace {
    fn from_settings(graph: &Graph) -> Self {
        let unsigned = |key: &str| {
            graph
                .setting(key)
                .and_then(Value::as_number)
                .and_then(|number| u64::try_from(number).ok())
        };
        let millis = |key: &str| unsigned(key).unwrap_or(0);
        let call_timeout_ms = match (unsigned("timeout_sec"), unsigned("timeout_usec")) {
            (None, None) => None,
            (seconds, micros) => Some(
                seconds
                    .unwrap_or(0)
                    .saturating_mul(1000)
                    .saturating_add(micros.unwrap_or(0) / 1000),
            ),
        };
        Self {
            steps: Vec::new(),
            response: graph
                .setting("response")
                .and_then(Value::as_number)
                .unwrap_or(DEFAULT_RESPONSE),
            predelay_ms: millis("predelay"),
            postdelay_ms: millis("postdelay"),
            call_timeout_ms,
            healthy: graph.setting("healthy").and_then(Value::as_bool),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Names of the executed nodes, in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.steps.iter().map(Step::node).collect()
    }

    pub fn response(&self) -> i64 {
        self.response
    }

    pub fn predelay_ms(&self) -> u64 {
        self.predelay_ms
    }

    pub fn postdelay_ms(&self) -> u64 {
        self.postdelay_ms
    }

    pub fn call_timeout_ms(&self) -> Option<u64> {
        self.call_timeout_ms
    }

    pub fn healthy(&self) -> Option<bool> {
        self.healthy
    }
}

/// Performs the work of one node.
///
/// Returning `Err` aborts the unit; the message ends up in
/// [`ExecutionError::NodeFailed`].
pub trait NodeExecutor: Send {
    fn execute(&mut self, node: &Node, stages: &[Stage]) -> Result<(), String>;
}

/// Executor that performs no I/O.
///
/// A node whose `fail` attribute is truthy fails, with the attribute's text
/// as message when it is a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceExecutor;

impl NodeExecutor for TraceExecutor {
    fn execute(&mut self, node: &Node, _stages: &[Stage]) -> Result<(), String> {
        match node.attribute("fail") {
            Some(Value::Str(message)) => Err(message.clone()),
            Some(flag) if flag.as_bool() == Some(true) => {
                Err("failure requested by the `fail` attribute".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Executes units in topological order.
pub struct AppDriver {
    allow_cycles: bool,
    require_address: bool,
    executor: Box<dyn NodeExecutor>,
}

impl AppDriver {
    pub fn new(config: &AppSection) -> Self {
        Self {
            allow_cycles: config.allow_cycles(),
            require_address: config.require_address(),
            executor: Box::new(TraceExecutor),
        }
    }

    pub fn with_executor(mut self, executor: impl NodeExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    pub fn allow_cycles(&self) -> bool {
        self.allow_cycles
    }

    /// Execute a parsed unit.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::Rejected`] if the unit has error diagnostics.
    /// - [`ExecutionError::CycleDetected`] for cyclic graphs unless cycles
    ///   are allowed.
    /// - [`ExecutionError::NodeFailed`] at the first failing node.
    pub fn execute(&mut self, unit: Unit) -> Result<Trace, ExecutionError> {
        let (graph, mut diagnostics) = unit.into_parts();
        checks::settings(&graph, &mut diagnostics);
        checks::addresses(&graph, self.require_address, &mut diagnostics);

        let errors: Vec<_> = diagnostics
            .into_iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
            .collect();
        if !errors.is_empty() {
            warn!(errors = errors.len(); "Refusing to execute unit with errors");
            return Err(ExecutionError::Rejected {
                diagnostics: errors,
            });
        }

        let order = if self.allow_cycles {
            graph.relaxed_topological_order()
        } else {
            match graph.topological_order() {
                Ok(order) => order,
                Err(DiagnosticKind::CycleDetected { path }) => {
                    return Err(ExecutionError::CycleDetected { path });
                }
                Err(other) => {
                    return Err(ExecutionError::Rejected {
                        diagnostics: vec![other.into_diagnostic(Default::default())],
                    });
                }
            }
        };

        let mut trace = Trace::from_settings(&graph);
        info!(
            nodes = order.len(),
            response = trace.response;
            "Executing unit"
        );

        for node in order {
            let stages: Vec<Stage> = graph
                .call_stages(node.name())
                .iter()
                .map(|stage| Stage::resolve(&graph, stage))
                .collect();
            debug!(node = node.name(), stages = stages.len(); "Executing node");

            if let Err(message) = self.executor.execute(node, &stages) {
                warn!(node = node.name(), message:%; "Node failed");
                return Err(ExecutionError::NodeFailed {
                    node: node.name().to_string(),
                    message,
                    trace: Box::new(trace),
                });
            }
            trace.steps.push(Step {
                node: node.name().to_string(),
                stages,
            });
        }

        emit_log_settings(&graph);
        Ok(trace)
    }
}

/// Where `node` can be reached: its `url`, or `http://<hostname>:<port><path>`.
fn address(node: &Node) -> Option<String> {
    if let Some(url) = node.attribute("url") {
        return Some(url.to_string());
    }
    let hostname = node.attribute("hostname")?;
    let port = node.attribute("port")?;
    let path = node
        .attribute("path")
        .map_or_else(|| DEFAULT_PATH.to_string(), Value::to_string);
    Some(format!("http://{hostname}:{port}{path}"))
}

fn log_level(name: &str) -> Option<Level> {
    match name {
        "error" | "fatal" | "critical" => Some(Level::Error),
        "warn" | "warning" => Some(Level::Warn),
        "info" | "information" | "notice" => Some(Level::Info),
        "debug" => Some(Level::Debug),
        "trace" => Some(Level::Trace),
        _ => None,
    }
}

/// Emit every `log_<level> = "message"` setting through the logger.
fn emit_log_settings(graph: &Graph) {
    for (key, value) in graph.settings() {
        let Some(level) = key.strip_prefix("log_") else {
            continue;
        };
        match log_level(level) {
            Some(level) => log!(target: "fidi::unit", level, "{}", value.inner()),
            None => debug!(setting = key.as_str(); "Ignoring unknown log level"),
        }
    }
}
