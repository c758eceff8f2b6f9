//! The `lint` behavior: structural checks without execution.
//!
//! Linting never fails. Everything it finds, together with what was
//! reported while the unit was built, ends up in a [`LintReport`] sorted by
//! source position. Edge payloads are linted as nested units whose
//! statements default to the payload's receiver as source; their
//! diagnostics carry positions in the enclosing file.

use log::{debug, info};

use fidi_core::{
    Edge, EdgeComparison, Graph,
    error::{Diagnostic, DiagnosticKind, ErrorCode},
};
use fidi_parser::ParserConfig;

use crate::{
    behavior::{Behavior, Outcome, Unit},
    checks,
    config::{AppConfig, LintSection},
    driver::Driver,
    error::FidiError,
};

/// Diagnostics for one unit and its rendering in DOT.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    diagnostics: Vec<Diagnostic>,
    dot: String,
}

impl LintReport {
    /// Sorted by source position; diagnostics without a location come last.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn dot(&self) -> &str {
        &self.dot
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Runs the structural checks.
#[derive(Debug, Clone)]
pub struct LintDriver {
    config: LintSection,
    parser: ParserConfig,
    require_address: bool,
    /// Payload nesting level of the units this driver lints.
    depth: usize,
}

impl LintDriver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.lint().clone(),
            parser: config.parser().to_parser_config(),
            require_address: config.app().require_address(),
            depth: 0,
        }
    }

    /// A driver for the payloads of the units this one lints.
    pub fn nested(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn lint(&mut self, unit: Unit) -> LintReport {
        let (graph, mut diagnostics) = unit.into_parts();

        let mut found = Vec::new();
        duplicate_edges(&graph, &mut found);
        dangling_references(&graph, &mut found);
        found.retain(|diagnostic| !already_reported(&diagnostics, diagnostic));
        diagnostics.append(&mut found);

        cycles(&graph, &mut diagnostics);
        checks::settings(&graph, &mut diagnostics);
        // Nested units see the enclosing nodes, which are checked at the top.
        if self.depth == 0 {
            checks::addresses(&graph, self.require_address, &mut diagnostics);
            if self.config.unused_nodes() {
                unused_nodes(&graph, &mut diagnostics);
            }
        }
        if self.config.payloads() {
            self.payloads(&graph, &mut diagnostics);
        }

        diagnostics.sort_by_key(|diagnostic| {
            let span = diagnostic.span();
            (span.is_none(), span.map(|span| span.start()))
        });

        info!(
            depth = self.depth,
            diagnostics = diagnostics.len();
            "Lint finished"
        );
        LintReport {
            diagnostics,
            dot: if self.depth == 0 {
                graph.to_dot()
            } else {
                String::new()
            },
        }
    }

    fn payloads(&self, graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
        for edge in graph.edges() {
            let Some(payload) = edge.details().payload() else {
                continue;
            };

            if self.depth >= self.config.max_payload_depth() {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "payload nested deeper than {} levels is not checked",
                        self.config.max_payload_depth()
                    ))
                    .with_code(ErrorCode::E302)
                    .with_label(payload.span(), "not linted")
                    .with_help("raise `max_payload_depth` in the `[lint]` section"),
                );
                continue;
            }

            debug!(
                source = edge.source(),
                target = edge.target(),
                depth = self.depth + 1;
                "Linting payload"
            );
            let mut driver = Driver::new(Behavior::Lint(self.nested()), self.parser)
                .with_origin(edge.target(), payload.span().location())
                .with_nodes(graph.nodes().cloned());

            match driver.run(payload.text()) {
                Ok(Outcome::Linted(report)) => diagnostics.extend(report.into_diagnostics()),
                Ok(Outcome::Executed(_)) => {}
                Err(FidiError::Syntax { err, .. }) => {
                    diagnostics.extend(driver.diagnostics().iter().cloned());
                    diagnostics.push(err.to_diagnostic());
                }
                Err(err) => diagnostics.push(
                    Diagnostic::error(format!("payload could not be linted: {err}"))
                        .with_label(payload.span(), "in this payload"),
                ),
            }
        }
    }
}

fn already_reported(reported: &[Diagnostic], diagnostic: &Diagnostic) -> bool {
    reported.iter().any(|existing| {
        existing.code() == diagnostic.code() && existing.span() == diagnostic.span()
    })
}

/// Equivalent edges are adjacent once sorted canonically.
fn duplicate_edges(graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
    let mut edges: Vec<Edge> = graph.edges().to_vec();
    EdgeComparison::sort(&mut edges);

    for pair in edges.windows(2) {
        let [first, second] = pair else {
            continue;
        };
        if EdgeComparison::equivalent(first, second) {
            let (from, to, kind) = second.key();
            let kind = DiagnosticKind::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
                kind: kind.to_string(),
                first: first.span(),
            };
            diagnostics.push(kind.into_diagnostic(second.span()));
        }
    }
}

fn dangling_references(graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
    for edge in graph.edges() {
        for name in graph.missing_endpoints(edge) {
            let kind = DiagnosticKind::UnresolvedReference {
                name: name.to_string(),
            };
            diagnostics.push(kind.into_diagnostic(edge.span()));
        }
    }
}

fn cycles(graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
    for path in graph.cycles() {
        let span = graph.closing_edge(&path).map(Edge::span);
        let kind = DiagnosticKind::CycleDetected { path };
        debug!(cycle:% = kind; "Cycle found");

        let diagnostic = match span {
            Some(span) => kind.into_diagnostic(span),
            None => Diagnostic::error(kind.to_string()).with_code(kind.code()),
        };
        diagnostics.push(diagnostic);
    }
}

fn unused_nodes(graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        let name = node.name();
        if !graph.edges_from(name).is_empty() || graph.edges_to(name).next().is_some() {
            continue;
        }
        diagnostics.push(
            Diagnostic::warning(format!("node `{name}` is never called and calls nothing"))
                .with_code(ErrorCode::E301)
                .with_label(node.span(), "unused node")
                .with_help("connect it with an edge or remove it"),
        );
    }
}
