//! The driver owns one compilation unit from source text to outcome.
//!
//! It receives statements from the parser through [`Actions`], turns them
//! into graph mutations, and collects every recoverable problem as a
//! [`Diagnostic`]. Edges that mention a node declared further down are
//! deferred and retried once the whole unit has been read.

use std::mem;

use log::{debug, info, trace};

use fidi_core::{
    Attributes, Edge, EdgeDetails, Graph, Location, Node, Payload, Span, Spanned, Value,
    error::{Diagnostic, DiagnosticKind, ErrorCode},
};
use fidi_parser::{Actions, Attribute, EdgeDecl, Lexer, NodeDecl, Parser, ParserConfig, SyntaxError};

use crate::{
    behavior::{Behavior, Mode, Outcome, Unit},
    config::AppConfig,
    error::{ExecutionError, FidiError},
};

/// Builds and processes one compilation unit at a time.
///
/// # Examples
///
/// ```
/// use fidi::{Driver, Mode, config::AppConfig};
///
/// let mut driver = Driver::from_config(Mode::Lint, &AppConfig::default());
/// let graph = driver.parse(".a []; .b []; a -> b;").expect("valid source");
/// assert_eq!(graph.edge_count(), 1);
/// assert!(driver.diagnostics().is_empty());
/// ```
pub struct Driver {
    behavior: Behavior,
    parser: ParserConfig,
    graph: Graph,
    diagnostics: Vec<Diagnostic>,
    /// Edges waiting for an endpoint declared later in the unit.
    pending: Vec<Edge>,
    /// Implicit source for `-> target` statements.
    last_node: Option<String>,
    /// Implicit source when no node precedes the edge (the caller of a payload).
    origin: Option<String>,
    start: Location,
    /// Nodes visible to the unit without being declared in it.
    seed: Vec<Node>,
}

impl Driver {
    pub fn new(behavior: Behavior, parser: ParserConfig) -> Self {
        Self {
            behavior,
            parser,
            graph: Graph::new(),
            diagnostics: Vec::new(),
            pending: Vec::new(),
            last_node: None,
            origin: None,
            start: Location::default(),
            seed: Vec::new(),
        }
    }

    pub fn from_config(mode: Mode, config: &AppConfig) -> Self {
        Self::new(
            Behavior::for_mode(mode, config),
            config.parser().to_parser_config(),
        )
    }

    /// Treat the source as text nested in an edge to `caller`, starting at
    /// `start` in the enclosing file.
    pub fn with_origin(mut self, caller: impl Into<String>, start: Location) -> Self {
        self.origin = Some(caller.into());
        self.start = start;
        self
    }

    /// Make `nodes` resolvable from the unit without declaring them.
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.seed = nodes.into_iter().collect();
        self.reset();
        self
    }

    pub fn mode(&self) -> Mode {
        self.behavior.mode()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Everything reported so far for the current unit.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Parse `source` into a fresh graph.
    ///
    /// Recoverable problems are collected in [`Driver::diagnostics`];
    /// forward references are resolved before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] when the parser gives up.
    pub fn parse(&mut self, source: &str) -> Result<&Graph, SyntaxError> {
        self.reset();
        info!(bytes = source.len(), mode:% = self.mode(); "Parsing unit");

        let mut parser = Parser::new(Lexer::with_origin(source, self.start), self.parser);
        parser.parse(self)?;
        trace!(recoveries = parser.recoveries(); "Parser finished");

        if let Err(failures) = self.resolve_forward_references() {
            debug!(count = failures.len(); "Forward references left unresolved");
        }

        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            diagnostics = self.diagnostics.len();
            "Unit parsed"
        );
        Ok(&self.graph)
    }

    /// Declare a node.
    ///
    /// # Errors
    ///
    /// [`DiagnosticKind::DuplicateDeclaration`] if the name is taken; the
    /// first declaration stays.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        attributes: Attributes,
        span: Span,
    ) -> Result<(), DiagnosticKind> {
        self.graph.insert_node(Node::new(name, attributes, span))
    }

    /// Insert an edge between declared nodes.
    ///
    /// # Errors
    ///
    /// [`DiagnosticKind::UnresolvedReference`] for an undeclared endpoint,
    /// [`DiagnosticKind::DuplicateEdge`] for an equivalent existing edge.
    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        details: EdgeDetails,
        span: Span,
    ) -> Result<(), DiagnosticKind> {
        self.graph
            .insert_edge(Edge::new(source, target, details, span))
    }

    /// Retry every deferred edge. Failures are reported as diagnostics and
    /// also returned.
    ///
    /// # Errors
    ///
    /// Every failure, in the order the edges were declared.
    pub fn resolve_forward_references(&mut self) -> Result<(), Vec<DiagnosticKind>> {
        let pending = mem::take(&mut self.pending);
        let mut failures = Vec::new();

        for edge in pending {
            let span = edge.span();
            let missing: Vec<String> = self
                .graph
                .missing_endpoints(&edge)
                .into_iter()
                .map(str::to_string)
                .collect();

            if missing.is_empty() {
                if let Err(kind) = self.graph.insert_edge(edge) {
                    failures.push(kind.clone());
                    self.report_kind(kind, span);
                }
                continue;
            }
            for name in missing {
                let kind = DiagnosticKind::UnresolvedReference { name };
                failures.push(kind.clone());
                self.report_kind(kind, span);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// Hand the graph over, leaving an empty one behind.
    pub fn finalize(&mut self) -> Graph {
        mem::take(&mut self.graph)
    }

    /// Run the behavior on `graph` together with the diagnostics collected
    /// while it was built.
    ///
    /// # Errors
    ///
    /// See [`Behavior::process`].
    pub fn process(&mut self, graph: Graph) -> Result<Outcome, ExecutionError> {
        let diagnostics = mem::take(&mut self.diagnostics);
        self.behavior.process(Unit::new(graph, diagnostics))
    }

    /// Parse, finalize and process `source`.
    ///
    /// # Errors
    ///
    /// [`FidiError::Syntax`] if parsing fails, [`FidiError::Execution`] if
    /// the behavior does.
    pub fn run(&mut self, source: &str) -> Result<Outcome, FidiError> {
        self.parse(source)
            .map_err(|err| FidiError::new_syntax_error(err, source))?;
        let graph = self.finalize();
        Ok(self.process(graph)?)
    }

    fn reset(&mut self) {
        self.graph = Graph::new();
        for node in &self.seed {
            if let Err(kind) = self.graph.insert_node(node.clone()) {
                debug!(kind:%; "Skipping seed node");
            }
        }
        self.diagnostics.clear();
        self.pending.clear();
        self.last_node = None;
    }

    fn report_kind(&mut self, kind: DiagnosticKind, span: Span) {
        debug!(code:% = kind.code(), location:% = span.location(); "{kind}");
        self.diagnostics.push(kind.into_diagnostic(span));
    }

    /// Fold edge options into details, reporting unknown keys and bad values.
    fn edge_details(
        &mut self,
        options: Vec<Attribute>,
        payload: Option<Spanned<String>>,
    ) -> EdgeDetails {
        let mut details = EdgeDetails::default();

        for option in options {
            let span = option.key.span().union(option.value.span());
            let key = option.key.into_inner();
            let value = option.value.inner();

            let accepted = match key.as_str() {
                "kind" => value
                    .as_str()
                    .filter(|kind| !kind.is_empty())
                    .map(|kind| details = mem::take(&mut details).with_kind(kind)),
                "sequence" => positive(value)
                    .map(|sequence| details = mem::take(&mut details).with_sequence(sequence)),
                "repeat" => positive(value)
                    .map(|repeat| details = mem::take(&mut details).with_repeat(repeat)),
                _ => {
                    self.diagnostics.push(
                        Diagnostic::warning(format!("unknown edge option `{key}`"))
                            .with_code(ErrorCode::E204)
                            .with_label(span, "ignored")
                            .with_help("edge options are `kind`, `sequence` and `repeat`"),
                    );
                    continue;
                }
            };

            if accepted.is_none() {
                let expected = if key == "kind" {
                    "a non-empty name"
                } else {
                    "a positive integer"
                };
                self.diagnostics.push(
                    Diagnostic::error(format!("invalid value `{value}` for edge option `{key}`"))
                        .with_code(ErrorCode::E203)
                        .with_label(span, format!("expected {expected}"))
                        .with_help("the default is used instead"),
                );
            }
        }

        match payload {
            Some(payload) => {
                let span = payload.span();
                details.with_payload(Payload::new(payload.into_inner(), span))
            }
            None => details,
        }
    }
}

fn positive(value: &Value) -> Option<u32> {
    value
        .as_number()
        .and_then(|number| u32::try_from(number).ok())
        .filter(|&number| number > 0)
}

impl Actions for Driver {
    fn declare_node(&mut self, decl: NodeDecl) {
        let name = decl.name.into_inner();
        let attributes: Attributes = decl
            .attributes
            .into_iter()
            .map(|attribute| (attribute.key.into_inner(), attribute.value.into_inner()))
            .collect();

        trace!(name = name.as_str(); "Declaring node");
        if let Err(kind) = self.add_node(name.clone(), attributes, decl.span) {
            self.report_kind(kind, decl.span);
        }
        self.last_node = Some(name);
    }

    fn declare_edge(&mut self, decl: EdgeDecl) {
        let target = decl.target.into_inner();
        let source = match decl.source {
            Some(source) => source.into_inner(),
            None => match self.last_node.as_ref().or(self.origin.as_ref()) {
                Some(source) => source.clone(),
                None => {
                    self.report_kind(DiagnosticKind::MissingSource { to: target }, decl.span);
                    return;
                }
            },
        };

        let details = self.edge_details(decl.options, decl.payload);
        let edge = Edge::new(source, target, details, decl.span);

        // An equivalent edge still waiting on a forward reference was seen
        // first, so this one has to queue up behind it.
        let queued = self
            .pending
            .iter()
            .any(|pending| pending.key() == edge.key());

        if !queued && self.graph.missing_endpoints(&edge).is_empty() {
            if let Err(kind) = self.graph.insert_edge(edge) {
                self.report_kind(kind, decl.span);
            }
        } else {
            trace!(source = edge.source(), target = edge.target(); "Deferring edge");
            self.pending.push(edge);
        }
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        let span = attribute.key.span().union(attribute.value.span());
        let key = attribute.key.into_inner();
        let value = Spanned::new(attribute.value.into_inner(), span);

        if let Some(previous) = self.graph.set_setting(key.clone(), value) {
            self.diagnostics.push(
                Diagnostic::warning(format!("setting `{key}` is assigned more than once"))
                    .with_code(ErrorCode::E205)
                    .with_label(span, "this value is used")
                    .with_secondary_label(previous.span(), "previously assigned here")
                    .with_help("the last assignment wins"),
            );
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use fidi_core::error::Severity;

    use super::*;

    fn lint_driver() -> Driver {
        Driver::from_config(Mode::Lint, &AppConfig::default())
    }

    fn codes(driver: &Driver) -> Vec<Option<ErrorCode>> {
        driver.diagnostics().iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn test_counts_match_declarations() {
        let mut driver = lint_driver();
        let graph = driver
            .parse(".a []; .b []; .c []; a -> b; b -> c; a -> c;")
            .expect("parses");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_forward_reference_resolves() {
        let mut driver = lint_driver();
        let graph = driver.parse(".a []; a -> b; .b [];").expect("parses");
        assert_eq!(graph.edge_count(), 1);
        assert!(driver.diagnostics().is_empty());
    }

    #[test]
    fn test_undeclared_endpoint_reported_once_at_edge() {
        let mut driver = lint_driver();
        driver.parse(".a [];\na -> b;").expect("parses");

        assert_eq!(codes(&driver), vec![Some(ErrorCode::E200)]);
        let diagnostic = &driver.diagnostics()[0];
        assert!(diagnostic.message().contains("`b`"));
        assert_eq!(diagnostic.location(), Some(Location::new(2, 1, 7)));
    }

    #[test]
    fn test_duplicate_edge_reported_once() {
        let mut driver = lint_driver();
        let graph = driver
            .parse(".a []; .b []; a -> b; a -> b; a -> b kind = notify;")
            .expect("parses");
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(codes(&driver), vec![Some(ErrorCode::E202)]);
    }

    #[test]
    fn test_duplicate_of_deferred_edge_keeps_first() {
        let mut driver = lint_driver();
        let graph = driver
            .parse(".a [];\na -> b;\n.b [];\na -> b sequence = 2;")
            .expect("parses");

        assert_eq!(graph.edge_count(), 1);
        let kept = &graph.edges()[0];
        assert_eq!(kept.details().sequence(), 1);
        assert_eq!(kept.span().start(), 7);

        assert_eq!(codes(&driver), vec![Some(ErrorCode::E202)]);
        let diagnostic = &driver.diagnostics()[0];
        assert_eq!(diagnostic.location(), Some(Location::new(4, 1, 22)));
        let secondary = diagnostic
            .labels()
            .iter()
            .find(|label| !label.is_primary())
            .expect("first declaration is labelled");
        assert_eq!(secondary.span().start(), 7);
    }

    #[test]
    fn test_duplicate_declaration_keeps_first() {
        let mut driver = lint_driver();
        let graph = driver.parse(".a [x = 1]; .a [x = 2];").expect("parses");
        assert_eq!(graph.node("a").and_then(|n| n.attribute("x")), Some(&Value::Number(1)));
        assert_eq!(driver.diagnostics()[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_implicit_source_is_last_declared_node() {
        let mut driver = lint_driver();
        let graph = driver.parse(".a []; .b []; -> a;").expect("parses");
        let edge = &graph.edges()[0];
        assert_eq!((edge.source(), edge.target()), ("b", "a"));
    }

    #[test]
    fn test_implicit_source_falls_back_to_origin() {
        let mut driver = lint_driver()
            .with_origin("caller", Location::default())
            .with_nodes([Node::new("caller", Attributes::new(), Span::default())]);
        let graph = driver.parse("-> caller;").expect("parses");
        assert_eq!(graph.edges()[0].source(), "caller");
    }

    #[test]
    fn test_implicit_source_without_any_node() {
        let mut driver = lint_driver();
        let graph = driver.parse("-> a; .a [];").expect("parses");
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(codes(&driver), vec![Some(ErrorCode::E206)]);
    }

    #[test]
    fn test_edge_options() {
        let mut driver = lint_driver();
        let graph = driver
            .parse(".a []; .b []; a -> b kind = \"notify\" sequence = 3 repeat = 2;")
            .expect("parses");
        let details = graph.edges()[0].details();
        assert_eq!(details.kind(), "notify");
        assert_eq!(details.sequence(), 3);
        assert_eq!(details.repeat(), 2);
    }

    #[test]
    fn test_bad_and_unknown_options() {
        let mut driver = lint_driver();
        let graph = driver
            .parse(".a []; .b []; a -> b sequence = 0 repeat = many color = red;")
            .expect("parses");
        let details = graph.edges()[0].details();
        assert_eq!((details.sequence(), details.repeat()), (1, 1));
        assert_eq!(
            codes(&driver),
            vec![Some(ErrorCode::E203), Some(ErrorCode::E203), Some(ErrorCode::E204)]
        );
    }

    #[test]
    fn test_payload_span_points_inside_braces() {
        let mut driver = lint_driver();
        let graph = driver.parse(".a []; .b []; a -> b { .c []; };").expect("parses");
        let payload = graph.edges()[0].details().payload().expect("payload");
        assert_eq!(payload.text(), " .c []; ");
        assert_eq!(payload.span().start(), 22);
    }

    #[test]
    fn test_settings_last_assignment_wins() {
        let mut driver = lint_driver();
        let graph = driver.parse("response = 200; response = 503;").expect("parses");
        assert_eq!(graph.setting("response"), Some(&Value::Number(503)));
        assert_eq!(codes(&driver), vec![Some(ErrorCode::E205)]);
    }

    #[test]
    fn test_add_node_and_edge_directly() {
        let mut driver = lint_driver();
        driver.add_node("a", Attributes::new(), Span::default()).expect("new");
        assert!(matches!(
            driver.add_edge("a", "b", EdgeDetails::default(), Span::default()),
            Err(DiagnosticKind::UnresolvedReference { ref name }) if name == "b"
        ));
        driver.add_node("b", Attributes::new(), Span::default()).expect("new");
        driver
            .add_edge("a", "b", EdgeDetails::default(), Span::default())
            .expect("both declared");
        assert!(matches!(
            driver.add_edge("a", "b", EdgeDetails::default(), Span::default()),
            Err(DiagnosticKind::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn test_parse_resets_previous_unit() {
        let mut driver = lint_driver();
        driver.parse(".a []; a -> nowhere;").expect("parses");
        assert!(!driver.diagnostics().is_empty());

        let graph = driver.parse(".b [];").expect("parses");
        assert!(graph.node("a").is_none());
        assert!(driver.diagnostics().is_empty());
    }

    #[test]
    fn test_strict_syntax_error() {
        let mut driver = Driver::from_config(Mode::Lint, &AppConfig::default().strict());
        let err = driver.parse(".a [];\n.b [x = ];").expect_err("strict");
        assert_eq!((err.line(), err.column()), (2, 9));
    }

    #[test]
    fn test_finalize_leaves_empty_graph() {
        let mut driver = lint_driver();
        driver.parse(".a [];").expect("parses");
        let graph = driver.finalize();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(driver.graph().node_count(), 0);
    }

    #[test]
    fn test_driver_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Driver>();
    }
}
