//! Scenario tests for the table-driven parser.
//!
//! These tests drive the full lexer and parser over small sources and check
//! the statements delivered to a recording [`Actions`] implementation.

use fidi_core::{Location, Value, error::{Diagnostic, ErrorCode}};

use crate::{
    Actions, Attribute, EdgeDecl, NodeDecl, ParserConfig, SyntaxError, grammar::Terminal, parse,
    parse_at,
};

#[derive(Debug, Default)]
struct Recorder {
    nodes: Vec<NodeDecl>,
    edges: Vec<EdgeDecl>,
    settings: Vec<Attribute>,
    diagnostics: Vec<Diagnostic>,
}

impl Actions for Recorder {
    fn declare_node(&mut self, decl: NodeDecl) {
        self.nodes.push(decl);
    }

    fn declare_edge(&mut self, decl: EdgeDecl) {
        self.edges.push(decl);
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        self.settings.push(attribute);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl Recorder {
    fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.inner().as_str()).collect()
    }

    fn edge_pairs(&self) -> Vec<(Option<&str>, &str)> {
        self.edges
            .iter()
            .map(|e| {
                (
                    e.source.as_ref().map(|s| s.inner().as_str()),
                    e.target.inner().as_str(),
                )
            })
            .collect()
    }

    fn codes(&self) -> Vec<Option<ErrorCode>> {
        self.diagnostics.iter().map(Diagnostic::code).collect()
    }
}

fn parse_with(source: &str, config: ParserConfig) -> (Recorder, Result<(), SyntaxError>) {
    let mut recorder = Recorder::default();
    let result = parse(source, &mut recorder, config);
    (recorder, result)
}

/// Parse with the default recovery budget and assert success.
fn assert_parses(source: &str) -> Recorder {
    let (recorder, result) = parse_with(source, ParserConfig::default());
    if let Err(err) = result {
        panic!("Expected parsing to succeed, but got error: {err}");
    }
    recorder
}

fn assert_strict_fails(source: &str) -> SyntaxError {
    let (_, result) = parse_with(source, ParserConfig::strict());
    match result {
        Ok(()) => panic!("Expected parsing to fail, but it succeeded"),
        Err(err) => err,
    }
}

#[test]
fn test_empty_input() {
    let recorder = assert_parses("");
    assert!(recorder.nodes.is_empty());
    assert!(recorder.edges.is_empty());

    let recorder = assert_parses("  // only a comment\n# and another\n");
    assert!(recorder.diagnostics.is_empty());
}

#[test]
fn test_node_declarations() {
    let recorder = assert_parses(".web []\n.db [engine = postgres, port = 5432, name = \"main\"]");
    assert_eq!(recorder.node_names(), vec!["web", "db"]);

    let db = &recorder.nodes[1];
    let attributes: Vec<_> = db
        .attributes
        .iter()
        .map(|a| (a.key.inner().as_str(), a.value.inner().clone()))
        .collect();
    assert_eq!(
        attributes,
        vec![
            ("engine", Value::Ident("postgres".to_string())),
            ("port", Value::Number(5432)),
            ("name", Value::Str("main".to_string())),
        ]
    );
}

#[test]
fn test_trailing_comma_in_attributes() {
    let recorder = assert_parses(".a [x = 1,]");
    assert_eq!(recorder.nodes[0].attributes.len(), 1);
}

#[test]
fn test_node_span_covers_declaration() {
    let recorder = assert_parses("\n  .web [port = 1]");
    let span = recorder.nodes[0].span;
    assert_eq!((span.line(), span.column()), (2, 3));
    assert_eq!(span.len(), ".web [port = 1]".len());
    assert_eq!(recorder.nodes[0].name.span().column(), 4);
}

#[test]
fn test_explicit_and_implicit_edges() {
    let recorder = assert_parses(".a []; .b []; a -> b; -> a;");
    assert_eq!(
        recorder.edge_pairs(),
        vec![(Some("a"), "b"), (None, "a")]
    );
}

#[test]
fn test_edge_options_and_payload() {
    let recorder = assert_parses("a -> b kind = notify sequence = 2 repeat = 3 { .c []; };");
    let edge = &recorder.edges[0];

    let options: Vec<_> = edge.options.iter().map(|o| o.key.inner().as_str()).collect();
    assert_eq!(options, vec!["kind", "sequence", "repeat"]);

    let payload = edge.payload.as_ref().expect("payload");
    assert_eq!(payload.inner(), " .c []; ");
    // Payload span covers only the text between the braces.
    assert_eq!(payload.span().column(), 47);
    assert_eq!(payload.span().len(), payload.inner().len());
}

#[test]
fn test_edge_span_excludes_semicolon() {
    let recorder = assert_parses("a -> b ;");
    assert_eq!(recorder.edges[0].span.range(), 0..6);
}

#[test]
fn test_settings() {
    let recorder = assert_parses("response = 404; log_info = \"hello\";");
    let settings: Vec<_> = recorder
        .settings
        .iter()
        .map(|s| (s.key.inner().as_str(), s.value.inner().clone()))
        .collect();
    assert_eq!(
        settings,
        vec![
            ("response", Value::Number(404)),
            ("log_info", Value::Str("hello".to_string())),
        ]
    );
}

#[test]
fn test_empty_statements_are_ignored() {
    let recorder = assert_parses(";;.a [];;");
    assert_eq!(recorder.node_names(), vec!["a"]);
}

#[test]
fn test_strict_error_reports_first_offending_token() {
    let err = assert_strict_fails(".a [];\n.b [x = ];");
    assert_eq!(err.code(), ErrorCode::E100);
    assert_eq!((err.line(), err.column()), (2, 9));
    assert_eq!(err.token(), "]");
    assert_eq!(
        err.expected(),
        &[Terminal::Identifier, Terminal::String, Terminal::Number]
    );
}

#[test]
fn test_strict_missing_semicolon_at_end() {
    let err = assert_strict_fails("a -> b");
    assert_eq!(err.code(), ErrorCode::E101);
    assert!(err.token().is_empty());
    assert!(err.expected().contains(&Terminal::Semicolon));
}

#[test]
fn test_strict_lexical_error_is_fatal() {
    let err = assert_strict_fails(".a [x = \"open]\n");
    assert_eq!(err.code(), ErrorCode::E001);
    assert_eq!((err.line(), err.column()), (1, 9));
}

#[test]
fn test_recovery_skips_to_semicolon() {
    let (recorder, result) = parse_with(
        ".a []; a b c; .b []; a -> b;",
        ParserConfig::default(),
    );
    assert!(result.is_ok());
    assert_eq!(recorder.node_names(), vec!["a", "b"]);
    assert_eq!(recorder.edge_pairs(), vec![(Some("a"), "b")]);
    assert_eq!(recorder.codes(), vec![Some(ErrorCode::E100)]);
}

#[test]
fn test_recovery_skips_to_closing_bracket() {
    let (recorder, result) = parse_with(".a [x = = 1] .b []", ParserConfig::default());
    assert!(result.is_ok());
    assert_eq!(recorder.node_names(), vec!["b"]);
    assert_eq!(recorder.diagnostics.len(), 1);
}

#[test]
fn test_partial_statement_never_reaches_actions() {
    let (recorder, _) = parse_with(".a [x = 1, y =];", ParserConfig::default());
    assert!(recorder.nodes.is_empty());
}

#[test]
fn test_recovery_budget_is_enforced() {
    let source = "x y; .a []; x y; .b []; x y;";
    let (recorder, result) = parse_with(source, ParserConfig::new(2));
    let err = result.expect_err("third error exceeds the budget");
    assert_eq!(recorder.diagnostics.len(), 2);
    assert_eq!(err.column(), 27);
}

#[test]
fn test_error_inside_brackets_is_reported_once() {
    let (recorder, result) = parse_with(".a [x = ;]\n.b [];", ParserConfig::new(1));
    assert!(result.is_ok());
    assert_eq!(recorder.codes(), vec![Some(ErrorCode::E100)]);
    assert_eq!(recorder.diagnostics[0].location().map(|l| l.column()), Some(9));
    assert_eq!(recorder.node_names(), vec!["b"]);
}

#[test]
fn test_follow_up_errors_stay_quiet_until_tokens_shift() {
    let (recorder, result) = parse_with("x y; x y; .a [];", ParserConfig::default());
    assert!(result.is_ok());
    assert_eq!(recorder.codes(), vec![Some(ErrorCode::E100)]);
    assert_eq!(recorder.node_names(), vec!["a"]);
}

#[test]
fn test_eof_while_synchronizing_is_fatal() {
    let (recorder, result) = parse_with(".a []; b c d", ParserConfig::default());
    let err = result.expect_err("no synchronizing token before end of input");
    assert_eq!(err.token(), "c");
    assert_eq!(recorder.node_names(), vec!["a"]);
}

#[test]
fn test_lexical_errors_are_reported_and_skipped() {
    let (recorder, result) = parse_with(".a [port = 80x]; .b @ [];", ParserConfig::default());
    assert!(result.is_ok());
    assert_eq!(
        recorder.codes(),
        vec![Some(ErrorCode::E004), Some(ErrorCode::E100), Some(ErrorCode::E002)]
    );
    assert_eq!(recorder.node_names(), vec!["b"]);
}

#[test]
fn test_origin_shifts_locations() {
    let mut recorder = Recorder::default();
    parse_at(
        "\n.inner []",
        Location::new(5, 20, 100),
        &mut recorder,
        ParserConfig::default(),
    )
    .expect("parses");
    let span = recorder.nodes[0].span;
    assert_eq!((span.line(), span.column(), span.start()), (6, 1, 101));
}

#[test]
fn test_keywords_are_plain_identifiers() {
    let recorder = assert_parses(".kind [] .sequence [] kind -> sequence kind = kind;");
    assert_eq!(recorder.edges[0].options.len(), 1);
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn identifier_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}"
    }

    fn source_fragment_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop::sample::select(vec![
                ".", "->", "=", ",", "[", "]", ";", "a", "b", "1", "\"s\"", "{ .x []; }", " ",
            ]),
            0..40,
        )
        .prop_map(|parts| parts.join(" "))
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_declarations_are_counted(names: &[String]) -> Result<(), TestCaseError> {
        let mut source = String::new();
        for name in names {
            source.push_str(&format!(".{name} []\n"));
        }
        for pair in names.windows(2) {
            source.push_str(&format!("{} -> {};\n", pair[0], pair[1]));
        }

        let (recorder, result) = parse_with(&source, ParserConfig::strict());
        prop_assert!(result.is_ok());
        prop_assert_eq!(recorder.nodes.len(), names.len());
        prop_assert_eq!(recorder.edges.len(), names.len().saturating_sub(1));
        Ok(())
    }

    /// Arbitrary token soup either parses or fails cleanly, never panics,
    /// and never exceeds the recovery budget.
    fn check_parser_terminates(source: &str) -> Result<(), TestCaseError> {
        let config = ParserConfig::new(4);
        let (recorder, _) = parse_with(source, config);
        let syntax_reports = recorder
            .codes()
            .into_iter()
            .filter(|code| *code == Some(ErrorCode::E100))
            .count();
        prop_assert!(syntax_reports <= config.max_recoveries());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn declarations_are_counted(names in prop::collection::vec(identifier_strategy(), 0..12)) {
            check_declarations_are_counted(&names)?;
        }

        #[test]
        fn parser_terminates(source in source_fragment_strategy()) {
            check_parser_terminates(&source)?;
        }
    }
}
