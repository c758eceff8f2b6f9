//! Integration tests for the Driver API
//!
//! Each test runs a complete unit through the public entry points and
//! checks what a caller observes.

use std::fs;

use proptest::prelude::*;
use tempfile::tempdir;

use fidi::{
    Driver, ExecutionError, FidiError, LintReport, Mode, Outcome, RequestHandler, Status, Trace,
    config::AppConfig,
};
use fidi_core::error::ErrorCode;

fn lint(source: &str) -> LintReport {
    match Driver::from_config(Mode::Lint, &AppConfig::default()).run(source) {
        Ok(Outcome::Linted(report)) => report,
        other => panic!("expected a lint report, got {other:?}"),
    }
}

fn execute(source: &str) -> Result<Trace, FidiError> {
    Driver::from_config(Mode::App, &AppConfig::default())
        .run(source)
        .map(|outcome| match outcome {
            Outcome::Executed(trace) => trace,
            Outcome::Linted(_) => panic!("app mode linted"),
        })
}

fn codes(report: &LintReport) -> Vec<ErrorCode> {
    report
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| diagnostic.code())
        .collect()
}

#[test]
fn test_counts_match_declarations() {
    let mut driver = Driver::from_config(Mode::Lint, &AppConfig::default());
    let graph = driver
        .parse(
            r#"
            .gateway [hostname = "gw", port = 80]
            .users []
            .orders []
            gateway -> users;
            gateway -> orders sequence = 2;
            orders -> users kind = lookup;
            "#,
        )
        .expect("valid unit");
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_simple_chain_lints_clean_and_executes_in_order() {
    let source = ".a []; .b []; a -> b;";
    assert!(lint(source).diagnostics().is_empty());

    let trace = execute(source).expect("executes");
    assert_eq!(trace.order(), vec!["a", "b"]);
}

#[test]
fn test_duplicate_edge() {
    let source = ".a []; .b []; a -> b; a -> b;";
    assert_eq!(codes(&lint(source)), vec![ErrorCode::E202]);

    assert!(matches!(
        execute(source),
        Err(FidiError::Execution(ExecutionError::Rejected { .. }))
    ));
}

#[test]
fn test_forward_reference_resolves() {
    let source = ".a []; a -> b; .b [];";
    assert!(lint(source).diagnostics().is_empty());
    assert_eq!(execute(source).expect("executes").order(), vec!["a", "b"]);
}

#[test]
fn test_undeclared_endpoint_single_diagnostic_at_edge() {
    let report = lint(".a [];\n  a -> b;");
    assert_eq!(report.diagnostics().len(), 1);

    let diagnostic = &report.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E200));
    assert!(diagnostic.message().contains("`b`"));
    let location = diagnostic.location().expect("located");
    assert_eq!((location.line(), location.column()), (2, 3));
}

#[test]
fn test_three_cycle() {
    let source = ".a []; .b []; .c []; a -> b; b -> c; c -> a;";
    assert_eq!(codes(&lint(source)), vec![ErrorCode::E300]);

    match execute(source) {
        Err(FidiError::Execution(ExecutionError::CycleDetected { path })) => {
            assert_eq!(path, vec!["a", "b", "c", "a"]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn test_cycles_allowed_by_config() {
    let config: AppConfig = toml::from_str("[app]\nallow_cycles = true").expect("valid config");
    let mut driver = Driver::from_config(Mode::App, &config);
    let outcome = driver
        .run(".a []; .b []; a -> b; b -> a;")
        .expect("cycles allowed");
    let trace = outcome.trace().expect("executed");
    assert_eq!(trace.order(), vec!["a", "b"]);
}

#[test]
fn test_strict_syntax_error_position() {
    let mut driver = Driver::from_config(Mode::Lint, &AppConfig::default().strict());
    match driver.run(".a [];\n.b [];\nb -> ;") {
        Err(FidiError::Syntax { err, src }) => {
            assert_eq!((err.line(), err.column()), (3, 6));
            assert_eq!(err.token(), ";");
            assert!(src.starts_with(".a"));
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_recovery_continues_after_bad_statement() {
    let report = lint(".a []; a -> -> b; .b []; a -> b;");
    assert_eq!(codes(&report), vec![ErrorCode::E100]);
}

#[test]
fn test_execution_trace_settings() {
    let trace = execute(
        r#"
        response = 202;
        predelay = 15;
        healthy = false;
        .api [url = "http://api.local/fidi"]
        .cache [hostname = cache, port = 6379]
        api -> cache repeat = 3;
        "#,
    )
    .expect("executes");

    assert_eq!(trace.response(), 202);
    assert_eq!(trace.predelay_ms(), 15);
    assert_eq!(trace.healthy(), Some(false));

    let call = &trace.steps()[0].stages()[0].calls()[0];
    assert_eq!(call.target(), "cache");
    assert_eq!(call.repeat(), 3);
    assert_eq!(call.address(), Some("http://cache:6379/fidi"));
}

#[test]
fn test_failure_stops_execution() {
    match execute(".a []; .b [fail = true]; .c []; a -> b; b -> c;") {
        Err(FidiError::Execution(ExecutionError::NodeFailed { node, trace, .. })) => {
            assert_eq!(node, "b");
            assert_eq!(trace.order(), vec!["a"]);
        }
        other => panic!("expected a node failure, got {other:?}"),
    }
}

#[test]
fn test_handler_with_config_file() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "[parser]\nmax_recoveries = 0\n").expect("write config");

    let config: AppConfig =
        toml::from_str(&fs::read_to_string(&path).expect("read config")).expect("valid config");
    let handler = RequestHandler::new(config);

    let response = handler.handle(".a [; .b [];", Mode::Lint);
    assert_eq!(response.status(), Status::SyntaxError);
    assert_eq!(response.code(), 400);
}

#[test]
fn test_drivers_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let source = format!(".n{i} []; .m{i} []; n{i} -> m{i};");
                execute(&source).map(|trace| trace.order().len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread").expect("executes"), 2);
    }
}

proptest! {
    #[test]
    fn chain_executes_in_declaration_order(len in 1usize..12) {
        let mut source = String::new();
        for i in 0..len {
            source.push_str(&format!(".n{i} []\n"));
        }
        for i in 1..len {
            source.push_str(&format!("n{} -> n{i};\n", i - 1));
        }

        let trace = execute(&source).expect("acyclic chain");
        let expected: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
        prop_assert_eq!(trace.order(), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn lint_diagnostics_are_sorted(names in proptest::collection::vec("[a-d]", 1..10)) {
        let mut source = String::from(".a []\n");
        for name in &names {
            source.push_str(&format!("a -> {name};\n"));
        }
        let report = lint(&source);
        let starts: Vec<_> = report
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.span().map(|span| span.start()))
            .collect();
        let mut sorted = starts.clone();
        sorted.sort();
        prop_assert_eq!(starts, sorted);
    }
}
