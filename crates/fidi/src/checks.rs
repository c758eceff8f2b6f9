//! Value checks on settings and node addresses.
//!
//! These run in both modes: lint reports what they find, app mode refuses
//! to execute a unit with any of it.

use std::ops::RangeInclusive;

use fidi_core::{
    Graph, Node, Value,
    error::{Diagnostic, ErrorCode},
};

/// Accepted values of the `response` setting.
pub const RESPONSE_CODES: RangeInclusive<i64> = 1..=599;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Check `response`, the delays and the call timeout.
pub fn settings(graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
    for (key, value) in graph.settings() {
        let span = value.span();
        let value = value.inner();

        match key.as_str() {
            "response" => {
                if value.as_number().is_some_and(|code| RESPONSE_CODES.contains(&code)) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(format!("`{value}` is not an HTTP response code"))
                        .with_code(ErrorCode::E303)
                        .with_label(span, "expected a number between 1 and 599"),
                );
            }
            "predelay" | "postdelay" | "timeout_sec" => {
                if value.as_number().is_some_and(|number| number >= 0) {
                    continue;
                }
                let unit = if key == "timeout_sec" {
                    "seconds"
                } else {
                    "milliseconds"
                };
                diagnostics.push(
                    Diagnostic::error(format!("invalid value `{value}` for `{key}`"))
                        .with_code(ErrorCode::E306)
                        .with_label(span, format!("expected a non-negative number of {unit}")),
                );
            }
            "timeout_usec" => {
                if value
                    .as_number()
                    .is_some_and(|micros| (0..MICROS_PER_SECOND).contains(&micros))
                {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(format!("invalid value `{value}` for `timeout_usec`"))
                        .with_code(ErrorCode::E306)
                        .with_label(span, "expected microseconds below one million")
                        .with_help("whole seconds go into `timeout_sec`"),
                );
            }
            _ => {}
        }
    }
}

/// Check `hostname` and `port` of every node, and with `require` also that
/// each node can be reached at all.
pub fn addresses(graph: &Graph, require: bool, diagnostics: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        if let Some(port) = node
            .attribute("port")
            .filter(|port| port_number(port).is_none())
        {
            diagnostics.push(invalid_attribute(
                node,
                "port",
                port,
                "ports are numbers between 1 and 65535",
            ));
        }

        if let Some(hostname) = node.attribute("hostname").filter(|hostname| {
            hostname
                .as_str()
                .is_none_or(|host| host.is_empty() || host.contains('"'))
        }) {
            diagnostics.push(invalid_attribute(
                node,
                "hostname",
                hostname,
                "hostnames are non-empty and contain no double quotes",
            ));
        }

        if require && !has_address(node) {
            diagnostics.push(
                Diagnostic::error(format!("node `{}` has no address", node.name()))
                    .with_code(ErrorCode::E304)
                    .with_label(node.span(), "declared here")
                    .with_help("add a `url`, or both `hostname` and `port`"),
            );
        }
    }
}

/// A port given as a number or as a numeric string.
pub fn port_number(value: &Value) -> Option<u16> {
    let port = match value {
        Value::Number(number) => u16::try_from(*number).ok(),
        Value::Str(text) => text.parse().ok(),
        Value::Ident(_) => None,
    };
    port.filter(|&port| port > 0)
}

fn has_address(node: &Node) -> bool {
    node.attribute("url").is_some()
        || (node.attribute("hostname").is_some() && node.attribute("port").is_some())
}

fn invalid_attribute(node: &Node, key: &str, value: &Value, help: &str) -> Diagnostic {
    Diagnostic::error(format!(
        "invalid `{key}` value `{value}` for node `{}`",
        node.name()
    ))
    .with_code(ErrorCode::E305)
    .with_label(node.span(), "declared here")
    .with_help(help)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{behavior::Mode, config::AppConfig, driver::Driver};

    fn graph(source: &str) -> Graph {
        let mut driver = Driver::from_config(Mode::Lint, &AppConfig::default());
        driver.parse(source).expect("parses");
        driver.finalize()
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<Option<ErrorCode>> {
        diagnostics.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn test_response_code_range() {
        for (source, expected) in [
            ("response = 200;", vec![]),
            ("response = 599;", vec![]),
            ("response = 0;", vec![Some(ErrorCode::E303)]),
            ("response = 1000;", vec![Some(ErrorCode::E303)]),
            ("response = ok;", vec![Some(ErrorCode::E303)]),
        ] {
            let mut diagnostics = Vec::new();
            settings(&graph(source), &mut diagnostics);
            assert_eq!(codes(&diagnostics), expected, "{source}");
        }
    }

    #[test]
    fn test_timing_settings() {
        let mut diagnostics = Vec::new();
        settings(
            &graph("predelay = 5; postdelay = -1; timeout_sec = 2; timeout_usec = 1000000;"),
            &mut diagnostics,
        );
        assert_eq!(
            codes(&diagnostics),
            vec![Some(ErrorCode::E306), Some(ErrorCode::E306)]
        );
        assert!(diagnostics[0].message().contains("`postdelay`"));
    }

    #[test]
    fn test_port_and_hostname_values() {
        let mut diagnostics = Vec::new();
        addresses(
            &graph(".a [hostname = \"a\", port = 8080]\n.b [hostname = \"b\", port = http]\n.c [hostname = \"\", port = \"70000\"]"),
            false,
            &mut diagnostics,
        );
        assert_eq!(
            codes(&diagnostics),
            vec![Some(ErrorCode::E305), Some(ErrorCode::E305), Some(ErrorCode::E305)]
        );
        assert_eq!(diagnostics[0].location().map(|l| l.line()), Some(2));
    }

    #[test]
    fn test_required_address() {
        let graph = graph(".a [url = \"http://a/\"]\n.b [hostname = \"b\"]\n.c [hostname = \"c\", port = \"81\"]");

        let mut diagnostics = Vec::new();
        addresses(&graph, false, &mut diagnostics);
        assert!(diagnostics.is_empty());

        addresses(&graph, true, &mut diagnostics);
        assert_eq!(codes(&diagnostics), vec![Some(ErrorCode::E304)]);
        assert!(diagnostics[0].message().contains("`b`"));
    }

    #[test]
    fn test_port_number() {
        assert_eq!(port_number(&Value::Number(8080)), Some(8080));
        assert_eq!(port_number(&Value::Str("443".into())), Some(443));
        assert_eq!(port_number(&Value::Number(0)), None);
        assert_eq!(port_number(&Value::Ident("http".into())), None);
    }
}
