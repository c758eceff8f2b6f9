//! Directed relations between nodes and their canonical ordering.
//!
//! Edges are identified by `(source, target, kind)`. [`EdgeComparison`]
//! orders them by exactly that key, so two edges compare equal precisely
//! when they would be duplicates of each other. The graph keeps its edge
//! list sorted with it, which makes iteration, diagnostics and DOT output
//! independent of declaration order.

use std::cmp::Ordering;

use crate::span::Span;

/// Kind given to edges that do not declare one.
pub const DEFAULT_EDGE_KIND: &str = "call";

/// Raw fidi text nested in an edge, describing the request the target
/// receives. Linted recursively as its own compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    text: String,
    span: Span,
}

impl Payload {
    /// `span` covers the text between the braces.
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Everything an edge declares besides its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDetails {
    kind: String,
    sequence: u32,
    repeat: u32,
    payload: Option<Payload>,
}

impl EdgeDetails {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Stage in which the source issues this call. Stages run in ascending order.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// How many parallel copies of the call are issued.
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Stage numbers start at 1; zero is clamped.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence.max(1);
        self
    }

    /// At least one call is always issued; zero is clamped.
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl Default for EdgeDetails {
    fn default() -> Self {
        Self {
            kind: DEFAULT_EDGE_KIND.to_string(),
            sequence: 1,
            repeat: 1,
            payload: None,
        }
    }
}

/// A directed edge `source -> target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: String,
    target: String,
    details: EdgeDetails,
    span: Span,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        details: EdgeDetails,
        span: Span,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            details,
            span,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> &str {
        self.details.kind()
    }

    pub fn details(&self) -> &EdgeDetails {
        &self.details
    }

    /// Span of the edge statement.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The identity of the edge: `(source, target, kind)`.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.source, &self.target, self.details.kind())
    }
}

/// Strict weak ordering over edges.
///
/// Primary key is the source name, secondary the target name, tertiary the
/// edge kind, each compared lexicographically. Since the key is exactly the
/// edge identity, incomparable edges are duplicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeComparison;

impl EdgeComparison {
    pub fn compare(a: &Edge, b: &Edge) -> Ordering {
        a.source
            .cmp(&b.source)
            .then_with(|| a.target.cmp(&b.target))
            .then_with(|| a.details.kind.cmp(&b.details.kind))
    }

    /// `a` strictly precedes `b`.
    pub fn less(a: &Edge, b: &Edge) -> bool {
        Self::compare(a, b) == Ordering::Less
    }

    /// Neither edge precedes the other.
    pub fn equivalent(a: &Edge, b: &Edge) -> bool {
        Self::compare(a, b) == Ordering::Equal
    }

    /// Sort `edges` into canonical order. Stable, so equivalent edges keep
    /// their relative order.
    pub fn sort(edges: &mut [Edge]) {
        edges.sort_by(Self::compare);
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn name_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "web", "db"]).prop_map(String::from)
    }

    fn edge_strategy() -> impl Strategy<Value = Edge> {
        (
            name_strategy(),
            name_strategy(),
            prop::sample::select(vec!["call", "notify"]),
            1u32..4,
        )
            .prop_map(|(source, target, kind, sequence)| {
                Edge::new(
                    source,
                    target,
                    EdgeDetails::default()
                        .with_kind(kind)
                        .with_sequence(sequence),
                    Span::default(),
                )
            })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_strict_weak_ordering(a: &Edge, b: &Edge, c: &Edge) -> Result<(), TestCaseError> {
        // Irreflexivity
        prop_assert!(!EdgeComparison::less(a, a));
        // Asymmetry
        if EdgeComparison::less(a, b) {
            prop_assert!(!EdgeComparison::less(b, a));
        }
        // Transitivity
        if EdgeComparison::less(a, b) && EdgeComparison::less(b, c) {
            prop_assert!(EdgeComparison::less(a, c));
        }
        // Transitivity of incomparability
        if EdgeComparison::equivalent(a, b) && EdgeComparison::equivalent(b, c) {
            prop_assert!(EdgeComparison::equivalent(a, c));
        }
        Ok(())
    }

    fn check_sort_idempotent(mut edges: Vec<Edge>) -> Result<(), TestCaseError> {
        EdgeComparison::sort(&mut edges);
        let once = edges.clone();
        EdgeComparison::sort(&mut edges);

        prop_assert_eq!(&once, &edges);
        for pair in once.windows(2) {
            prop_assert!(!EdgeComparison::less(&pair[1], &pair[0]));
        }
        Ok(())
    }

    fn check_sort_stable(edges: Vec<Edge>) -> Result<(), TestCaseError> {
        let mut indexed: Vec<(usize, Edge)> = edges.into_iter().enumerate().collect();
        indexed.sort_by(|(_, a), (_, b)| EdgeComparison::compare(a, b));

        for pair in indexed.windows(2) {
            if EdgeComparison::equivalent(&pair[0].1, &pair[1].1) {
                prop_assert!(pair[0].0 < pair[1].0);
            }
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn edge_comparison_is_strict_weak_ordering(a in edge_strategy(), b in edge_strategy(), c in edge_strategy()) {
            check_strict_weak_ordering(&a, &b, &c)?;
        }

        #[test]
        fn edge_sort_is_idempotent(edges in prop::collection::vec(edge_strategy(), 0..32)) {
            check_sort_idempotent(edges)?;
        }

        #[test]
        fn edge_sort_is_stable(edges in prop::collection::vec(edge_strategy(), 0..32)) {
            check_sort_stable(edges)?;
        }
    }
}
