//! The graph built from one compilation unit.
//!
//! # Architecture
//!
//! - Nodes live in an [`IndexMap`] keyed by name, so declaration order is
//!   preserved and doubles as the tie-breaker for traversals.
//! - Edges live in a `Vec` kept sorted by [`EdgeComparison`]. Insertion is a
//!   binary search, which also finds duplicates, and all edges leaving a node
//!   form one contiguous run.
//! - Settings are the top-level `key = value;` statements of the unit.
//!
//! Cycle detection uses petgraph's strongly connected components; the
//! topological order is a Kahn traversal with a min-heap over declaration
//! indices so that results never depend on hashing.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap, HashSet},
    fmt,
};

use indexmap::IndexMap;
use log::trace;
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};

use crate::{
    edge::{DEFAULT_EDGE_KIND, Edge, EdgeComparison},
    error::DiagnosticKind,
    node::Node,
    span::Spanned,
    value::Value,
};

/// Top-level settings in assignment order.
pub type Settings = IndexMap<String, Spanned<Value>>;

/// Outgoing calls of one node that share a sequence number.
#[derive(Debug, Clone)]
pub struct CallStage<'g> {
    sequence: u32,
    calls: Vec<&'g Edge>,
}

impl<'g> CallStage<'g> {
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Calls in canonical edge order.
    pub fn calls(&self) -> &[&'g Edge] {
        &self.calls
    }

    /// Total number of calls issued in this stage, counting repeats.
    pub fn fan_out(&self) -> u32 {
        self.calls.iter().map(|edge| edge.details().repeat()).sum()
    }
}

/// Nodes, canonically ordered edges and settings of a compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    edges: Vec<Edge>,
    settings: Settings,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, rejecting a second node with the same name.
    pub fn insert_node(&mut self, node: Node) -> Result<(), DiagnosticKind> {
        if let Some(existing) = self.nodes.get(node.name()) {
            return Err(DiagnosticKind::DuplicateDeclaration {
                name: node.name().to_string(),
                first: existing.span(),
            });
        }

        trace!(name = node.name(); "Inserting node");
        self.nodes.insert(node.name().to_string(), node);
        Ok(())
    }

    /// Insert an edge at its canonical position.
    ///
    /// Fails with [`DiagnosticKind::UnresolvedReference`] for the first
    /// undeclared endpoint, or [`DiagnosticKind::DuplicateEdge`] when an
    /// equivalent edge is already present.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), DiagnosticKind> {
        if let Some(name) = self.missing_endpoints(&edge).into_iter().next() {
            return Err(DiagnosticKind::UnresolvedReference {
                name: name.to_string(),
            });
        }

        match self
            .edges
            .binary_search_by(|probe| EdgeComparison::compare(probe, &edge))
        {
            Ok(position) => Err(DiagnosticKind::DuplicateEdge {
                from: edge.source().to_string(),
                to: edge.target().to_string(),
                kind: edge.kind().to_string(),
                first: self.edges[position].span(),
            }),
            Err(position) => {
                trace!(
                    source = edge.source(),
                    target = edge.target(),
                    kind = edge.kind();
                    "Inserting edge"
                );
                self.edges.insert(position, edge);
                Ok(())
            }
        }
    }

    /// Endpoints of `edge` that are not declared nodes, source first.
    pub fn missing_endpoints<'e>(&self, edge: &'e Edge) -> Vec<&'e str> {
        let mut missing = Vec::new();
        if !self.contains_node(edge.source()) {
            missing.push(edge.source());
        }
        if edge.target() != edge.source() && !self.contains_node(edge.target()) {
            missing.push(edge.target());
        }
        missing
    }

    /// Assign a setting, returning the value it replaces.
    pub fn set_setting(
        &mut self,
        key: impl Into<String>,
        value: Spanned<Value>,
    ) -> Option<Spanned<Value>> {
        self.settings.insert(key.into(), value)
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key).map(Spanned::inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges in canonical order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges leaving `name`, in canonical order.
    pub fn edges_from(&self, name: &str) -> &[Edge] {
        let start = self.edges.partition_point(|edge| edge.source() < name);
        let len = self.edges[start..].partition_point(|edge| edge.source() == name);
        &self.edges[start..start + len]
    }

    /// All edges entering `name`, in canonical order.
    pub fn edges_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.target() == name)
    }

    /// Outgoing edges of `name` grouped by sequence number, ascending.
    pub fn call_stages(&self, name: &str) -> Vec<CallStage<'_>> {
        let mut stages: BTreeMap<u32, Vec<&Edge>> = BTreeMap::new();
        for edge in self.edges_from(name) {
            stages
                .entry(edge.details().sequence())
                .or_default()
                .push(edge);
        }
        stages
            .into_iter()
            .map(|(sequence, calls)| CallStage { sequence, calls })
            .collect()
    }

    /// Every elementary cycle representative, one per strongly connected
    /// component. Each path starts and ends at the earliest declared node of
    /// its component and follows edges in canonical order.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let adjacency = self.adjacency();

        let mut graph = DiGraph::<(), ()>::with_capacity(adjacency.len(), self.edges.len());
        for _ in 0..adjacency.len() {
            graph.add_node(());
        }
        for (source, successors) in adjacency.iter().enumerate() {
            for &target in successors {
                graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
            }
        }

        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|index| adjacency[index.index()].contains(&index.index()))
            })
            .map(|component| {
                let members: HashSet<usize> = component.iter().map(|index| index.index()).collect();
                cycle_path(&adjacency, &members)
            })
            .collect();
        cycles.sort();

        cycles
            .into_iter()
            .map(|path| path.into_iter().map(|index| self.name_at(index)).collect())
            .collect()
    }

    /// The edge from the second-to-last to the last node of a cycle path.
    pub fn closing_edge(&self, path: &[String]) -> Option<&Edge> {
        let [.., from, to] = path else {
            return None;
        };
        self.edges_from(from)
            .iter()
            .find(|edge| edge.target() == to.as_str())
    }

    /// Nodes ordered so every edge points forward, ties broken by
    /// declaration order.
    ///
    /// Fails with [`DiagnosticKind::CycleDetected`] naming the first cycle.
    pub fn topological_order(&self) -> Result<Vec<&Node>, DiagnosticKind> {
        let order = self.kahn(false);
        if order.len() < self.nodes.len() {
            let path = self.cycles().into_iter().next().unwrap_or_default();
            return Err(DiagnosticKind::CycleDetected { path });
        }
        Ok(self.nodes_at(order))
    }

    /// Like [`Graph::topological_order`], but a cycle is broken by releasing
    /// its earliest declared node, ignoring the edges that close it.
    pub fn relaxed_topological_order(&self) -> Vec<&Node> {
        self.nodes_at(self.kahn(true))
    }

    /// Render the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }

    fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            if let (Some(source), Some(target)) = (
                self.nodes.get_index_of(edge.source()),
                self.nodes.get_index_of(edge.target()),
            ) {
                adjacency[source].push(target);
            }
        }
        adjacency
    }

    fn kahn(&self, relaxed: bool) -> Vec<usize> {
        let adjacency = self.adjacency();
        let count = adjacency.len();

        let mut indegree = vec![0usize; count];
        for successors in &adjacency {
            for &target in successors {
                indegree[target] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = indegree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| Reverse(index))
            .collect();
        let mut done = vec![false; count];
        let mut order = Vec::with_capacity(count);

        loop {
            while let Some(Reverse(index)) = ready.pop() {
                if done[index] {
                    continue;
                }
                done[index] = true;
                order.push(index);

                for &target in &adjacency[index] {
                    if done[target] {
                        continue;
                    }
                    indegree[target] = indegree[target].saturating_sub(1);
                    if indegree[target] == 0 {
                        ready.push(Reverse(target));
                    }
                }
            }

            if order.len() == count || !relaxed {
                break;
            }
            match (0..count).find(|&index| !done[index]) {
                Some(stuck) => {
                    trace!(name = self.name_at(stuck); "Breaking cycle");
                    ready.push(Reverse(stuck));
                }
                None => break,
            }
        }

        order
    }

    fn nodes_at(&self, indices: Vec<usize>) -> Vec<&Node> {
        indices
            .into_iter()
            .filter_map(|index| self.nodes.get_index(index).map(|(_, node)| node))
            .collect()
    }

    fn name_at(&self, index: usize) -> String {
        self.nodes
            .get_index(index)
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }
}

/// Depth-first search for a path from the smallest member back to itself,
/// staying inside `members`.
fn cycle_path(adjacency: &[Vec<usize>], members: &HashSet<usize>) -> Vec<usize> {
    let Some(&start) = members.iter().min() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut cursors = vec![0usize];
    let mut visited = HashSet::from([start]);

    loop {
        let (Some(&current), Some(&cursor)) = (path.last(), cursors.last()) else {
            break;
        };
        let Some(&next) = adjacency[current].get(cursor) else {
            path.pop();
            cursors.pop();
            continue;
        };
        if let Some(cursor) = cursors.last_mut() {
            *cursor += 1;
        }

        if next == start {
            path.push(start);
            return path;
        }
        if members.contains(&next) && visited.insert(next) {
            path.push(next);
            cursors.push(0);
        }
    }

    // Unreachable for a strongly connected component.
    let mut sorted: Vec<usize> = members.iter().copied().collect();
    sorted.sort_unstable();
    sorted
}

/// DOT rendering of a [`Graph`]; nodes become records listing their attributes.
struct Dot<'g>(&'g Graph);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph fidi {{")?;
        writeln!(f, "  node [shape=record];")?;

        for node in self.0.nodes() {
            write!(f, "  \"{}\" [label=\"{{", node.name())?;
            for (key, value) in node.attributes() {
                write!(f, "{}={}|", escape_record(key), escape_record(&value.to_string()))?;
            }
            writeln!(f, "{}}}\"];", escape_record(node.name()))?;
        }

        for edge in self.0.edges() {
            let details = edge.details();
            write!(
                f,
                "  \"{}\" -> \"{}\" [label=\"{}",
                edge.source(),
                edge.target(),
                details.sequence()
            )?;
            if details.repeat() > 1 {
                write!(f, " x{}", details.repeat())?;
            }
            write!(f, "\"")?;
            if details.kind() != DEFAULT_EDGE_KIND {
                write!(f, ", xlabel=\"{}\"", escape_record(details.kind()))?;
            }
            writeln!(f, "];")?;
        }

        writeln!(f, "}}")
    }
}

fn escape_record(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push('\''),
            '{' | '}' | '|' | '<' | '>' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::{
        edge::EdgeDetails,
        span::{Location, Span},
    };

    fn span(offset: usize) -> Span {
        Span::new(Location::new(1, offset as u32 + 1, offset), offset + 1)
    }

    fn node(name: &str) -> Node {
        Node::new(name, IndexMap::new(), span(0))
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge::new(source, target, EdgeDetails::default(), span(0))
    }

    fn graph_with(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for name in nodes {
            graph.insert_node(node(name)).unwrap();
        }
        for (source, target) in edges {
            graph.insert_edge(edge(source, target)).unwrap();
        }
        graph
    }

    fn names(nodes: Vec<&Node>) -> Vec<&str> {
        nodes.into_iter().map(Node::name).collect()
    }

    #[test]
    fn test_graph_new() {
        let graph = Graph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.settings().is_empty());
    }

    #[test]
    fn test_insert_duplicate_node() {
        let mut graph = Graph::new();
        graph.insert_node(Node::new("a", IndexMap::new(), span(0))).unwrap();

        let err = graph
            .insert_node(Node::new("a", IndexMap::new(), span(9)))
            .unwrap_err();
        assert_eq!(
            err,
            DiagnosticKind::DuplicateDeclaration {
                name: "a".into(),
                first: span(0)
            }
        );
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node("a").unwrap().span(), span(0));
    }

    #[test]
    fn test_insert_edge_requires_endpoints() {
        let mut graph = graph_with(&["a"], &[]);

        let err = graph.insert_edge(edge("a", "b")).unwrap_err();
        assert_eq!(
            err,
            DiagnosticKind::UnresolvedReference { name: "b".into() }
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_missing_endpoints_lists_both() {
        let graph = Graph::new();
        assert_eq!(graph.missing_endpoints(&edge("x", "y")), vec!["x", "y"]);
        assert_eq!(graph.missing_endpoints(&edge("x", "x")), vec!["x"]);
    }

    #[test]
    fn test_insert_duplicate_edge() {
        let mut graph = graph_with(&["a", "b"], &[("a", "b")]);

        let duplicate = Edge::new("a", "b", EdgeDetails::default().with_sequence(3), span(5));
        let err = graph.insert_edge(duplicate).unwrap_err();
        assert!(matches!(err, DiagnosticKind::DuplicateEdge { first, .. } if first == span(0)));
        assert_eq!(graph.edge_count(), 1);

        let other_kind = Edge::new("a", "b", EdgeDetails::default().with_kind("notify"), span(7));
        graph.insert_edge(other_kind).unwrap();
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_edges_stay_sorted() {
        let graph = graph_with(
            &["c", "b", "a"],
            &[("c", "a"), ("a", "c"), ("b", "a"), ("a", "b")],
        );

        let keys: Vec<_> = graph
            .edges()
            .iter()
            .map(|e| (e.source(), e.target()))
            .collect();
        assert_eq!(keys, vec![("a", "b"), ("a", "c"), ("b", "a"), ("c", "a")]);
    }

    #[test]
    fn test_edges_from_and_to() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "c")]);

        let from_a: Vec<_> = graph.edges_from("a").iter().map(Edge::target).collect();
        assert_eq!(from_a, vec!["b", "c"]);
        assert!(graph.edges_from("c").is_empty());
        assert!(graph.edges_from("zzz").is_empty());

        let to_c: Vec<_> = graph.edges_to("c").map(Edge::source).collect();
        assert_eq!(to_c, vec!["a", "b"]);
    }

    #[test]
    fn test_call_stages_group_by_sequence() {
        let mut graph = graph_with(&["web", "db", "cache", "log"], &[]);
        for (target, sequence, repeat) in [("db", 2, 1), ("cache", 1, 3), ("log", 2, 1)] {
            let details = EdgeDetails::default()
                .with_sequence(sequence)
                .with_repeat(repeat);
            graph
                .insert_edge(Edge::new("web", target, details, span(0)))
                .unwrap();
        }

        let stages = graph.call_stages("web");
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].sequence(), 1);
        assert_eq!(stages[0].fan_out(), 3);
        let second: Vec<_> = stages[1].calls().iter().map(|e| e.target()).collect();
        assert_eq!(second, vec!["db", "log"]);
    }

    #[test]
    fn test_topological_order_prefers_declaration_order() {
        let graph = graph_with(&["a", "b", "c", "d"], &[("c", "b"), ("a", "b")]);

        let order = graph.topological_order().unwrap();
        assert_eq!(names(order), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_cycle_is_detected() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);

        assert_eq!(graph.cycles(), vec![vec!["a", "b", "c", "a"]]);
        let err = graph.topological_order().unwrap_err();
        assert_eq!(
            err,
            DiagnosticKind::CycleDetected {
                path: vec!["a".into(), "b".into(), "c".into(), "a".into()]
            }
        );

        let closing = graph.closing_edge(&graph.cycles()[0]).unwrap();
        assert_eq!((closing.source(), closing.target()), ("c", "a"));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let graph = graph_with(&["a", "b"], &[("a", "a"), ("a", "b")]);
        assert_eq!(graph.cycles(), vec![vec!["a", "a"]]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "c")]);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_relaxed_order_breaks_cycles() {
        let graph = graph_with(
            &["x", "a", "b"],
            &[("a", "b"), ("b", "a"), ("x", "a")],
        );

        let order = graph.relaxed_topological_order();
        assert_eq!(names(order), vec!["x", "a", "b"]);
    }

    #[test]
    fn test_settings_replace_previous_value() {
        let mut graph = Graph::new();
        assert!(graph
            .set_setting("response", Spanned::new(Value::Number(200), span(0)))
            .is_none());
        let previous = graph
            .set_setting("response", Spanned::new(Value::Number(503), span(4)))
            .unwrap();

        assert_eq!(previous.inner(), &Value::Number(200));
        assert_eq!(graph.setting("response"), Some(&Value::Number(503)));
    }

    #[test]
    fn test_dot_output() {
        let mut attributes = IndexMap::new();
        attributes.insert("url".to_string(), Value::Str("http://a/\"x\"".into()));
        let mut graph = Graph::new();
        graph.insert_node(Node::new("a", attributes, span(0))).unwrap();
        graph.insert_node(node("b")).unwrap();
        let details = EdgeDetails::default().with_kind("notify").with_repeat(2);
        graph
            .insert_edge(Edge::new("a", "b", details, span(0)))
            .unwrap();

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph fidi {\n  node [shape=record];\n"));
        assert!(dot.contains("\"a\" [label=\"{url=http://a/'x'|a}\"];"));
        assert!(dot.contains("\"a\" -> \"b\" [label=\"1 x2\", xlabel=\"notify\"];"));
        assert!(dot.ends_with("}\n"));
    }
}
