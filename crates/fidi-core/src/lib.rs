//! Core types for fidi compilation units.
//!
//! This crate holds everything the lexer, the parser and the driver share:
//! source positions, diagnostics, the node/edge model with its canonical
//! edge ordering, and the [`Graph`] a compilation unit produces.
//!
//! Nothing here keeps process-wide state. Names are plain owned strings,
//! so independent graphs can be built concurrently.

pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod span;
pub mod value;

pub use edge::{DEFAULT_EDGE_KIND, Edge, EdgeComparison, EdgeDetails, Payload};
pub use graph::{CallStage, Graph, Settings};
pub use node::{Attributes, Node};
pub use span::{Location, Span, Spanned};
pub use value::Value;
