//! View graph module: the structural backbone of javaview.
//!
//! Provides the graph data model, the pass-scoped registry, the
//! declaration visitor, and the driver that runs an analysis pass.

pub mod builder;
pub mod engine;
pub mod types;
pub mod visitor;

pub use builder::{build_view_graph, AnalysisOutcome, Analyzer, PassStats};
pub use engine::{Insertion, ModelRegistry, RegistryStats};
pub use types::{
    Connection, ConnectionId, EdgeKind, GraphNode, GraphSnapshot, NodeKind, NodeSnapshot,
    NodeType, NodeVariant,
};
pub use visitor::{DeclarationVisitor, Diagnostic};
