//! # javaview
//!
//! Structure graphs for Java projects.
//!
//! javaview walks the Java projects of a workspace and builds a small graph
//! of declarations around one target method: its package, its class, the
//! method itself and the local variables declared in it.
//!
//! ## Key Features
//!
//! - **Scoped**: only the package, class and method named by a `ScopeFilter`
//!   are materialized
//! - **Deduplicated**: each id maps to exactly one node per pass
//! - **Pluggable**: workspaces and parsers sit behind traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use javaview::{build_view_graph, GraphViewConfig, ScopeFilter};
//! use std::path::Path;
//!
//! let scope = ScopeFilter::new("shapes", "Circle", "area");
//! let outcome = build_view_graph(Path::new("."), &scope, &GraphViewConfig::default())?;
//! for node in outcome.registry.nodes() {
//!     println!("{node}");
//! }
//! # Ok::<(), javaview::GraphViewError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod workspace;

// Re-exports for convenience
pub use config::{GraphViewConfig, ParserConfig, ScopeFilter, WorkspaceConfig};
pub use error::{GraphViewError, Result};

// Graph re-exports
pub use graph::{
    build_view_graph, AnalysisOutcome, Analyzer, Connection, ConnectionId, DeclarationVisitor,
    Diagnostic, EdgeKind, GraphNode, GraphSnapshot, ModelRegistry, NodeKind, NodeType, PassStats,
};
pub use parser::{CompilationUnit, Declaration, JavaParser, SourceParser};
pub use workspace::{
    FsWorkspace, MemoryProject, MemoryWorkspace, PackageFragment, ProjectSource, UnitHandle,
    Workspace, JAVA_NATURE,
};
