//! Error types for javaview.

use std::path::PathBuf;

use thiserror::Error;

use crate::graph::types::NodeKind;

/// Errors produced while building a view graph.
#[derive(Debug, Error)]
pub enum GraphViewError {
    /// The parent of a node is declared in the same unit but was not visited
    /// before the child. Reordering the traversal would fix it.
    #[error("parent `{parent}` of {kind} `{child}` has not been visited yet")]
    ParentNotVisited {
        child: String,
        parent: String,
        kind: NodeKind,
    },

    /// The parent of a node does not exist anywhere in the unit's scope.
    #[error("parent `{parent}` of {kind} `{child}` does not exist")]
    ParentAbsent {
        child: String,
        parent: String,
        kind: NodeKind,
    },

    #[error("node id `{id}` already belongs to a {existing} node, cannot insert a {incoming}")]
    IdConflict {
        id: String,
        existing: NodeKind,
        incoming: NodeKind,
    },

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {unit}: {message}")]
    Parse { unit: String, message: String },

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("invalid config: {0}")]
    Config(String),
}

impl GraphViewError {
    /// Fatal errors abort the whole analysis pass. Everything else is a
    /// collaborator failure the driver recovers from at project level.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GraphViewError::ParentNotVisited { .. }
                | GraphViewError::ParentAbsent { .. }
                | GraphViewError::IdConflict { .. }
                | GraphViewError::UnknownNode(_)
        )
    }

    /// True when the failure comes from traversal order rather than structure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphViewError::ParentNotVisited { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphViewError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphViewError>;
