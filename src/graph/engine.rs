//! The model registry: the store behind one analysis pass.
//!
//! Uses petgraph to hold nodes and connections, with an id index for
//! deduplicated insertion and lookup. Node and edge indices grow in
//! insertion order, which is also traversal order.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::types::*;
use crate::error::{GraphViewError, Result};

/// Outcome of a guarded insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The node was new and has been appended.
    Added(NodeIndex),
    /// A node with the same id already existed; nothing changed.
    Existing(NodeIndex),
}

impl Insertion {
    pub fn index(self) -> NodeIndex {
        match self {
            Insertion::Added(idx) | Insertion::Existing(idx) => idx,
        }
    }

    pub fn is_added(self) -> bool {
        matches!(self, Insertion::Added(_))
    }
}

/// Holds the nodes, the node-by-id index and the connections of one pass.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    graph: DiGraph<GraphNode, Connection>,
    node_map: HashMap<String, NodeIndex>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear nodes, index and connections. The connection sequence restarts.
    pub fn reset(&mut self) {
        self.graph.clear();
        self.node_map.clear();
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Insert `node` unless a node with the same id is already present.
    ///
    /// Re-inserting an id with a different node kind is an error, since the
    /// index would otherwise silently alias two different elements.
    pub fn insert_node_if_absent(&mut self, node: GraphNode) -> Result<Insertion> {
        if let Some(&idx) = self.node_map.get(&node.id) {
            let existing = self.graph[idx].kind();
            let incoming = node.kind();
            if existing != incoming {
                return Err(GraphViewError::IdConflict {
                    id: node.id,
                    existing,
                    incoming,
                });
            }
            return Ok(Insertion::Existing(idx));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(id, idx);
        Ok(Insertion::Added(idx))
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.node_map.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// Update the selection state of a node. Returns false for unknown ids.
    pub fn set_node_type(&mut self, id: &str, node_type: NodeType) -> bool {
        match self.node_map.get(id) {
            Some(&idx) => {
                self.graph[idx].set_node_type(node_type);
                true
            }
            None => false,
        }
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Connect two existing nodes and return the new connection's id.
    pub fn add_connection(
        &mut self,
        source: &str,
        destination: &str,
        offset: usize,
        kind: EdgeKind,
    ) -> Result<ConnectionId> {
        let src = self.index_of(source)?;
        let dst = self.index_of(destination)?;
        let seq = self.graph.edge_count();
        let connection = Connection::new(seq, source, destination, offset, kind);
        let id = connection.id.clone();
        debug!(connection = %id, label = %connection.label, "adding connection");
        self.graph.add_edge(src, dst, connection);
        Ok(id)
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| GraphViewError::UnknownNode(id.to_string()))
    }

    // ─── Read Accessors ─────────────────────────────────────────

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.graph.raw_nodes().iter().map(|n| &n.weight)
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.graph.raw_edges().iter().map(|e| &e.weight)
    }

    /// The id index, keyed by node id.
    pub fn node_map(&self) -> HashMap<&str, &GraphNode> {
        self.node_map
            .iter()
            .map(|(id, &idx)| (id.as_str(), &self.graph[idx]))
            .collect()
    }

    /// Outgoing connections of a node, in insertion order.
    pub fn connections_from(&self, id: &str) -> Vec<&Connection> {
        let Some(&idx) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(EdgeIndex, &Connection)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, c)| c).collect()
    }

    /// The set of nodes this node points to, first connection first.
    pub fn connected_to(&self, id: &str) -> Vec<&GraphNode> {
        let mut seen = HashSet::new();
        self.connections_from(id)
            .into_iter()
            .filter(|c| seen.insert(c.destination()))
            .filter_map(|c| self.get(c.destination()))
            .collect()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> + '_ {
        self.nodes().filter(move |n| n.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            connection_count: self.graph.edge_count(),
            ..Default::default()
        };
        for node in self.nodes() {
            match node.kind() {
                NodeKind::Package => stats.package_count += 1,
                NodeKind::Class => stats.class_count += 1,
                NodeKind::Method => stats.method_count += 1,
                NodeKind::Variable => stats.variable_count += 1,
            }
        }
        stats
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes()
                .map(|node| NodeSnapshot {
                    node: node.clone(),
                    connected_to: self
                        .connected_to(&node.id)
                        .into_iter()
                        .map(|n| n.id.clone())
                        .collect(),
                })
                .collect(),
            connections: self.connections().cloned().collect(),
        }
    }
}

/// Node and connection counts of a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub package_count: usize,
    pub class_count: usize,
    pub method_count: usize,
    pub variable_count: usize,
    pub connection_count: usize,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} packages, {} classes, {} methods, {} variables, {} connections",
            self.package_count,
            self.class_count,
            self.method_count,
            self.variable_count,
            self.connection_count
        )
    }
}
