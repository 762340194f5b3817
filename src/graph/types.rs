//! Core types for the structure view graph.
//!
//! Defines node kinds, edge kinds, and the data structures
//! that represent Java elements and their relationships.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The plain kind of a node in the view graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Package,
    Class,
    Method,
    Variable,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Package => write!(f, "package"),
            NodeKind::Class => write!(f, "class"),
            NodeKind::Method => write!(f, "method"),
            NodeKind::Variable => write!(f, "variable"),
        }
    }
}

/// Transient selection state set by the UI layer. Not part of identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Invalid,
    UserSelection,
    UserDoubleClicked,
}

/// Variant-specific attributes of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeVariant {
    Package {
        project: String,
    },
    Class {
        project: String,
        package: String,
    },
    Method {
        project: String,
        package: String,
        class: String,
    },
    Variable {
        project: String,
        package: String,
        class: String,
        method: String,
    },
}

impl NodeVariant {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeVariant::Package { .. } => NodeKind::Package,
            NodeVariant::Class { .. } => NodeKind::Class,
            NodeVariant::Method { .. } => NodeKind::Method,
            NodeVariant::Variable { .. } => NodeKind::Variable,
        }
    }
}

/// A node in the view graph.
///
/// Equality and hashing only look at `id`: separate passes produce distinct
/// instances of the same logical element and they must compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Fully-qualified containment path, e.g. `Demo.shapes.Circle.area`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Id of the enclosing node. For packages this is the project name.
    pub parent_id: String,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(flatten)]
    pub variant: NodeVariant,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
        variant: NodeVariant,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: parent_id.into(),
            node_type: NodeType::Invalid,
            variant,
        }
    }

    /// Package node `project.package`, parented to the project.
    pub fn package(project: &str, package: &str) -> Self {
        Self::new(
            package_id(project, package),
            package,
            project,
            NodeVariant::Package {
                project: project.to_string(),
            },
        )
    }

    /// Class node `project.package.Class`.
    pub fn class(project: &str, package: &str, class: &str) -> Self {
        Self::new(
            class_id(project, package, class),
            class,
            package_id(project, package),
            NodeVariant::Class {
                project: project.to_string(),
                package: package.to_string(),
            },
        )
    }

    /// Method node `project.package.Class.method`.
    pub fn method(project: &str, package: &str, class: &str, method: &str) -> Self {
        Self::new(
            method_id(project, package, class, method),
            method,
            class_id(project, package, class),
            NodeVariant::Method {
                project: project.to_string(),
                package: package.to_string(),
                class: class.to_string(),
            },
        )
    }

    /// Local variable node. The display name embeds package, class and method
    /// so that variables from different scopes stay distinguishable.
    pub fn variable(project: &str, package: &str, class: &str, method: &str, var: &str) -> Self {
        Self::new(
            variable_id(project, package, class, method, var),
            variable_name(package, class, method, var),
            method_id(project, package, class, method),
            NodeVariant::Variable {
                project: project.to_string(),
                package: package.to_string(),
                class: class.to_string(),
                method: method.to_string(),
            },
        )
    }

    pub fn kind(&self) -> NodeKind {
        self.variant.kind()
    }

    /// Logical equality by id.
    pub fn eq_id(&self, other: &GraphNode) -> bool {
        self.id == other.id
    }

    /// True when `other` is the direct parent of this node.
    pub fn is_parent(&self, other: &GraphNode) -> bool {
        self.parent_id == other.id
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode {}

impl Hash for GraphNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind(), self.id)
    }
}

// ─── Id Generation ──────────────────────────────────────────────────────────

pub fn package_id(project: &str, package: &str) -> String {
    format!("{project}.{package}")
}

pub fn class_id(project: &str, package: &str, class: &str) -> String {
    format!("{project}.{package}.{class}")
}

pub fn method_id(project: &str, package: &str, class: &str, method: &str) -> String {
    format!("{project}.{package}.{class}.{method}")
}

pub fn variable_id(project: &str, package: &str, class: &str, method: &str, var: &str) -> String {
    format!("{project}.{package}.{class}.{method}.{var}")
}

pub fn variable_name(package: &str, class: &str, method: &str, var: &str) -> String {
    format!("{var}:{package}.{class}.{method}")
}

// ─── Connections ────────────────────────────────────────────────────────────

/// The kind of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Container points down to a member (Package -> Class, Class -> Method).
    Contains,
    /// Member points up to its owner (Variable -> Method).
    DeclaredIn,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Contains => write!(f, "contains"),
            EdgeKind::DeclaredIn => write!(f, "declared_in"),
        }
    }
}

/// Identity of a connection. `seq` is unique per registry, so two edges
/// between the same endpoints never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId {
    pub seq: usize,
    pub source: String,
    pub destination: String,
}

impl ConnectionId {
    /// Endpoint concatenation, as shown by older renderers.
    pub fn legacy_key(&self) -> String {
        format!("{}{}", self.source, self.destination)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}#{}", self.source, self.destination, self.seq)
    }
}

/// Data stored on a graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    /// Human readable annotation, `offset: N`.
    pub label: String,
    /// Start offset of the declaration that produced the edge.
    pub offset: usize,
    pub kind: EdgeKind,
}

impl Connection {
    pub fn new(seq: usize, source: &str, destination: &str, offset: usize, kind: EdgeKind) -> Self {
        Self {
            id: ConnectionId {
                seq,
                source: source.to_string(),
                destination: destination.to_string(),
            },
            label: format!("offset: {offset}"),
            offset,
            kind,
        }
    }

    pub fn source(&self) -> &str {
        &self.id.source
    }

    pub fn destination(&self) -> &str {
        &self.id.destination
    }
}

// ─── Snapshots ──────────────────────────────────────────────────────────────

/// A node together with the ids it points to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(flatten)]
    pub node: GraphNode,
    pub connected_to: Vec<String>,
}

/// Serializable view of a whole registry, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<Connection>,
}
