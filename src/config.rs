//! Configuration loaded from `.javaview/config.toml`.
//!
//! Every field has a default, so a missing file or missing section is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{GraphViewError, Result};
use crate::graph::types::{GraphNode, NodeVariant};
use crate::workspace::JAVA_NATURE;

/// Directory holding the config file, relative to the analyzed root.
pub const CONFIG_DIR: &str = ".javaview";
pub const CONFIG_FILE: &str = "config.toml";

/// The element an analysis pass is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeFilter {
    pub package: String,
    pub class: String,
    pub method: String,
}

impl ScopeFilter {
    pub fn new(package: impl Into<String>, class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
            method: method.into(),
        }
    }

    /// Scope that opens a method node in its own view.
    pub fn for_method_node(node: &GraphNode) -> Option<Self> {
        match &node.variant {
            NodeVariant::Method { package, class, .. } => {
                Some(Self::new(package.as_str(), class.as_str(), node.name.as_str()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}#{}", self.package, self.class, self.method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Source roots relative to each project directory.
    pub source_roots: Vec<String>,
    /// Nature id a project must carry to be analyzed.
    pub java_nature: String,
    /// Treat projects without a `.project` descriptor as Java projects.
    pub assume_java: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            source_roots: vec!["src".to_string(), "src/main/java".to_string()],
            java_nature: JAVA_NATURE.to_string(),
            assume_java: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fail units with syntax errors instead of using the recovered tree.
    pub reject_syntax_errors: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphViewConfig {
    /// Default scope, used when the caller does not supply one.
    pub scope: Option<ScopeFilter>,
    pub workspace: WorkspaceConfig,
    pub parser: ParserConfig,
}

impl GraphViewConfig {
    /// Load from `path`. Missing or invalid files yield the defaults.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
        };
        match Self::from_toml_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GraphViewError::Config(e.to_string()))
    }

    /// Default config location for an analyzed root.
    pub fn default_path(root: &Path) -> std::path::PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }
}
