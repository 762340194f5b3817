//! CLI module for javaview.
//!
//! Commands:
//! - view: build the graph for one package/class/method scope
//! - projects: list discovered projects and source fragments

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::ScopeFilter;
use crate::graph::AnalysisOutcome;
use crate::workspace::{PackageFragment, ProjectSource};

#[derive(Parser)]
#[command(name = "javaview")]
#[command(about = "Structure graphs for Java projects")]
pub struct Cli {
    /// Workspace or project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: <root>/.javaview/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the view graph for a class and method
    View {
        /// Package of the target class (dotted)
        #[arg(short, long)]
        package: Option<String>,

        /// Simple name of the target class
        #[arg(short, long)]
        class: Option<String>,

        /// Name of the target method
        #[arg(short, long)]
        method: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List projects and source package fragments
    Projects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Merge command-line scope parts over the configured default scope.
pub fn resolve_scope(
    configured: Option<&ScopeFilter>,
    package: Option<String>,
    class: Option<String>,
    method: Option<String>,
) -> Option<ScopeFilter> {
    let base = configured.cloned().unwrap_or_default();
    let scope = ScopeFilter {
        package: package.unwrap_or(base.package),
        class: class.unwrap_or(base.class),
        method: method.unwrap_or(base.method),
    };
    // the default package is empty, but a class and a method are required
    if scope.class.is_empty() || scope.method.is_empty() {
        None
    } else {
        Some(scope)
    }
}

/// Plain-text rendering of a pass.
pub fn render_outcome(scope: &ScopeFilter, outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    let registry = &outcome.registry;
    let _ = writeln!(out, "View: {scope}");
    let _ = writeln!(out, "{}", outcome.stats);
    let _ = writeln!(out, "{}", registry.stats());

    if !registry.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Nodes:");
        for node in registry.nodes() {
            let _ = writeln!(out, "  {:<9} {} ({})", node.kind().to_string(), node.id, node.name);
        }
    }

    if registry.connection_count() > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Connections:");
        for conn in registry.connections() {
            let _ = writeln!(
                out,
                "  {} --[{}]--> {} ({})",
                conn.source(),
                conn.kind,
                conn.destination(),
                conn.label
            );
        }
    }

    if !outcome.diagnostics.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Diagnostics:");
        for diagnostic in &outcome.diagnostics {
            let _ = writeln!(out, "  {diagnostic}");
        }
    }
    out
}

/// Plain-text listing of one project.
pub fn render_project<S: ProjectSource>(project: &S, nature: &str, fragments: &[PackageFragment]) -> String {
    let mut out = String::new();
    let java = if project.has_nature(nature) { "java" } else { "other" };
    let state = if project.is_open() { "open" } else { "closed" };
    let _ = writeln!(out, "{} ({java}, {state})", project.name());
    for fragment in fragments {
        let name = if fragment.name.is_empty() {
            "(default package)"
        } else {
            fragment.name.as_str()
        };
        let _ = writeln!(out, "  {name}: {} units", fragment.units.len());
    }
    out
}
