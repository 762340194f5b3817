//! Graph builder: runs one analysis pass over a workspace.
//!
//! Walks projects, package fragments and compilation units, parses each unit
//! and feeds it to a `DeclarationVisitor`. Every pass gets its own registry.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info};

use super::engine::ModelRegistry;
use super::visitor::{DeclarationVisitor, Diagnostic};
use crate::config::{GraphViewConfig, ScopeFilter};
use crate::error::{GraphViewError, Result};
use crate::parser::{JavaParser, SourceParser};
use crate::workspace::{FragmentKind, FsWorkspace, PackageFragment, ProjectSource, Workspace};

/// Counts of what a pass looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub projects_visited: usize,
    pub projects_skipped: usize,
    pub fragments_visited: usize,
    pub units_visited: usize,
}

impl std::fmt::Display for PassStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Visited {} projects ({} skipped), {} package fragments, {} compilation units",
            self.projects_visited, self.projects_skipped, self.fragments_visited, self.units_visited
        )
    }
}

/// Result of a completed pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub registry: ModelRegistry,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: PassStats,
}

/// Drives a pass: project → package fragment → compilation unit.
pub struct Analyzer<P> {
    parser: P,
    filter: ScopeFilter,
    java_nature: String,
}

impl<P: SourceParser> Analyzer<P> {
    pub fn new(parser: P, filter: ScopeFilter) -> Self {
        Self {
            parser,
            filter,
            java_nature: crate::workspace::JAVA_NATURE.to_string(),
        }
    }

    /// Require projects to carry `nature` instead of the Java nature.
    pub fn with_nature(mut self, nature: impl Into<String>) -> Self {
        self.java_nature = nature.into();
        self
    }

    pub fn filter(&self) -> &ScopeFilter {
        &self.filter
    }

    /// Point the analyzer at a new scope, e.g. one derived from a selected node.
    pub fn set_filter(&mut self, filter: ScopeFilter) {
        self.filter = filter;
    }

    /// Run a pass into a fresh registry.
    pub fn analyze<W: Workspace>(&mut self, workspace: &W) -> Result<AnalysisOutcome> {
        let mut outcome = AnalysisOutcome::default();
        self.analyze_into(workspace, &mut outcome)?;
        Ok(outcome)
    }

    /// Run a pass into `outcome`, resetting its registry first.
    ///
    /// Collaborator failures inside a project skip that project. Structural
    /// errors abort the pass; whatever was built until then stays in
    /// `outcome`.
    pub fn analyze_into<W: Workspace>(
        &mut self,
        workspace: &W,
        outcome: &mut AnalysisOutcome,
    ) -> Result<()> {
        outcome.registry.reset();
        outcome.diagnostics.clear();
        outcome.stats = PassStats::default();
        info!(scope = %self.filter, "starting analysis pass");

        let projects = workspace.projects().map_err(|e| {
            error!(error = %e, "failed to enumerate workspace projects");
            e
        })?;
        for project in projects {
            if !project.is_open() || !project.has_nature(&self.java_nature) {
                debug!(project = project.name(), "skipping closed or non-Java project");
                continue;
            }
            match self.analyze_project(&project, outcome) {
                Ok(()) => outcome.stats.projects_visited += 1,
                Err(e) if !e.is_fatal() => {
                    error!(project = project.name(), error = %e, "project analysis failed");
                    outcome.stats.projects_skipped += 1;
                    outcome.diagnostics.push(Diagnostic::ProjectSkipped {
                        project: project.name().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            stats = %outcome.registry.stats(),
            units = outcome.stats.units_visited,
            diagnostics = outcome.diagnostics.len(),
            "analysis pass complete"
        );
        Ok(())
    }

    fn analyze_project<S: ProjectSource>(
        &mut self,
        project: &S,
        outcome: &mut AnalysisOutcome,
    ) -> Result<()> {
        for fragment in project.package_fragments()? {
            if !self.is_target_fragment(&fragment) {
                continue;
            }
            debug!(project = project.name(), package = %fragment.name, units = fragment.units.len(), "visiting package fragment");
            outcome.stats.fragments_visited += 1;

            for unit in &fragment.units {
                let parsed = self.parser.parse_unit(project.name(), unit)?;
                let mut visitor = DeclarationVisitor::new(&mut outcome.registry, &self.filter);
                let visited = visitor.visit_unit(&parsed);
                outcome.diagnostics.extend(visitor.into_diagnostics());
                visited?;
                outcome.stats.units_visited += 1;
            }
        }
        Ok(())
    }

    fn is_target_fragment(&self, fragment: &PackageFragment) -> bool {
        fragment.kind == FragmentKind::Source
            && !fragment.units.is_empty()
            && fragment.name == self.filter.package
    }
}

/// Analyze the Java projects under `root` on disk.
pub fn build_view_graph(
    root: &Path,
    filter: &ScopeFilter,
    config: &GraphViewConfig,
) -> Result<AnalysisOutcome> {
    if !root.is_dir() {
        return Err(GraphViewError::Workspace(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let workspace = FsWorkspace::new(root, config.workspace.clone());
    let parser = JavaParser::new()?.reject_syntax_errors(config.parser.reject_syntax_errors);
    Analyzer::new(parser, filter.clone())
        .with_nature(config.workspace.java_nature.clone())
        .analyze(&workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CompilationUnit;
    use crate::workspace::{MemoryProject, MemoryWorkspace, UnitHandle};

    const CIRCLE: &str = "package shapes; class Circle { void area() { int r = 5; } }";

    fn analyzer() -> Analyzer<JavaParser> {
        Analyzer::new(
            JavaParser::new().unwrap(),
            ScopeFilter::new("shapes", "Circle", "area"),
        )
    }

    #[test]
    fn test_analyze_memory_workspace() {
        let workspace = MemoryWorkspace::new(vec![
            MemoryProject::java("Demo").with_unit("shapes", "Circle.java", CIRCLE)
        ]);
        let outcome = analyzer().analyze(&workspace).unwrap();
        assert_eq!(outcome.stats.projects_visited, 1);
        assert_eq!(outcome.stats.fragments_visited, 1);
        assert_eq!(outcome.stats.units_visited, 1);
        assert_eq!(outcome.registry.len(), 4);
        assert_eq!(outcome.registry.connection_count(), 3);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_project_filters() {
        let workspace = MemoryWorkspace::new(vec![
            MemoryProject::java("Closed")
                .with_unit("shapes", "Circle.java", CIRCLE)
                .closed(),
            MemoryProject::java("Plain")
                .with_unit("shapes", "Circle.java", CIRCLE)
                .without_natures(),
        ]);
        let outcome = analyzer().analyze(&workspace).unwrap();
        assert!(outcome.registry.is_empty());
        assert_eq!(outcome.stats.projects_visited, 0);
    }

    #[test]
    fn test_fragment_filters() {
        let workspace = MemoryWorkspace::new(vec![MemoryProject::java("Demo")
            .with_fragment(PackageFragment::binary("shapes"))
            .with_fragment(PackageFragment::source("shapes", vec![]))
            .with_unit("geometry", "Circle.java", CIRCLE.replace("shapes", "geometry").as_str())]);
        let outcome = analyzer().analyze(&workspace).unwrap();
        assert!(outcome.registry.is_empty());
        assert_eq!(outcome.stats.projects_visited, 1);
        assert_eq!(outcome.stats.fragments_visited, 0);
    }

    #[test]
    fn test_custom_nature() {
        let mut project = MemoryProject::java("Demo").with_unit("shapes", "Circle.java", CIRCLE);
        project.natures = vec!["com.example.nature".to_string()];
        let workspace = MemoryWorkspace::new(vec![project]);

        let outcome = analyzer().analyze(&workspace).unwrap();
        assert!(outcome.registry.is_empty());

        let outcome = analyzer()
            .with_nature("com.example.nature")
            .analyze(&workspace)
            .unwrap();
        assert_eq!(outcome.registry.len(), 4);
    }

    #[test]
    fn test_failing_project_is_skipped() {
        let workspace = MemoryWorkspace::new(vec![
            MemoryProject::java("Alpha").with_unit("shapes", "Circle.java", CIRCLE),
            MemoryProject::java("Broken").failing("model out of sync"),
            MemoryProject::java("Omega").with_unit("shapes", "Circle.java", CIRCLE),
        ]);
        let outcome = analyzer().analyze(&workspace).unwrap();
        assert_eq!(outcome.stats.projects_visited, 2);
        assert_eq!(outcome.stats.projects_skipped, 1);
        assert!(outcome.registry.contains("Alpha.shapes.Circle"));
        assert!(outcome.registry.contains("Omega.shapes.Circle"));
        assert!(matches!(
            &outcome.diagnostics[..],
            [Diagnostic::ProjectSkipped { project, .. }] if project == "Broken"
        ));
    }

    #[test]
    fn test_unreadable_unit_skips_rest_of_project() {
        let workspace = MemoryWorkspace::new(vec![MemoryProject::java("Demo").with_fragment(
            PackageFragment::source(
                "shapes",
                vec![
                    UnitHandle::memory("Circle.java", CIRCLE),
                    UnitHandle::file("/definitely/not/here/Square.java"),
                ],
            ),
        )]);
        let outcome = analyzer().analyze(&workspace).unwrap();
        // the unit parsed before the failure is kept
        assert!(outcome.registry.contains("Demo.shapes.Circle.area"));
        assert_eq!(outcome.stats.units_visited, 1);
        assert_eq!(outcome.stats.projects_skipped, 1);
    }

    #[test]
    fn test_structural_error_aborts_pass() {
        let workspace = MemoryWorkspace::new(vec![MemoryProject::java("Demo").with_unit(
            "",
            "Circle.java",
            "class Circle { void area() {} }",
        )]);
        let mut analyzer = analyzer();
        analyzer.set_filter(ScopeFilter::new("", "Circle", "area"));
        let err = analyzer.analyze(&workspace).unwrap_err();
        assert!(matches!(err, GraphViewError::ParentAbsent { .. }));
    }

    #[test]
    fn test_analyze_into_resets_registry() {
        let workspace = MemoryWorkspace::new(vec![
            MemoryProject::java("Demo").with_unit("shapes", "Circle.java", CIRCLE)
        ]);
        let mut analyzer = analyzer();
        let mut outcome = AnalysisOutcome::default();
        analyzer.analyze_into(&workspace, &mut outcome).unwrap();
        analyzer.analyze_into(&workspace, &mut outcome).unwrap();
        assert_eq!(outcome.registry.len(), 4);
        assert_eq!(outcome.registry.connection_count(), 3);
        assert_eq!(outcome.stats.units_visited, 1);
    }

    struct FixedParser(CompilationUnit);

    impl SourceParser for FixedParser {
        fn parse_unit(&mut self, _project: &str, _unit: &UnitHandle) -> Result<CompilationUnit> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_custom_parser_seam() {
        use crate::parser::{Declaration, PackageBinding};
        let pkg = PackageBinding::new("Demo", "shapes");
        let unit = CompilationUnit::new(
            "Circle.java",
            vec![
                Declaration::package("Demo", "shapes", 0),
                Declaration::class(&pkg, "Circle", 16, vec![]),
            ],
        );
        let workspace = MemoryWorkspace::new(vec![
            MemoryProject::java("Demo").with_unit("shapes", "Circle.java", "")
        ]);
        let outcome = Analyzer::new(FixedParser(unit), ScopeFilter::new("shapes", "Circle", "area"))
            .analyze(&workspace)
            .unwrap();
        assert_eq!(outcome.registry.len(), 2);
    }

    struct BrokenWorkspace;

    impl Workspace for BrokenWorkspace {
        type Project = MemoryProject;

        fn projects(&self) -> Result<Vec<MemoryProject>> {
            Err(GraphViewError::Workspace("workspace is closed".to_string()))
        }
    }

    #[test]
    fn test_unlistable_workspace_fails_the_pass() {
        let err = analyzer().analyze(&BrokenWorkspace).unwrap_err();
        assert!(matches!(err, GraphViewError::Workspace(ref m) if m == "workspace is closed"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_build_view_graph_requires_directory() {
        let err = build_view_graph(
            Path::new("/definitely/not/here"),
            &ScopeFilter::default(),
            &GraphViewConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GraphViewError::Workspace(_)));
    }
}
