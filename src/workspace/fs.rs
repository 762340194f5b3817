//! Filesystem workspace: discovers projects and package fragments on disk.
//!
//! A directory holding a `.project` descriptor or one of the configured
//! source roots is a project. Otherwise each non-hidden subdirectory of the
//! workspace root is treated as a project. Source roots are walked with
//! `ignore`, so `.gitignore` rules apply.

use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{PackageFragment, ProjectSource, UnitHandle, Workspace};
use crate::config::WorkspaceConfig;
use crate::error::{GraphViewError, Result};
use crate::parser::is_java_source;

const DESCRIPTOR: &str = ".project";

/// Workspace rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
    config: WorkspaceConfig,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>, config: WorkspaceConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_project_dir(&self, dir: &Path) -> bool {
        dir.join(DESCRIPTOR).is_file()
            || self
                .config
                .source_roots
                .iter()
                .any(|src| dir.join(src).is_dir())
    }

    fn project(&self, dir: &Path) -> FsProject {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .or_else(|| {
                dir.canonicalize()
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            })
            .unwrap_or_else(|| "project".to_string());
        FsProject {
            name,
            root: dir.to_path_buf(),
            descriptor: fs::read_to_string(dir.join(DESCRIPTOR)).ok(),
            source_roots: self.config.source_roots.clone(),
            assume_java: self.config.assume_java,
        }
    }
}

impl Workspace for FsWorkspace {
    type Project = FsProject;

    fn projects(&self) -> Result<Vec<FsProject>> {
        if self.is_project_dir(&self.root) {
            return Ok(vec![self.project(&self.root)]);
        }

        let entries = fs::read_dir(&self.root).map_err(|e| GraphViewError::io(&self.root, e))?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_dir()))
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.path())
            .collect();
        dirs.sort();

        Ok(dirs.iter().map(|dir| self.project(dir)).collect())
    }
}

/// A project directory on disk.
#[derive(Debug, Clone)]
pub struct FsProject {
    name: String,
    root: PathBuf,
    descriptor: Option<String>,
    source_roots: Vec<String>,
    assume_java: bool,
}

impl FsProject {
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn existing_source_roots(&self) -> Vec<PathBuf> {
        self.source_roots
            .iter()
            .map(|src| self.root.join(src))
            .filter(|path| path.is_dir())
            .collect()
    }
}

impl ProjectSource for FsProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.root.is_dir()
    }

    fn has_nature(&self, nature: &str) -> bool {
        match &self.descriptor {
            Some(descriptor) => descriptor.contains(nature),
            None => self.assume_java,
        }
    }

    fn package_fragments(&self) -> Result<Vec<PackageFragment>> {
        let roots = self.existing_source_roots();
        let mut fragments = Vec::new();

        for src in &roots {
            // Nested source roots (src vs src/main/java) are walked on their own.
            let nested: Vec<PathBuf> = roots.iter().filter(|r| *r != src).cloned().collect();
            let mut packages: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

            let walker = WalkBuilder::new(src)
                .hidden(true)
                .git_ignore(true)
                .git_exclude(true)
                .require_git(false)
                .filter_entry(move |entry| !nested.iter().any(|n| n == entry.path()))
                .build();

            for entry in walker {
                let entry = entry.map_err(|e| GraphViewError::Workspace(e.to_string()))?;
                let Some(file_type) = entry.file_type() else {
                    continue;
                };
                let path = entry.path();
                if file_type.is_dir() {
                    packages.entry(package_name(src, path)).or_default();
                } else if file_type.is_file() && is_java_source(path) {
                    let dir = path.parent().unwrap_or(src);
                    packages
                        .entry(package_name(src, dir))
                        .or_default()
                        .push(path.to_path_buf());
                }
            }

            debug!(
                project = %self.name,
                root = %src.display(),
                packages = packages.len(),
                "scanned source root"
            );

            for (name, mut files) in packages {
                files.sort();
                let units = files.into_iter().map(UnitHandle::file).collect();
                fragments.push(PackageFragment::source(name, units));
            }
        }

        Ok(fragments)
    }
}

/// Dotted package name of `dir` relative to the source root.
fn package_name(src: &Path, dir: &Path) -> String {
    dir.strip_prefix(src)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::JAVA_NATURE;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn workspace(root: &Path) -> FsWorkspace {
        FsWorkspace::new(root, WorkspaceConfig::default())
    }

    #[test]
    fn test_root_with_source_dir_is_single_project() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/shapes/Circle.java", "package shapes; class Circle {}");

        let projects = workspace(dir.path()).projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].root(), dir.path());
    }

    #[test]
    fn test_subdirectories_are_projects() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Demo/src/shapes/Circle.java", "package shapes;");
        write(dir.path(), "Other/src/util/Strings.java", "package util;");
        write(dir.path(), ".metadata/log", "");

        let projects = workspace(dir.path()).projects().unwrap();
        let names: Vec<&str> = projects.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Demo", "Other"]);
    }

    #[test]
    fn test_descriptor_controls_nature() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Demo/.project",
            &format!("<projectDescription><natures><nature>{JAVA_NATURE}</nature></natures></projectDescription>"),
        );
        write(dir.path(), "Web/.project", "<projectDescription><natures/></projectDescription>");
        write(dir.path(), "Loose/src/A.java", "class A {}");

        let projects = workspace(dir.path()).projects().unwrap();
        let by_name = |name: &str| projects.iter().find(|p| p.name() == name).unwrap();
        assert!(by_name("Demo").has_nature(JAVA_NATURE));
        assert!(!by_name("Web").has_nature(JAVA_NATURE));
        // no descriptor: falls back to `assume_java`
        assert!(by_name("Loose").has_nature(JAVA_NATURE));

        let strict = FsWorkspace::new(
            dir.path(),
            WorkspaceConfig {
                assume_java: false,
                ..Default::default()
            },
        );
        let projects = strict.projects().unwrap();
        let loose = projects.iter().find(|p| p.name() == "Loose").unwrap();
        assert!(!loose.has_nature(JAVA_NATURE));
    }

    #[test]
    fn test_package_fragments() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/Main.java", "class Main {}");
        write(dir.path(), "src/shapes/Square.java", "package shapes;");
        write(dir.path(), "src/shapes/Circle.java", "package shapes;");
        write(dir.path(), "src/shapes/notes.txt", "not java");
        write(dir.path(), "src/shapes/solid/Cube.java", "package shapes.solid;");
        fs::create_dir_all(dir.path().join("src/empty")).unwrap();

        let project = workspace(dir.path()).projects().unwrap().remove(0);
        let fragments = project.package_fragments().unwrap();
        let names: Vec<&str> = fragments.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["", "empty", "shapes", "shapes.solid"]);

        let shapes = fragments.iter().find(|f| f.name == "shapes").unwrap();
        let units: Vec<&str> = shapes
            .units
            .iter()
            .map(|u| u.path().unwrap().file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(units, vec!["Circle.java", "Square.java"]);

        let empty = fragments.iter().find(|f| f.name == "empty").unwrap();
        assert!(empty.units.is_empty());
    }

    #[test]
    fn test_nested_source_roots_not_duplicated() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main/java/shapes/Circle.java", "package shapes;");

        let project = workspace(dir.path()).projects().unwrap().remove(0);
        let fragments = project.package_fragments().unwrap();
        let with_units: Vec<&str> = fragments
            .iter()
            .filter(|f| !f.units.is_empty())
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(with_units, vec!["shapes"]);
    }

    #[test]
    fn test_gitignored_sources_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "src/generated/Gen.java", "package generated;");
        write(dir.path(), "src/shapes/Circle.java", "package shapes;");

        let project = workspace(dir.path()).projects().unwrap().remove(0);
        let fragments = project.package_fragments().unwrap();
        assert!(fragments.iter().all(|f| f.name != "generated"));
        assert!(fragments.iter().any(|f| f.name == "shapes"));
    }
}
