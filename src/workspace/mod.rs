//! Projects, package fragments and compilation units.
//!
//! The driver only sees these traits. `MemoryWorkspace` holds everything in
//! memory; `FsWorkspace` discovers projects on disk.

pub mod fs;

pub use fs::{FsProject, FsWorkspace};

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{GraphViewError, Result};

/// Nature id that marks a project as a Java project.
pub const JAVA_NATURE: &str = "org.eclipse.jdt.core.javanature";

/// Where a package fragment comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Source,
    Binary,
}

/// Source text of a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UnitSource {
    File(PathBuf),
    Memory(String),
}

/// Handle to one compilation unit. Reading is deferred until parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitHandle {
    name: String,
    source: UnitSource,
}

impl UnitHandle {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            source: UnitSource::File(path),
        }
    }

    pub fn memory(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: UnitSource::Memory(text.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            UnitSource::File(path) => Some(path),
            UnitSource::Memory(_) => None,
        }
    }

    pub fn read(&self) -> Result<Cow<'_, str>> {
        match &self.source {
            UnitSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| GraphViewError::io(path, e)),
            UnitSource::Memory(text) => Ok(Cow::Borrowed(text)),
        }
    }
}

/// A package fragment: one package within one source root or archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFragment {
    /// Dotted package name, `""` for the default package.
    pub name: String,
    pub kind: FragmentKind,
    pub units: Vec<UnitHandle>,
}

impl PackageFragment {
    pub fn source(name: impl Into<String>, units: Vec<UnitHandle>) -> Self {
        Self {
            name: name.into(),
            kind: FragmentKind::Source,
            units,
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FragmentKind::Binary,
            units: Vec::new(),
        }
    }
}

/// A project the driver can analyze.
pub trait ProjectSource {
    fn name(&self) -> &str;
    fn is_open(&self) -> bool;
    fn has_nature(&self, nature: &str) -> bool;
    fn package_fragments(&self) -> Result<Vec<PackageFragment>>;
}

/// A collection of projects.
pub trait Workspace {
    type Project: ProjectSource;

    fn projects(&self) -> Result<Vec<Self::Project>>;
}

// ─── In-Memory Workspace ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MemoryProject {
    pub name: String,
    pub open: bool,
    pub natures: Vec<String>,
    pub fragments: Vec<PackageFragment>,
    /// When set, enumerating fragments fails with this message.
    pub failure: Option<String>,
}

impl MemoryProject {
    /// An open Java project with no fragments.
    pub fn java(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: true,
            natures: vec![JAVA_NATURE.to_string()],
            fragments: Vec::new(),
            failure: None,
        }
    }

    pub fn with_fragment(mut self, fragment: PackageFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// Shorthand for a source fragment holding one in-memory unit.
    pub fn with_unit(self, package: &str, name: &str, text: &str) -> Self {
        self.with_fragment(PackageFragment::source(
            package,
            vec![UnitHandle::memory(name, text)],
        ))
    }

    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn without_natures(mut self) -> Self {
        self.natures.clear();
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

impl ProjectSource for MemoryProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn has_nature(&self, nature: &str) -> bool {
        self.natures.iter().any(|n| n == nature)
    }

    fn package_fragments(&self) -> Result<Vec<PackageFragment>> {
        match &self.failure {
            Some(message) => Err(GraphViewError::Workspace(message.clone())),
            None => Ok(self.fragments.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorkspace {
    pub projects: Vec<MemoryProject>,
}

impl MemoryWorkspace {
    pub fn new(projects: Vec<MemoryProject>) -> Self {
        Self { projects }
    }
}

impl Workspace for MemoryWorkspace {
    type Project = MemoryProject;

    fn projects(&self) -> Result<Vec<MemoryProject>> {
        Ok(self.projects.clone())
    }
}
