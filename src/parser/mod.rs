//! Parsing Java sources into declaration trees.
//!
//! `SourceParser` is the seam between the graph core and whatever resolves
//! symbols. `JavaParser` is the bundled tree-sitter implementation.

pub mod decl;
pub mod java;

pub use decl::{
    CompilationUnit, Declaration, MethodBinding, MethodDecl, PackageBinding, PackageDecl,
    TypeBinding, TypeDecl, VariableBinding, VariableDecl,
};
pub use java::{is_java_source, JavaParser};

use crate::error::Result;
use crate::workspace::UnitHandle;

/// Turns a compilation unit handle into a declaration tree with bindings.
pub trait SourceParser {
    fn parse_unit(&mut self, project: &str, unit: &UnitHandle) -> Result<CompilationUnit>;
}
