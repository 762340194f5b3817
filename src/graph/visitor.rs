//! Declaration visitor: turns one compilation unit into graph nodes.
//!
//! The walk is top-down and scope-filtered: a type whose name is not the
//! target class is skipped together with everything inside it, and likewise
//! for methods. Parents are therefore always materialized before their
//! children, and every connection is created right after its child node.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace, warn};

use super::engine::ModelRegistry;
use super::types::{class_id, method_id, package_id, EdgeKind, GraphNode};
use crate::config::ScopeFilter;
use crate::error::{GraphViewError, Result};
use crate::parser::{
    CompilationUnit, Declaration, MethodDecl, PackageDecl, TypeDecl, VariableDecl,
};

/// Non-fatal findings of an analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A local variable whose method node is not in the registry.
    /// The variable node exists but has no connection.
    OrphanVariable {
        unit: String,
        variable: String,
        method: String,
    },
    /// The unit had syntax errors and the recovered tree was used.
    SyntaxRecovered { unit: String },
    /// A project failed to enumerate or parse and was skipped.
    ProjectSkipped { project: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OrphanVariable {
                unit,
                variable,
                method,
            } => write!(f, "{unit}: variable `{variable}` has no method node `{method}`"),
            Diagnostic::SyntaxRecovered { unit } => {
                write!(f, "{unit}: syntax errors, used recovered tree")
            }
            Diagnostic::ProjectSkipped { project, reason } => {
                write!(f, "project `{project}` skipped: {reason}")
            }
        }
    }
}

/// Visits compilation units into a registry under one scope filter.
pub struct DeclarationVisitor<'a> {
    registry: &'a mut ModelRegistry,
    filter: &'a ScopeFilter,
    /// Ids the current unit will produce, used to classify missing parents.
    expected: HashSet<String>,
    unit: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DeclarationVisitor<'a> {
    pub fn new(registry: &'a mut ModelRegistry, filter: &'a ScopeFilter) -> Self {
        Self {
            registry,
            filter,
            expected: HashSet::new(),
            unit: String::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn visit_unit(&mut self, unit: &CompilationUnit) -> Result<()> {
        debug!(unit = %unit.name, scope = %self.filter, "visiting compilation unit");
        self.unit = unit.name.clone();
        self.expected = expected_ids(&unit.declarations, self.filter);
        if unit.has_syntax_errors {
            self.diagnostics.push(Diagnostic::SyntaxRecovered {
                unit: unit.name.clone(),
            });
        }
        self.visit_all(&unit.declarations)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn visit_all(&mut self, declarations: &[Declaration]) -> Result<()> {
        for decl in declarations {
            self.visit(decl)?;
        }
        Ok(())
    }

    fn visit(&mut self, decl: &Declaration) -> Result<()> {
        match decl {
            Declaration::Package(p) => self.visit_package(p),
            Declaration::Type(t) => self.visit_type(t),
            Declaration::Method(m) => self.visit_method(m),
            Declaration::Variable(v) => self.visit_variable(v),
        }
    }

    fn visit_package(&mut self, decl: &PackageDecl) -> Result<()> {
        let node = GraphNode::package(&decl.binding.project, &decl.name);
        if !self.registry.insert_node_if_absent(node)?.is_added() {
            trace!(package = %decl.name, "package already in registry");
        }
        Ok(())
    }

    fn visit_type(&mut self, decl: &TypeDecl) -> Result<()> {
        if decl.name != self.filter.class {
            trace!(class = %decl.name, "pruning type outside scope");
            return Ok(());
        }
        let package = &decl.binding.package;
        let node = GraphNode::class(&package.project, &package.name, &decl.name);
        self.require_parent(&node)?;
        let (parent, id) = (node.parent_id.clone(), node.id.clone());
        self.registry.insert_node_if_absent(node)?;
        self.registry
            .add_connection(&parent, &id, decl.offset, EdgeKind::Contains)?;
        self.visit_all(&decl.children)
    }

    fn visit_method(&mut self, decl: &MethodDecl) -> Result<()> {
        if decl.name != self.filter.method {
            trace!(method = %decl.name, "pruning method outside scope");
            return Ok(());
        }
        let class = &decl.binding.declaring_class;
        let node = GraphNode::method(
            &class.package.project,
            &class.package.name,
            &class.name,
            &decl.name,
        );
        self.require_parent(&node)?;
        let (parent, id) = (node.parent_id.clone(), node.id.clone());
        self.registry.insert_node_if_absent(node)?;
        self.registry
            .add_connection(&parent, &id, decl.offset, EdgeKind::Contains)?;
        self.visit_all(&decl.children)
    }

    fn visit_variable(&mut self, decl: &VariableDecl) -> Result<()> {
        let Some(method) = &decl.binding.declaring_method else {
            trace!(field = %decl.name, "skipping field");
            return self.visit_all(&decl.children);
        };
        let class = &method.declaring_class;
        let node = GraphNode::variable(
            &class.package.project,
            &class.package.name,
            &class.name,
            &method.name,
            &decl.name,
        );
        let (owner, id) = (node.parent_id.clone(), node.id.clone());
        self.registry.insert_node_if_absent(node)?;

        if self.registry.contains(&owner) {
            // Variables point up to their method, unlike the containment edges.
            self.registry
                .add_connection(&id, &owner, decl.offset, EdgeKind::DeclaredIn)?;
        } else {
            warn!(variable = %id, method = %owner, "method node missing, variable left unconnected");
            self.diagnostics.push(Diagnostic::OrphanVariable {
                unit: self.unit.clone(),
                variable: id,
                method: owner,
            });
        }
        self.visit_all(&decl.children)
    }

    fn require_parent(&self, node: &GraphNode) -> Result<()> {
        if self.registry.contains(&node.parent_id) {
            return Ok(());
        }
        let child = node.id.clone();
        let parent = node.parent_id.clone();
        let kind = node.kind();
        if self.expected.contains(&parent) {
            Err(GraphViewError::ParentNotVisited {
                child,
                parent,
                kind,
            })
        } else {
            Err(GraphViewError::ParentAbsent {
                child,
                parent,
                kind,
            })
        }
    }
}

/// Ids of the package, class and method nodes a visit of `declarations`
/// would produce under `filter`.
fn expected_ids(declarations: &[Declaration], filter: &ScopeFilter) -> HashSet<String> {
    let mut ids = HashSet::new();
    let mut stack: Vec<&Declaration> = declarations.iter().collect();
    while let Some(decl) = stack.pop() {
        match decl {
            Declaration::Package(p) => {
                ids.insert(package_id(&p.binding.project, &p.name));
            }
            Declaration::Type(t) if t.name == filter.class => {
                let pkg = &t.binding.package;
                ids.insert(class_id(&pkg.project, &pkg.name, &t.name));
                stack.extend(t.children.iter());
            }
            Declaration::Method(m) if m.name == filter.method => {
                let class = &m.binding.declaring_class;
                ids.insert(method_id(
                    &class.package.project,
                    &class.package.name,
                    &class.name,
                    &m.name,
                ));
                stack.extend(m.children.iter());
            }
            Declaration::Variable(_) => stack.extend(decl.children()),
            Declaration::Type(_) | Declaration::Method(_) => {}
        }
    }
    ids
}
