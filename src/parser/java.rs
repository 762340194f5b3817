//! Java declaration trees from tree-sitter.
//!
//! Bindings are resolved syntactically: the package comes from the unit's
//! package declaration, a declaring class is the nearest enclosing type
//! declaration, and a declaring method the nearest enclosing method or
//! constructor. Offsets are start byte offsets.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};
use tracing::{debug, warn};

use super::decl::*;
use super::SourceParser;
use crate::error::{GraphViewError, Result};
use crate::workspace::UnitHandle;

const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const METHOD_KINDS: &[&str] = &[
    "method_declaration",
    "constructor_declaration",
    "compact_constructor_declaration",
];

/// Whether a path names a Java source file.
pub fn is_java_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "java")
}

/// Tree-sitter backed `SourceParser` for Java.
pub struct JavaParser {
    parser: Parser,
    reject_syntax_errors: bool,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| GraphViewError::Parse {
                unit: "<java grammar>".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            parser,
            reject_syntax_errors: false,
        })
    }

    /// Fail units with syntax errors instead of using the recovered tree.
    pub fn reject_syntax_errors(mut self, reject: bool) -> Self {
        self.reject_syntax_errors = reject;
        self
    }

    /// Parse Java `source` belonging to `project` into a declaration tree.
    pub fn parse_source(&mut self, project: &str, unit: &str, source: &str) -> Result<CompilationUnit> {
        let tree = self.parse_tree(unit, source)?;
        let root = tree.root_node();
        let has_syntax_errors = root.has_error();

        if has_syntax_errors {
            let message = match first_error(root) {
                Some(node) => {
                    let pos = node.start_position();
                    format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1)
                }
                None => "syntax error".to_string(),
            };
            if self.reject_syntax_errors {
                return Err(GraphViewError::Parse {
                    unit: unit.to_string(),
                    message,
                });
            }
            warn!(unit, %message, "using recovered syntax tree");
        }

        let resolver = Resolver::new(project, source.as_bytes(), root);
        let declarations = resolver.collect(root);
        debug!(unit, count = declarations.len(), "parsed compilation unit");

        Ok(CompilationUnit {
            name: unit.to_string(),
            declarations,
            has_syntax_errors,
        })
    }

    fn parse_tree(&mut self, unit: &str, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| GraphViewError::Parse {
                unit: unit.to_string(),
                message: "tree-sitter returned no tree".to_string(),
            })
    }
}

impl SourceParser for JavaParser {
    fn parse_unit(&mut self, project: &str, unit: &UnitHandle) -> Result<CompilationUnit> {
        let source = unit.read()?;
        self.parse_source(project, unit.name(), &source)
    }
}

/// Find the first error or missing node in document order.
fn first_error(root: Node) -> Option<Node> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|child| child.has_error() || child.is_missing());
        node = next?;
    }
}

/// Enclosing elements at the current point of the walk.
#[derive(Debug, Clone, Default)]
struct Scope {
    class: Option<TypeBinding>,
    method: Option<MethodBinding>,
}

/// A declaration whose children are still being collected.
enum Pending {
    Type(TypeBinding, usize),
    Method(MethodBinding, usize),
    Variable(VariableBinding, usize),
}

impl Pending {
    fn close(self, children: Vec<Declaration>) -> Declaration {
        match self {
            Pending::Type(binding, offset) => Declaration::Type(TypeDecl {
                name: binding.name.clone(),
                binding,
                offset,
                children,
            }),
            Pending::Method(binding, offset) => Declaration::Method(MethodDecl {
                name: binding.name.clone(),
                binding,
                offset,
                children,
            }),
            Pending::Variable(binding, offset) => Declaration::Variable(VariableDecl {
                name: binding.name.clone(),
                binding,
                offset,
                children,
            }),
        }
    }
}

enum Step<'t> {
    Visit { node: Node<'t>, scope: usize, slot: usize },
    Close { pending: Pending, slot: usize, parent: usize },
}

/// Explicit work stack for the syntax tree walk. Expressions nest as deep as
/// the source does, so the walk must not recurse per tree level.
///
/// `scopes` and `slots` are arenas addressed by index; slot 0 collects the
/// top-level declarations.
struct Walk<'t> {
    steps: Vec<Step<'t>>,
    scopes: Vec<Scope>,
    slots: Vec<Vec<Declaration>>,
}

impl<'t> Walk<'t> {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            scopes: vec![Scope::default()],
            slots: vec![Vec::new()],
        }
    }

    fn push_children(&mut self, node: Node<'t>, scope: usize, slot: usize) {
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            self.steps.push(Step::Visit {
                node: child,
                scope,
                slot,
            });
        }
    }

    /// Start a declaration under `parent`. Steps pushed after this one fill
    /// the returned slot before the declaration is closed.
    fn open(&mut self, pending: Pending, parent: usize) -> usize {
        let slot = self.slots.len();
        self.slots.push(Vec::new());
        self.steps.push(Step::Close {
            pending,
            slot,
            parent,
        });
        slot
    }

    fn enter(&mut self, scope: Scope) -> usize {
        self.scopes.push(scope);
        self.scopes.len() - 1
    }
}

struct Resolver<'a> {
    source: &'a [u8],
    package: PackageBinding,
}

impl<'a> Resolver<'a> {
    fn new(project: &str, source: &'a [u8], root: Node) -> Self {
        let mut cursor = root.walk();
        let package = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_declaration")
            .map(|n| package_name(n, source))
            .unwrap_or_default();
        Self {
            source,
            package: PackageBinding::new(project, package),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn field_text(&self, node: Node, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    /// Declarations below `root`, in document order.
    fn collect(&self, root: Node) -> Vec<Declaration> {
        let mut walk = Walk::new();
        walk.push_children(root, 0, 0);
        while let Some(step) = walk.steps.pop() {
            match step {
                Step::Visit { node, scope, slot } => self.visit(&mut walk, node, scope, slot),
                Step::Close {
                    pending,
                    slot,
                    parent,
                } => {
                    let children = std::mem::take(&mut walk.slots[slot]);
                    walk.slots[parent].push(pending.close(children));
                }
            }
        }
        std::mem::take(&mut walk.slots[0])
    }

    fn visit<'t>(&self, walk: &mut Walk<'t>, node: Node<'t>, scope: usize, slot: usize) {
        let kind = node.kind();

        if kind == "package_declaration" {
            walk.slots[slot].push(Declaration::Package(PackageDecl {
                name: self.package.name.clone(),
                binding: self.package.clone(),
                offset: node.start_byte(),
            }));
            return;
        }

        if TYPE_KINDS.contains(&kind) {
            let name = self.field_text(node, "name").unwrap_or_default();
            self.open_type(walk, node, self.type_binding(name), slot);
            return;
        }

        if METHOD_KINDS.contains(&kind) {
            let class = walk.scopes[scope].class.clone();
            let binding = MethodBinding {
                name: self.field_text(node, "name").unwrap_or_default().to_string(),
                declaring_class: class.clone().unwrap_or_else(|| self.type_binding("")),
            };
            let inner = walk.enter(Scope {
                class,
                method: Some(binding.clone()),
            });
            let own = walk.open(Pending::Method(binding, node.start_byte()), slot);
            walk.push_children(node, inner, own);
            return;
        }

        match kind {
            "local_variable_declaration" => {
                let method = walk.scopes[scope].method.clone();
                self.declarators(walk, node, method, scope, slot);
            }
            "field_declaration" | "constant_declaration" => {
                self.declarators(walk, node, None, scope, slot);
            }
            "resource" => match self.field_text(node, "name") {
                Some(name) => {
                    let method = walk.scopes[scope].method.clone();
                    self.variable(walk, node, name, method, scope, slot);
                }
                None => walk.push_children(node, scope, slot),
            },
            // anonymous classes become unnamed types so scope pruning sees them
            "class_body" if is_anonymous_body(node) => {
                self.open_type(walk, node, self.type_binding(""), slot);
            }
            _ => walk.push_children(node, scope, slot),
        }
    }

    fn open_type<'t>(&self, walk: &mut Walk<'t>, node: Node<'t>, binding: TypeBinding, slot: usize) {
        let inner = walk.enter(Scope {
            class: Some(binding.clone()),
            method: None,
        });
        let own = walk.open(Pending::Type(binding, node.start_byte()), slot);
        walk.push_children(node, inner, own);
    }

    fn declarators<'t>(
        &self,
        walk: &mut Walk<'t>,
        node: Node<'t>,
        declaring_method: Option<MethodBinding>,
        scope: usize,
        slot: usize,
    ) {
        let mut cursor = node.walk();
        let declarators: Vec<Node<'t>> = node.children_by_field_name("declarator", &mut cursor).collect();
        // reversed so the stack closes them in source order
        for declarator in declarators.into_iter().rev() {
            if let Some(name) = self.field_text(declarator, "name") {
                self.variable(walk, declarator, name, declaring_method.clone(), scope, slot);
            }
        }
    }

    fn variable<'t>(
        &self,
        walk: &mut Walk<'t>,
        node: Node<'t>,
        name: &str,
        declaring_method: Option<MethodBinding>,
        scope: usize,
        slot: usize,
    ) {
        let binding = VariableBinding {
            name: name.to_string(),
            declaring_method,
        };
        let own = walk.open(Pending::Variable(binding, node.start_byte()), slot);
        if let Some(value) = node.child_by_field_name("value") {
            walk.steps.push(Step::Visit {
                node: value,
                scope,
                slot: own,
            });
        }
    }

    fn type_binding(&self, name: &str) -> TypeBinding {
        TypeBinding {
            package: self.package.clone(),
            name: name.to_string(),
        }
    }
}

fn package_name(node: Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
        .and_then(|n| n.utf8_text(source).ok())
        .unwrap_or_default();
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_anonymous_body(node: Node) -> bool {
    node.parent()
        .is_some_and(|p| matches!(p.kind(), "object_creation_expression" | "enum_constant"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> CompilationUnit {
        JavaParser::new()
            .unwrap()
            .parse_source("Demo", "Test.java", source)
            .unwrap()
    }

    fn type_decl(decl: &Declaration) -> &TypeDecl {
        match decl {
            Declaration::Type(t) => t,
            other => panic!("expected type declaration, got {:?}", other),
        }
    }

    fn method_decl(decl: &Declaration) -> &MethodDecl {
        match decl {
            Declaration::Method(m) => m,
            other => panic!("expected method declaration, got {:?}", other),
        }
    }

    fn variable_decl(decl: &Declaration) -> &VariableDecl {
        match decl {
            Declaration::Variable(v) => v,
            other => panic!("expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_is_java_source() {
        assert!(is_java_source(Path::new("src/shapes/Circle.java")));
        assert!(!is_java_source(Path::new("src/shapes/Circle.class")));
        assert!(!is_java_source(Path::new("Makefile")));
    }

    #[test]
    fn test_parse_circle_unit() {
        let source =
            "package shapes; class Circle { class Square {} void area(){ int r = 5; } void perimeter(){} }";
        let unit = parse(source);
        assert!(!unit.has_syntax_errors);
        assert_eq!(unit.declarations.len(), 2);

        let package = unit.package().unwrap();
        assert_eq!(package.name, "shapes");
        assert_eq!(package.binding.project, "Demo");
        assert_eq!(package.offset, 0);

        let circle = type_decl(&unit.declarations[1]);
        assert_eq!(circle.name, "Circle");
        assert_eq!(circle.offset, source.find("class Circle").unwrap());
        assert_eq!(circle.binding.package.name, "shapes");
        assert_eq!(circle.children.len(), 3);

        let square = type_decl(&circle.children[0]);
        assert_eq!(square.name, "Square");

        let area = method_decl(&circle.children[1]);
        assert_eq!(area.name, "area");
        assert_eq!(area.binding.declaring_class.name, "Circle");
        assert_eq!(area.offset, source.find("void area").unwrap());

        let r = variable_decl(&area.children[0]);
        assert_eq!(r.name, "r");
        assert_eq!(r.offset, source.find("r = 5").unwrap());
        let owner = r.binding.declaring_method.as_ref().unwrap();
        assert_eq!(owner.name, "area");
        assert_eq!(owner.declaring_class.name, "Circle");

        let perimeter = method_decl(&circle.children[2]);
        assert_eq!(perimeter.name, "perimeter");
        assert!(perimeter.children.is_empty());
    }

    #[test]
    fn test_qualified_package_name() {
        let unit = parse("package com.example.shapes;\nclass A {}");
        assert_eq!(unit.package().unwrap().name, "com.example.shapes");
        let a = type_decl(&unit.declarations[1]);
        assert_eq!(a.binding.package.name, "com.example.shapes");
    }

    #[test]
    fn test_default_package() {
        let unit = parse("class A { void run() { int x = 1; } }");
        assert!(unit.package().is_none());
        let a = type_decl(&unit.declarations[0]);
        assert_eq!(a.binding.package.name, "");
    }

    #[test]
    fn test_fields_have_no_declaring_method() {
        let unit = parse("package p; class A { int count = 0, total; void run() { int x = 1, y = 2; } }");
        let a = type_decl(&unit.declarations[1]);
        assert_eq!(a.children.len(), 3);
        for field in &a.children[..2] {
            assert!(variable_decl(field).binding.declaring_method.is_none());
        }
        let run = method_decl(&a.children[2]);
        let names: Vec<&str> = run
            .children
            .iter()
            .map(|d| variable_decl(d).name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_for_init_and_resources_are_locals() {
        let source = r#"
package p;
class A {
    void run() throws Exception {
        for (int i = 0; i < 3; i++) {}
        try (java.io.InputStream in = open()) {}
    }
}
"#;
        let unit = parse(source);
        let a = type_decl(&unit.declarations[1]);
        let run = method_decl(&a.children[0]);
        let names: Vec<&str> = run
            .children
            .iter()
            .map(|d| variable_decl(d).name.as_str())
            .collect();
        assert_eq!(names, vec!["i", "in"]);
    }

    #[test]
    fn test_anonymous_class_binding() {
        let source = r#"
package p;
class A {
    void run() {
        Runnable task = new Runnable() {
            public void run() { int inner = 1; }
        };
    }
}
"#;
        let unit = parse(source);
        let a = type_decl(&unit.declarations[1]);
        let run = method_decl(&a.children[0]);
        let task = variable_decl(&run.children[0]);
        assert_eq!(task.name, "task");

        let anon = type_decl(&task.children[0]);
        assert_eq!(anon.name, "");
        assert_eq!(anon.offset, source.find("{\n            public").unwrap());

        let anon_run = method_decl(&anon.children[0]);
        assert_eq!(anon_run.binding.declaring_class.name, "");
        let inner = variable_decl(&anon_run.children[0]);
        let owner = inner.binding.declaring_method.as_ref().unwrap();
        assert_eq!(owner.declaring_class.name, "");
    }

    #[test]
    fn test_constructors_enums_and_interfaces() {
        let source = r#"
package p;
interface Shape { double area(); }
enum Kind { ROUND; void describe() {} }
class Circle { Circle() { int seed = 3; } }
"#;
        let unit = parse(source);
        let names: Vec<&str> = unit.declarations[1..]
            .iter()
            .map(|d| type_decl(d).name.as_str())
            .collect();
        assert_eq!(names, vec!["Shape", "Kind", "Circle"]);

        let kind = type_decl(&unit.declarations[2]);
        assert!(kind
            .children
            .iter()
            .any(|d| matches!(d, Declaration::Method(m) if m.name == "describe")));

        let circle = type_decl(&unit.declarations[3]);
        let ctor = method_decl(&circle.children[0]);
        assert_eq!(ctor.name, "Circle");
        assert_eq!(variable_decl(&ctor.children[0]).name, "seed");
    }

    #[test]
    fn test_deeply_nested_expression() {
        let terms = vec!["1"; 10_000].join(" + ");
        let source = format!("package p; class A {{ void run() {{ int total = {terms}; int after = 2; }} }}");
        let unit = parse(&source);
        assert!(!unit.has_syntax_errors);

        let a = type_decl(&unit.declarations[1]);
        let run = method_decl(&a.children[0]);
        let names: Vec<&str> = run
            .children
            .iter()
            .map(|d| variable_decl(d).name.as_str())
            .collect();
        assert_eq!(names, vec!["total", "after"]);
    }

    #[test]
    fn test_syntax_errors_recovered_by_default() {
        let unit = parse("package p; class A { void run( { int x = 1; } }");
        assert!(unit.has_syntax_errors);
        assert!(unit.package().is_some());
    }

    #[test]
    fn test_syntax_errors_rejected_when_strict() {
        let mut parser = JavaParser::new().unwrap().reject_syntax_errors(true);
        let err = parser
            .parse_source("Demo", "Broken.java", "package p; class A { void run( { }")
            .unwrap_err();
        assert!(matches!(err, GraphViewError::Parse { ref unit, .. } if unit == "Broken.java"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_empty_source() {
        let unit = parse("");
        assert!(unit.declarations.is_empty());
        assert!(!unit.has_syntax_errors);
    }
}
