//! The declaration tree handed from a parser to the visitor.
//!
//! Every declaration carries a resolved binding: the project, package and
//! enclosing elements it belongs to, plus the start offset in the source.

/// Package a declaration resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBinding {
    pub project: String,
    /// Fully-qualified package name, `""` for the default package.
    pub name: String,
}

impl PackageBinding {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
        }
    }
}

/// A resolved type (class, interface, enum, record or annotation type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    pub package: PackageBinding,
    /// Simple name, `""` for anonymous classes.
    pub name: String,
}

/// A resolved method or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    pub name: String,
    pub declaring_class: TypeBinding,
}

/// A resolved variable. Fields have no declaring method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: String,
    pub declaring_method: Option<MethodBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: String,
    pub binding: PackageBinding,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub binding: TypeBinding,
    pub offset: usize,
    pub children: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub binding: MethodBinding,
    pub offset: usize,
    pub children: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    pub binding: VariableBinding,
    pub offset: usize,
    /// Declarations nested in the initializer (anonymous classes).
    pub children: Vec<Declaration>,
}

/// One node of the declaration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Package(PackageDecl),
    Type(TypeDecl),
    Method(MethodDecl),
    Variable(VariableDecl),
}

impl Declaration {
    pub fn package(project: &str, name: &str, offset: usize) -> Self {
        Declaration::Package(PackageDecl {
            name: name.to_string(),
            binding: PackageBinding::new(project, name),
            offset,
        })
    }

    pub fn class(package: &PackageBinding, name: &str, offset: usize, children: Vec<Declaration>) -> Self {
        Declaration::Type(TypeDecl {
            name: name.to_string(),
            binding: TypeBinding {
                package: package.clone(),
                name: name.to_string(),
            },
            offset,
            children,
        })
    }

    pub fn method(class: &TypeBinding, name: &str, offset: usize, children: Vec<Declaration>) -> Self {
        Declaration::Method(MethodDecl {
            name: name.to_string(),
            binding: MethodBinding {
                name: name.to_string(),
                declaring_class: class.clone(),
            },
            offset,
            children,
        })
    }

    pub fn local(method: &MethodBinding, name: &str, offset: usize) -> Self {
        Declaration::Variable(VariableDecl {
            name: name.to_string(),
            binding: VariableBinding {
                name: name.to_string(),
                declaring_method: Some(method.clone()),
            },
            offset,
            children: Vec::new(),
        })
    }

    pub fn field(name: &str, offset: usize) -> Self {
        Declaration::Variable(VariableDecl {
            name: name.to_string(),
            binding: VariableBinding {
                name: name.to_string(),
                declaring_method: None,
            },
            offset,
            children: Vec::new(),
        })
    }

    pub fn children(&self) -> &[Declaration] {
        match self {
            Declaration::Package(_) => &[],
            Declaration::Type(d) => &d.children,
            Declaration::Method(d) => &d.children,
            Declaration::Variable(d) => &d.children,
        }
    }
}

/// A parsed compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Display name, usually the file path.
    pub name: String,
    pub declarations: Vec<Declaration>,
    /// Set when the parser had to recover from syntax errors.
    pub has_syntax_errors: bool,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            name: name.into(),
            declarations,
            has_syntax_errors: false,
        }
    }

    /// The package declaration of the unit, if any.
    pub fn package(&self) -> Option<&PackageDecl> {
        self.declarations.iter().find_map(|d| match d {
            Declaration::Package(p) => Some(p),
            _ => None,
        })
    }
}
