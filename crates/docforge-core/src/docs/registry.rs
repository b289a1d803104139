//! Statically declared module surfaces
//!
//! Modules describe their public surface through explicit registration:
//! top-level attributes, classes with their bases, and class members with
//! their doc strings. The scanner walks these declarations instead of
//! inspecting a live runtime.

use tracing::debug;

/// What kind of class member a declaration describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    StaticMethod,
    ClassMethod,
    Property,
    Attribute,
}

impl MemberKind {
    /// Whether members of this kind can be invoked
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Method | Self::StaticMethod | Self::ClassMethod)
    }
}

/// A single class member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    pub doc: Option<String>,
}

/// A class and the members it declares itself
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub name: String,
    /// Base class names, resolved within the owning module
    pub bases: Vec<String>,
    pub members: Vec<MemberDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    pub fn method(self, name: impl Into<String>, doc: impl Into<String>) -> Self {
        self.member(MemberDef {
            name: name.into(),
            kind: MemberKind::Method,
            doc: Some(doc.into()),
        })
    }

    pub fn static_method(self, name: impl Into<String>, doc: impl Into<String>) -> Self {
        self.member(MemberDef {
            name: name.into(),
            kind: MemberKind::StaticMethod,
            doc: Some(doc.into()),
        })
    }

    pub fn undocumented_method(self, name: impl Into<String>) -> Self {
        self.member(MemberDef {
            name: name.into(),
            kind: MemberKind::Method,
            doc: None,
        })
    }

    pub fn property(self, name: impl Into<String>, doc: impl Into<String>) -> Self {
        self.member(MemberDef {
            name: name.into(),
            kind: MemberKind::Property,
            doc: Some(doc.into()),
        })
    }

    pub fn attribute(self, name: impl Into<String>) -> Self {
        self.member(MemberDef {
            name: name.into(),
            kind: MemberKind::Attribute,
            doc: None,
        })
    }
}

/// A top-level attribute of a module. Only classes are scanned; free
/// functions and constants are recorded so the surface stays complete.
#[derive(Debug, Clone)]
pub enum Attribute {
    Class(ClassDef),
    Function { name: String },
    Constant { name: String },
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Self::Class(class) => &class.name,
            Self::Function { name } | Self::Constant { name } => name,
        }
    }
}

/// A module and its top-level attributes in registration order
#[derive(Debug, Clone)]
pub struct ModuleDef {
    pub name: String,
    attributes: Vec<Attribute>,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn class(mut self, class: ClassDef) -> Self {
        self.attributes.push(Attribute::Class(class));
        self
    }

    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(Attribute::Function { name: name.into() });
        self
    }

    pub fn constant(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(Attribute::Constant { name: name.into() });
        self
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassDef> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Class(class) if class.name == name => Some(class),
            _ => None,
        })
    }
}

/// Modules available for scanning, keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDef>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the bundled modules already registered
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(super::concept_forge::module());
        catalog
    }

    /// Register a module, replacing any module with the same identifier
    pub fn register(&mut self, module: ModuleDef) {
        debug!("Registering module '{}'", module.name);
        match self.modules.iter_mut().find(|m| m.name == module.name) {
            Some(slot) => *slot = module,
            None => self.modules.push(module),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }
}
