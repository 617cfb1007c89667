//! The class node, the root of the AST.

use crate::ast::annotation::Annotation;
use crate::ast::field::FieldNode;
use crate::ast::method::MethodNode;
use crate::types::{AccessSet, ClassReference};

/// A class or interface, the unit `emit_class` consumes.
#[derive(Debug, Clone)]
pub struct ClassNode {
    /// The name recorded in the `SourceFile` attribute, if any.
    pub source_file: Option<String>,
    pub internal_name: String,
    pub access: AccessSet,
    pub annotations: Vec<Annotation>,
    pub parent: ClassReference,
    pub interfaces: Vec<ClassReference>,
    /// The body of `<clinit>`, if the class declares one.
    pub static_initializer: Option<MethodNode>,
    /// Constructors, emitted in AST order.
    pub constructors: Vec<MethodNode>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
}

impl ClassNode {
    /// A minimal class extending `java/lang/Object` with no members, useful
    /// as a starting point in tests and the `dump_class` demo.
    #[must_use]
    pub fn new(internal_name: impl Into<String>, access: AccessSet) -> Self {
        ClassNode {
            source_file: None,
            internal_name: internal_name.into(),
            access,
            annotations: Vec::new(),
            parent: ClassReference::object(),
            interfaces: Vec::new(),
            static_initializer: None,
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }
}
