//! Method nodes.

use crate::ast::annotation::{Annotation, ParameterAnnotations};
use crate::ast::expr::Expr;
use crate::types::{AccessSet, ClassReference, FieldType, ReturnType};

/// The information of a method parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub param_type: FieldType,
    pub access: AccessSet,
    pub annotations: Vec<Annotation>,
    /// The local variable slot this parameter occupies, assigned by the
    /// parser; slot 0 is `this` for an instance
    /// method and is not itself represented as a `Parameter`.
    pub slot: u16,
}

/// The three shapes a [`MethodNode`] can take, controlling the name and
/// return type the class emitter assigns.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MethodFlags {
    /// An ordinary method.
    Plain,
    /// A constructor, emitted as `<init>` returning `void`.
    Constructor,
    /// The class's static initializer, emitted as `<clinit>` returning `void`.
    StaticInitializer,
}

/// A method, constructor, or static initializer declared by a
/// [`crate::ast::ClassNode`].
#[derive(Debug, Clone)]
pub struct MethodNode {
    pub access: AccessSet,
    /// Ignored for [`MethodFlags::Constructor`]/[`MethodFlags::StaticInitializer`],
    /// whose names are fixed by the class emitter.
    pub name: String,
    pub return_type: ReturnType,
    pub parameters: Vec<Parameter>,
    pub thrown_exceptions: Vec<ClassReference>,
    /// The method body. `None` for `abstract`/`native` methods, which the
    /// class emitter declares without a `Code` attribute.
    pub body: Option<Expr>,
    pub flags: MethodFlags,
    pub is_varargs: bool,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
    pub runtime_visible_parameter_annotations: ParameterAnnotations,
    pub runtime_invisible_parameter_annotations: ParameterAnnotations,
}

impl MethodNode {
    /// The local slot of `this`, valid only when the method is not `static`.
    pub const THIS_SLOT: u16 = 0;

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.flags == MethodFlags::Constructor
    }

    #[must_use]
    pub fn is_static_initializer(&self) -> bool {
        self.flags == MethodFlags::StaticInitializer
    }
}
