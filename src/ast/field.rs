//! Field nodes.

use crate::ast::annotation::Annotation;
use crate::ast::expr::ConstantValue;
use crate::types::{AccessSet, FieldType};

/// A field declared by a [`crate::ast::ClassNode`].
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub access: AccessSet,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub field_type: FieldType,
    /// A compile-time constant initializer, written out as a `ConstantValue`
    /// attribute and coerced to the field's declared primitive width by the
    /// class emitter.
    pub constant_value: Option<ConstantValue>,
}
