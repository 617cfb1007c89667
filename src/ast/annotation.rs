//! Annotations.

use std::collections::BTreeMap;

use crate::types::ClassReference;

/// The retention policy of an annotation, mirroring `java.lang.annotation.RetentionPolicy`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Retention {
    /// Discarded by the compiler; never reaches the class file. Annotations
    /// at this retention are dropped by the emitter.
    Source,
    /// Recorded in the class file but not visible to the reflection API at
    /// runtime.
    Class,
    /// Recorded in the class file and visible to the reflection API.
    Runtime,
}

/// An annotation attached to a class, field, method, or parameter.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// The annotation interface's type.
    pub annotation_type: ClassReference,
    pub retention: Retention,
    /// The recognized key/value pairs, in declaration order.
    pub values: Vec<(String, AnnotationValue)>,
}

/// A value carried by an [`Annotation`].
#[derive(Debug, Clone)]
pub enum AnnotationValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// A nested annotation value.
    Annotation(Box<Annotation>),
    /// An array of values of uniform shape.
    Array(Vec<AnnotationValue>),
}

/// The annotations attached to each parameter of a method, indexed by
/// parameter position.
pub type ParameterAnnotations = BTreeMap<u16, Vec<Annotation>>;
