//! Type representations shared across the AST, the instruction tables, and
//! the class writer facade.

pub mod access;
pub mod class;
pub mod descriptor;
pub mod field_type;

pub use access::{
    class_access_flags, field_access_flags, method_access_flags, parameter_access_flags,
    AccessFlag, AccessSet, ClassAccessFlags, FieldAccessFlags, MethodAccessFlags,
    ParameterAccessFlags,
};
pub use class::ClassReference;
pub use descriptor::{MethodDescriptor, ReturnType};
pub use field_type::{FieldType, PrimitiveType};

/// The JVM operand width class of a [`FieldType`].
///
/// `long` and `double` occupy two stack slots / two local variable slots;
/// every other type occupies one.
/// See the [JVM Specification §2.6.1](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-2.html#jvms-2.6.1).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Category {
    /// A single-slot value.
    One,
    /// A double-slot value (`long` or `double`).
    Two,
}

impl Category {
    /// The number of local variable slots or stack words this category occupies.
    #[must_use]
    pub const fn width(self) -> u16 {
        match self {
            Category::One => 1,
            Category::Two => 2,
        }
    }
}
