//! The typed Abstract Syntax Tree consumed by the emitter.
//!
//! Everything under this module is produced by an external collaborator and is assumed well-typed: symbols
//! resolved, overloads picked, conversions materialized as explicit nodes,
//! locals assigned slot indices.

pub mod annotation;
pub mod class;
pub mod expr;
pub mod field;
pub mod method;

pub use annotation::{Annotation, AnnotationValue, Retention};
pub use class::ClassNode;
pub use expr::{ConstantValue, Context, Disposition, Expr, ExprKind};
pub use field::FieldNode;
pub use method::{MethodFlags, MethodNode, Parameter};
