//! The class writer facade.
//!
//! A thin wrapper over a class-file builder exposing begin/end class,
//! declare field, declare method, and (within a method) individual
//! instructions, labels, try/catch table entries, line numbers, local
//! variable debug entries, and annotations. This facade computes stack-map
//! frames and `max_stack`/`max_locals`; the expression and class emitters
//! never do so themselves.

pub mod annotations;
pub mod byte_vec;
pub mod class_writer;
pub mod constant_pool;
pub mod frame;
pub mod label;
pub mod method_writer;

pub use class_writer::ClassWriter;
pub use label::Label;
pub use method_writer::MethodWriter;
