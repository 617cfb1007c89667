//! `classgen` — a JVM class-file emitter driven by a typed expression AST.
//!
//! Given a fully-resolved [`ast::ClassNode`] (already type-checked, with
//! conversions materialized and locals slot-assigned), [`emit_class`]
//! produces a byte buffer containing a Java class file, major version 52
//! (Java SE 8), with `ACC_SUPER` always set and stack-map frames computed
//! by the [`writer`] facade.
//!
//! Four layers: [`instructions`] (static opcode tables),
//! [`writer`] (the class-file builder facade), [`emitter::expr`] (the
//! expression-to-bytecode lowerer), and [`emitter::class_emitter`]
//! (orchestration). [`ast`] and [`types`] are the shared data model; a
//! parser/typer producing [`ast::ClassNode`] values is an external
//! collaborator this crate does not provide.
//!
//! # Features
#![doc = document_features::document_features!()]

pub mod ast;
pub mod config;
pub mod emitter;
pub mod error;
pub mod instructions;
pub mod types;
pub mod writer;

#[cfg(test)]
mod tests;

pub use config::EmitConfig;
pub use emitter::emit_class;
pub use error::EmitError;
