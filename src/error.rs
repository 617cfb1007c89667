//! Errors signaled by the emitter.
//!
//! All three kinds are fatal to the current [`crate::emit_class`] call and
//! are never retried: malformed input is a bug in the caller's parser/typer,
//! not a user-recoverable condition.

/// An error raised while lowering a [`crate::ast::ClassNode`] to bytes.
///
/// A single `thiserror`-derived enum, one variant per error kind, carrying
/// enough context to point at the offending node without borrowing it.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The AST contained a node the emitter does not recognize. Indicates a
    /// parser/emitter version skew.
    #[error("unknown expression node kind: {0}")]
    UnknownNodeKind(String),

    /// A jump to an unresolved label, a forbidden context combination, or
    /// another bookkeeping invariant the emitter itself is supposed to
    /// uphold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The class writer facade rejected a request, e.g. a branch offset
    /// that does not fit the encoding the facade supports.
    #[error("class writer facade failure: {0}")]
    BackendFailure(String),

    /// A descriptor string produced or consumed internally did not parse.
    #[error(transparent)]
    InvalidDescriptor(#[from] crate::types::field_type::InvalidDescriptor),
}
