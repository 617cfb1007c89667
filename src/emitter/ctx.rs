//! The emitter context.
//!
//! Carries the current method writer, the active continue/break labels, a
//! label-name → (continue, break) map for labeled loops, and the debug
//! flag. Treated as an immutable record: entering a loop or labeled
//! statement builds a *child* context (via [`EmitCtx::with_loop`]) rather
//! than mutating the parent's label scope in place.
//!
//! **Simplification, noted in `DESIGN.md`:** a persistent list of borrowed
//! parent frames would fight the borrow checker once `method` is *also*
//! borrowed mutably through the same context (the label-scope lifetime and
//! the method-writer reborrow lifetime don't line up cleanly). Loop nesting
//! in practice is shallow, so `LabelScope` here is an owned `Vec` that is
//! cheaply cloned on every `with_loop` — the same "each recursive call gets
//! its own extended scope, the parent's is untouched" behavior, without the
//! self-referential lifetime.

use crate::writer::{Label, MethodWriter};

/// One loop or labeled-statement's continue/break targets.
#[derive(Debug, Clone)]
pub struct LoopLabels {
    /// The source label name, if this scope was entered via a labeled loop
    /// or labeled statement (`outer: while (...) { ... }`).
    pub name: Option<String>,
    pub continue_label: Label,
    pub break_label: Label,
}

/// The stack of enclosing loop/labeled-statement scopes, innermost last.
#[derive(Debug, Clone, Default)]
pub struct LabelScope {
    scopes: Vec<LoopLabels>,
}

impl LabelScope {
    /// The nearest enclosing scope — the target of an unlabeled `continue`/
    /// `break`.
    #[must_use]
    pub fn innermost(&self) -> Option<&LoopLabels> {
        self.scopes.last()
    }

    /// The nearest enclosing scope with the given name — the target of
    /// `continue label;`/`break label;`.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&LoopLabels> {
        self.scopes.iter().rev().find(|s| s.name.as_deref() == Some(name))
    }

    fn pushed(&self, entry: LoopLabels) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(entry);
        LabelScope { scopes }
    }
}

/// Per-recursive-call emitter state.
pub struct EmitCtx<'m> {
    pub method: &'m mut MethodWriter,
    pub labels: LabelScope,
    pub debug: bool,
}

impl<'m> EmitCtx<'m> {
    #[must_use]
    pub fn new(method: &'m mut MethodWriter, debug: bool) -> Self {
        EmitCtx {
            method,
            labels: LabelScope::default(),
            debug,
        }
    }

    /// Reborrows the method writer for a shorter-lived child context,
    /// carrying the same label scope — used whenever a recursive call
    /// doesn't itself establish a new loop/labeled scope.
    pub fn reborrow(&mut self) -> EmitCtx<'_> {
        EmitCtx {
            method: self.method,
            labels: self.labels.clone(),
            debug: self.debug,
        }
    }

    /// Builds a child context with one more loop/labeled-statement scope
    /// pushed on top, for lowering the body of a `while`/`for`/labeled
    /// statement.
    pub fn with_loop(&mut self, name: Option<String>, continue_label: Label, break_label: Label) -> EmitCtx<'_> {
        let labels = self.labels.pushed(LoopLabels {
            name,
            continue_label,
            break_label,
        });
        EmitCtx {
            method: self.method,
            labels,
            debug: self.debug,
        }
    }
}
