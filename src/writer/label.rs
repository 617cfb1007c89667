//! Opaque label handles.

/// An abstract position in a method's instruction stream, allocated lazily
/// and placed exactly once. Labels are identity-compared IDs, never
/// pointers into a buffer — the method writer resolves them to byte offsets
/// only once the whole body has been emitted.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, derive_more::Display)]
#[display("L{_0}")]
pub struct Label(pub(crate) u32);
