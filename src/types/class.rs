//! References to JVM classes and interfaces.

/// A reference to a class or interface by its internal (slash-separated) name,
/// e.g. `java/lang/String`.
///
/// See the [JVM Specification §4.2.1](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.2.1).
#[derive(Debug, PartialEq, Eq, Hash, Clone, derive_more::Display)]
#[display("{internal_name}")]
pub struct ClassReference {
    /// The internal name of the class or interface, using `/` as the
    /// package separator.
    pub internal_name: String,
}

impl ClassReference {
    /// Creates a new class reference from an internal name.
    #[must_use]
    pub fn new(internal_name: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
        }
    }

    /// The well-known `java/lang/Object` reference.
    #[must_use]
    pub fn object() -> Self {
        Self::new("java/lang/Object")
    }

    /// The well-known `java/lang/Throwable` reference, used as the catch type
    /// for a handler with no declared exception class.
    #[must_use]
    pub fn throwable() -> Self {
        Self::new("java/lang/Throwable")
    }
}

impl From<&str> for ClassReference {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassReference {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn well_known_references() {
        assert_eq!(ClassReference::object().internal_name, "java/lang/Object");
        assert_eq!(
            ClassReference::throwable().internal_name,
            "java/lang/Throwable"
        );
    }
}
