//! Access flags, at two levels.
//!
//! The AST carries an unordered set of source-level
//! modifiers shared by every declaration kind. Each class-file entity
//! (class, field, method, parameter) accepts only a subset of those
//! modifiers and maps them onto its own JVM bitmask — see the
//! `ClassAccessFlags`/`FieldAccessFlags`/`MethodAccessFlags`/
//! `ParameterAccessFlags` bitflags below.

use std::collections::BTreeSet;

use bitflags::bitflags;

/// A single source-level modifier, as the AST's "Access set" is drawn from.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum AccessFlag {
    /// `abstract`
    Abstract,
    /// `final`
    Final,
    /// `private`
    Private,
    /// `protected`
    Protected,
    /// `public`
    Public,
    /// `static`
    Static,
    /// `synchronized`
    Synchronized,
    /// `transient`
    Transient,
    /// Variable-arity (the last parameter is declared `...`).
    Varargs,
    /// `volatile`
    Volatile,
}

/// An unordered set of [`AccessFlag`]s attached to a declaration.
pub type AccessSet = BTreeSet<AccessFlag>;

bitflags! {
    /// Access flags for a class or interface.
    /// See the [JVM Specification §4.1](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.1-200-E.1).
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct ClassAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `final`; no subclasses are permitted.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by the
        /// `invokespecial` instruction. Set unconditionally by the class
        /// emitter; not a settable AST member.
        const SUPER = 0x0020;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags for a field.
    /// See the [JVM Specification §4.5](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.5-200).
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct FieldAccessFlags: u16 {
        /// Declared `public`.
        const PUBLIC = 0x0001;
        /// Declared `private`.
        const PRIVATE = 0x0002;
        /// Declared `protected`.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`.
        const FINAL = 0x0010;
        /// Declared `volatile`; never cached.
        const VOLATILE = 0x0040;
        /// Declared `transient`; not written or read by a persistent object manager.
        const TRANSIENT = 0x0080;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags for a method.
    /// See the [JVM Specification §4.6](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.6-200-A.1).
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct MethodAccessFlags: u16 {
        /// Declared `public`.
        const PUBLIC = 0x0001;
        /// Declared `private`.
        const PRIVATE = 0x0002;
        /// Declared `protected`.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`; must not be overridden.
        const FINAL = 0x0010;
        /// Declared `synchronized`; invocation is wrapped by a monitor use.
        const SYNCHRONIZED = 0x0020;
        /// Declared with variable number of arguments.
        const VARARGS = 0x0080;
        /// Declared `abstract`; no implementation is provided.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags for a method parameter.
    /// See the [JVM Specification §4.7.24](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.24).
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct ParameterAccessFlags: u16 {
        /// Declared `final`.
        const FINAL = 0x0010;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Implicitly declared by the compiler, per the source language specification.
        const MANDATED = 0x8000;
    }
}

/// Folds an [`AccessSet`] into a [`ClassAccessFlags`] bitmask. `ACC_SUPER`
/// is not handled here; the class emitter ORs it in unconditionally.
#[must_use]
pub fn class_access_flags(access: &AccessSet) -> ClassAccessFlags {
    let mut flags = ClassAccessFlags::empty();
    for flag in access {
        flags |= match flag {
            AccessFlag::Public => ClassAccessFlags::PUBLIC,
            AccessFlag::Final => ClassAccessFlags::FINAL,
            AccessFlag::Abstract => ClassAccessFlags::ABSTRACT,
            _ => continue,
        };
    }
    flags
}

/// Folds an [`AccessSet`] into a [`FieldAccessFlags`] bitmask.
#[must_use]
pub fn field_access_flags(access: &AccessSet) -> FieldAccessFlags {
    let mut flags = FieldAccessFlags::empty();
    for flag in access {
        flags |= match flag {
            AccessFlag::Public => FieldAccessFlags::PUBLIC,
            AccessFlag::Private => FieldAccessFlags::PRIVATE,
            AccessFlag::Protected => FieldAccessFlags::PROTECTED,
            AccessFlag::Static => FieldAccessFlags::STATIC,
            AccessFlag::Final => FieldAccessFlags::FINAL,
            AccessFlag::Volatile => FieldAccessFlags::VOLATILE,
            AccessFlag::Transient => FieldAccessFlags::TRANSIENT,
            _ => continue,
        };
    }
    flags
}

/// Folds an [`AccessSet`] into a [`MethodAccessFlags`] bitmask.
#[must_use]
pub fn method_access_flags(access: &AccessSet) -> MethodAccessFlags {
    let mut flags = MethodAccessFlags::empty();
    for flag in access {
        flags |= match flag {
            AccessFlag::Public => MethodAccessFlags::PUBLIC,
            AccessFlag::Private => MethodAccessFlags::PRIVATE,
            AccessFlag::Protected => MethodAccessFlags::PROTECTED,
            AccessFlag::Static => MethodAccessFlags::STATIC,
            AccessFlag::Final => MethodAccessFlags::FINAL,
            AccessFlag::Synchronized => MethodAccessFlags::SYNCHRONIZED,
            AccessFlag::Abstract => MethodAccessFlags::ABSTRACT,
            AccessFlag::Varargs => MethodAccessFlags::VARARGS,
            _ => continue,
        };
    }
    flags
}

/// Folds an [`AccessSet`] into a [`ParameterAccessFlags`] bitmask.
#[must_use]
pub fn parameter_access_flags(access: &AccessSet) -> ParameterAccessFlags {
    let mut flags = ParameterAccessFlags::empty();
    for flag in access {
        if *flag == AccessFlag::Final {
            flags |= ParameterAccessFlags::FINAL;
        }
    }
    flags
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn class_flags_ignore_irrelevant_modifiers() {
        let access = AccessSet::from([AccessFlag::Public, AccessFlag::Volatile]);
        assert_eq!(class_access_flags(&access), ClassAccessFlags::PUBLIC);
    }

    #[test]
    fn method_flags_pick_up_varargs() {
        let access = AccessSet::from([AccessFlag::Public, AccessFlag::Varargs]);
        assert_eq!(
            method_access_flags(&access),
            MethodAccessFlags::PUBLIC | MethodAccessFlags::VARARGS
        );
    }
}
