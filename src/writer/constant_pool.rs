//! The constant pool, with interning.
//!
//! Modeled on `Ka-Pi`'s `SymbolTable`/`ClassWriter::write_output` (a real
//! JVM bytecode assembler): a flat, 1-indexed table of [`Constant`]s built
//! up by `add_*` calls that dedupe by value, then serialized verbatim in
//! `ClassWriter::finish`.

use std::collections::HashMap;

use crate::writer::byte_vec::ByteVec;

/// One constant pool entry (JVM Spec §4.4).
#[derive(Debug, Clone)]
pub enum Constant {
    Utf8(Vec<u8>),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
}

impl Constant {
    const fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => 1,
            Constant::Integer(_) => 3,
            Constant::Float(_) => 4,
            Constant::Long(_) => 5,
            Constant::Double(_) => 6,
            Constant::Class { .. } => 7,
            Constant::String { .. } => 8,
            Constant::FieldRef { .. } => 9,
            Constant::MethodRef { .. } => 10,
            Constant::InterfaceMethodRef { .. } => 11,
            Constant::NameAndType { .. } => 12,
        }
    }

    /// Whether this entry occupies two consecutive pool slots.
    const fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// A normalized, hashable key used purely for interning; floats key off
/// their bit pattern so `-0.0`/`NaN` dedupe exactly, not by `PartialEq`.
#[derive(PartialEq, Eq, Hash, Clone)]
enum InternKey {
    Utf8(Vec<u8>),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
}

/// The constant pool under construction.
#[derive(Debug, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    interned: HashMap<InternKey, u16>,
}

impl ConstantPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, key: InternKey, constant: Constant) -> u16 {
        if let Some(&index) = self.interned.get(&key) {
            return index;
        }
        let index = self.next_index();
        let wide = constant.is_wide();
        self.constants.push(constant);
        self.interned.insert(key, index);
        if wide {
            // The following slot is unusable; nothing is ever interned to
            // it since `next_index` always accounts for the padding below.
        }
        index
    }

    fn next_index(&self) -> u16 {
        let mut index = 1u16;
        for c in &self.constants {
            index += if c.is_wide() { 2 } else { 1 };
        }
        index
    }

    pub fn add_utf8(&mut self, s: &str) -> u16 {
        let bytes = cesu8::to_java_cesu8(s).into_owned();
        self.intern(InternKey::Utf8(bytes.clone()), Constant::Utf8(bytes))
    }

    pub fn add_integer(&mut self, v: i32) -> u16 {
        self.intern(InternKey::Integer(v), Constant::Integer(v))
    }

    pub fn add_float(&mut self, v: f32) -> u16 {
        self.intern(InternKey::Float(v.to_bits()), Constant::Float(v))
    }

    pub fn add_long(&mut self, v: i64) -> u16 {
        self.intern(InternKey::Long(v), Constant::Long(v))
    }

    pub fn add_double(&mut self, v: f64) -> u16 {
        self.intern(InternKey::Double(v.to_bits()), Constant::Double(v))
    }

    pub fn add_string(&mut self, s: &str) -> u16 {
        let utf8 = self.add_utf8(s);
        self.intern(InternKey::String(utf8), Constant::String { string_index: utf8 })
    }

    pub fn add_class(&mut self, internal_name: &str) -> u16 {
        let name = self.add_utf8(internal_name);
        self.intern(InternKey::Class(name), Constant::Class { name_index: name })
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.intern(
            InternKey::NameAndType(name_index, descriptor_index),
            Constant::NameAndType {
                name_index,
                descriptor_index,
            },
        )
    }

    pub fn add_field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.intern(
            InternKey::FieldRef(class_index, name_and_type_index),
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            },
        )
    }

    pub fn add_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.intern(
            InternKey::MethodRef(class_index, name_and_type_index),
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            },
        )
    }

    pub fn add_interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.intern(
            InternKey::InterfaceMethodRef(class_index, name_and_type_index),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            },
        )
    }

    /// The declared `constant_pool_count`: one more than the highest
    /// occupied index (JVM Spec §4.1).
    #[must_use]
    pub fn count(&self) -> u16 {
        self.next_index()
    }

    /// Serializes every entry, in insertion order, as the `cp_info` table.
    pub fn write(&self, out: &mut ByteVec) {
        for constant in &self.constants {
            out.push_u8(constant.tag());
            match constant {
                Constant::Utf8(bytes) => {
                    out.push_u16(bytes.len() as u16);
                    out.push_bytes(bytes);
                }
                Constant::Integer(v) => out.push_i32(*v),
                Constant::Float(v) => out.push_u32(v.to_bits()),
                Constant::Long(v) => out.push_u64(*v as u64),
                Constant::Double(v) => out.push_u64(v.to_bits()),
                Constant::Class { name_index } => out.push_u16(*name_index),
                Constant::String { string_index } => out.push_u16(*string_index),
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                }
                | Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push_u16(*class_index);
                    out.push_u16(*name_and_type_index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    out.push_u16(*name_index);
                    out.push_u16(*descriptor_index);
                }
            }
        }
    }
}
