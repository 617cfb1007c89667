//! Stack map frames (JVM Spec §4.7.4), computed by the class writer facade
//! so the expression/class emitters never have to.
//!
//! **Simplification, noted in `DESIGN.md`:** every frame is serialized as a
//! `full_frame` (tag `255`). The compact encodings (`same_frame`,
//! `append_frame`, `chop_frame`, ...) exist purely to save bytes; a verifier
//! accepts `full_frame` everywhere those would apply. Since this crate
//! controls every instruction the emitter ever produces (there is no
//! "foreign" bytecode to re-verify), byte-optimal frame encoding is left as
//! a non-goal alongside hand-rolled frame computation itself.

use crate::types::ClassReference;
use crate::writer::byte_vec::ByteVec;
use crate::writer::constant_pool::ConstantPool;

/// The verification type of one local variable slot or operand stack entry
/// (JVM Spec §4.7.4).
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationTypeInfo {
    Top,
    Integer,
    Float,
    Long,
    Double,
    Null,
    UninitializedThis,
    Object(ClassReference),
    /// An object created by the `new` at the given bytecode offset but not
    /// yet passed to `<init>`.
    Uninitialized { offset: u16 },
}

impl VerificationTypeInfo {
    /// Whether this type occupies two verification-type slots (`long`/`double`).
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, VerificationTypeInfo::Long | VerificationTypeInfo::Double)
    }

    fn write(&self, out: &mut ByteVec, pool: &mut ConstantPool) {
        match self {
            VerificationTypeInfo::Top => out.push_u8(0),
            VerificationTypeInfo::Integer => out.push_u8(1),
            VerificationTypeInfo::Float => out.push_u8(2),
            VerificationTypeInfo::Double => out.push_u8(3),
            VerificationTypeInfo::Long => out.push_u8(4),
            VerificationTypeInfo::Null => out.push_u8(5),
            VerificationTypeInfo::UninitializedThis => out.push_u8(6),
            VerificationTypeInfo::Object(class) => {
                out.push_u8(7);
                out.push_u16(pool.add_class(&class.internal_name));
            }
            VerificationTypeInfo::Uninitialized { offset } => {
                out.push_u8(8);
                out.push_u16(*offset);
            }
        }
    }
}

/// A single stack map frame, always written as a `full_frame` (see module
/// docs).
#[derive(Debug, Clone)]
pub struct StackMapFrame {
    /// The bytecode offset this frame describes, in absolute terms; the
    /// `StackMapTable` writer converts this to the delta the format
    /// requires.
    pub offset: u16,
    pub locals: Vec<VerificationTypeInfo>,
    pub stack: Vec<VerificationTypeInfo>,
}

/// Serializes a full `StackMapTable` attribute body (entry count plus every
/// frame, offsets converted to the required deltas: the first frame's delta
/// is its raw offset, every subsequent one is relative to the previous
/// frame's offset plus one).
pub fn write_stack_map_table(
    frames: &[StackMapFrame],
    out: &mut ByteVec,
    pool: &mut ConstantPool,
) {
    out.push_u16(frames.len() as u16);
    let mut previous_offset: Option<u16> = None;
    for frame in frames {
        let delta = match previous_offset {
            None => frame.offset,
            Some(prev) => frame.offset - prev - 1,
        };
        previous_offset = Some(frame.offset);
        out.push_u8(255); // full_frame
        out.push_u16(delta);
        out.push_u16(frame.locals.len() as u16);
        for local in &frame.locals {
            local.write(out, pool);
        }
        out.push_u16(frame.stack.len() as u16);
        for item in &frame.stack {
            item.write(out, pool);
        }
    }
}
