//! Static (operand-type × operator) → opcode tables.
//!
//! Every function here is total and side-effect free; none of them touch
//! the constant pool or the instruction stream. That is the method writer's
//! job — these just answer "which opcode(s)".

use crate::types::{FieldType, PrimitiveType};

use super::{ArrayKind, CmpBias, ConvertOp, NumKind};

/// Maps a [`FieldType`] to the [`NumKind`] its arithmetic/load/store/return
/// opcodes are specialized for. `byte`/`char`/`short`/`boolean` all share
/// the `int` family outside of array element access.
#[must_use]
pub fn num_kind(ty: &FieldType) -> NumKind {
    match ty {
        FieldType::Base(PrimitiveType::Long) => NumKind::Long,
        FieldType::Base(PrimitiveType::Float) => NumKind::Float,
        FieldType::Base(PrimitiveType::Double) => NumKind::Double,
        FieldType::Base(_) => NumKind::Int,
        FieldType::Object(_) | FieldType::Array(_) => NumKind::Ref,
    }
}

/// Maps a [`FieldType`] to the [`ArrayKind`] selecting its `*ALOAD`/
/// `*ASTORE`/`NEWARRAY` opcode family.
#[must_use]
pub fn array_kind(ty: &FieldType) -> ArrayKind {
    match ty {
        FieldType::Base(PrimitiveType::Boolean) => ArrayKind::Boolean,
        FieldType::Base(PrimitiveType::Byte) => ArrayKind::Byte,
        FieldType::Base(PrimitiveType::Char) => ArrayKind::Char,
        FieldType::Base(PrimitiveType::Short) => ArrayKind::Short,
        FieldType::Base(PrimitiveType::Int) => ArrayKind::Int,
        FieldType::Base(PrimitiveType::Long) => ArrayKind::Long,
        FieldType::Base(PrimitiveType::Float) => ArrayKind::Float,
        FieldType::Base(PrimitiveType::Double) => ArrayKind::Double,
        FieldType::Object(_) | FieldType::Array(_) => ArrayKind::Ref,
    }
}

/// The `NEWARRAY` primitive type tag, for the
/// 1-D primitive-array allocation path of `new-array`.
#[must_use]
pub const fn newarray_tag(ty: PrimitiveType) -> u8 {
    match ty {
        PrimitiveType::Boolean => 4,
        PrimitiveType::Char => 5,
        PrimitiveType::Float => 6,
        PrimitiveType::Double => 7,
        PrimitiveType::Byte => 8,
        PrimitiveType::Short => 9,
        PrimitiveType::Int => 10,
        PrimitiveType::Long => 11,
    }
}

/// The buckets `int` literal pushes fall into, used by the method
/// writer to choose between `ICONST_*`, `BIPUSH`, `SIPUSH`, and `LDC`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IntEncoding {
    /// One of `ICONST_M1`..`ICONST_5`.
    Const(i32),
    /// `BIPUSH`, operand fits `i8`.
    Byte(i8),
    /// `SIPUSH`, operand fits `i16` but not `i8`.
    Short(i16),
    /// `LDC`/`LDC_W` of an `Integer` constant pool entry.
    Ldc,
}

/// Classifies an `int` value into its shortest push encoding.
#[must_use]
pub fn classify_int(v: i32) -> IntEncoding {
    if (-1..=5).contains(&v) {
        IntEncoding::Const(v)
    } else if let Ok(b) = i8::try_from(v) {
        IntEncoding::Byte(b)
    } else if let Ok(s) = i16::try_from(v) {
        IntEncoding::Short(s)
    } else {
        IntEncoding::Ldc
    }
}

/// Classifies a `long` value: `LCONST_0`/`LCONST_1`, or `LDC2_W`.
#[must_use]
pub fn classify_long(v: i64) -> Option<i64> {
    match v {
        0 | 1 => Some(v),
        _ => None,
    }
}

/// Classifies a `float` value: `FCONST_0`/`FCONST_1`/`FCONST_2`, or `LDC`.
/// Compares by bit pattern so `-0.0` and `NaN` never spuriously match.
#[must_use]
pub fn classify_float(v: f32) -> Option<u8> {
    [0.0f32, 1.0, 2.0]
        .iter()
        .position(|c| c.to_bits() == v.to_bits())
        .map(|i| i as u8)
}

/// Classifies a `double` value: `DCONST_0`/`DCONST_1`, or `LDC2_W`.
#[must_use]
pub fn classify_double(v: f64) -> Option<u8> {
    [0.0f64, 1.0]
        .iter()
        .position(|c| c.to_bits() == v.to_bits())
        .map(|i| i as u8)
}

/// The widening conversion opcode(s) from `source` to `target`, or empty if
/// the JVM represents both the same way (e.g. `byte` to `int`: both are
/// `int`-kind locals/stack slots, no opcode needed).
#[must_use]
pub fn widen(source: PrimitiveType, target: PrimitiveType) -> Vec<ConvertOp> {
    use PrimitiveType::{Byte, Char, Double, Float, Int, Long, Short};
    if source == target {
        return vec![];
    }
    let is_int_kind = |p: PrimitiveType| matches!(p, Byte | Short | Char | Int);
    match (source, target) {
        (s, t) if is_int_kind(s) && is_int_kind(t) => vec![],
        (s, Long) if is_int_kind(s) => vec![ConvertOp::I2L],
        (s, Float) if is_int_kind(s) => vec![ConvertOp::I2F],
        (s, Double) if is_int_kind(s) => vec![ConvertOp::I2D],
        (Long, Float) => vec![ConvertOp::L2F],
        (Long, Double) => vec![ConvertOp::L2D],
        (Float, Double) => vec![ConvertOp::F2D],
        _ => vec![],
    }
}

/// The narrowing conversion opcode(s) from `source` to `target`. Narrowing
/// to `byte`/`char`/`short` passes through `int` first when the source is
/// wider than `int`.
#[must_use]
pub fn narrow(source: PrimitiveType, target: PrimitiveType) -> Vec<ConvertOp> {
    use PrimitiveType::{Byte, Char, Double, Float, Int, Long, Short};
    if source == target {
        return vec![];
    }
    let to_int_first = match source {
        Long => Some(ConvertOp::L2I),
        Float => Some(ConvertOp::F2I),
        Double => Some(ConvertOp::D2I),
        _ => None,
    };
    match target {
        Int => to_int_first.into_iter().collect(),
        Long => match source {
            Float => vec![ConvertOp::F2L],
            Double => vec![ConvertOp::D2L],
            _ => vec![],
        },
        Float => match source {
            Long => vec![ConvertOp::L2F],
            Double => vec![ConvertOp::D2F],
            _ => vec![],
        },
        Byte | Char | Short => {
            let mut ops: Vec<ConvertOp> = to_int_first.into_iter().collect();
            ops.push(match target {
                Byte => ConvertOp::I2B,
                Char => ConvertOp::I2C,
                Short => ConvertOp::I2S,
                _ => unreachable!(),
            });
            ops
        }
        Double | Boolean => vec![],
    }
}

/// Which `*CMP*` bias to use for a float/double ordering relation, so that
/// comparison against `NaN` is always `false`.
#[must_use]
pub fn float_cmp_bias(op: crate::ast::expr::CompareOp) -> CmpBias {
    use crate::ast::expr::CompareOp::{Ge, Gt, Le, Lt};
    match op {
        Lt | Le => CmpBias::Greater,
        Gt | Ge => CmpBias::Less,
        // Eq/Ne don't branch off a comparison's sign via a cmp bias
        // ambiguity; either bias yields the same IFEQ/IFNE branch, so
        // default to the more common `Greater`.
        _ => CmpBias::Greater,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::PrimitiveType::*;

    #[test]
    fn classify_int_buckets() {
        assert_eq!(classify_int(3), IntEncoding::Const(3));
        assert_eq!(classify_int(100), IntEncoding::Byte(100));
        assert_eq!(classify_int(30_000), IntEncoding::Short(30_000));
        assert_eq!(classify_int(1_000_000), IntEncoding::Ldc);
        assert_eq!(classify_int(i32::MIN), IntEncoding::Ldc);
        assert_eq!(classify_int(i32::MAX), IntEncoding::Ldc);
    }

    #[test]
    fn widen_int_to_long_emits_i2l() {
        assert_eq!(widen(Int, Long), vec![ConvertOp::I2L]);
        assert_eq!(widen(Byte, Int), vec![]);
    }

    #[test]
    fn narrow_double_to_byte_passes_through_int() {
        assert_eq!(narrow(Double, Byte), vec![ConvertOp::D2I, ConvertOp::I2B]);
    }

    #[test]
    fn narrow_long_to_float_is_direct() {
        assert_eq!(narrow(Long, Float), vec![ConvertOp::L2F]);
    }

    #[test]
    fn classify_float_matches_by_bits_not_value() {
        assert_eq!(classify_float(0.0), Some(0));
        assert_eq!(classify_float(-0.0), None);
        assert_eq!(classify_float(f32::NAN), None);
    }
}
