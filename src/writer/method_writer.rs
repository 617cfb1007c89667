//! The method writer: per-method instruction stream, labels, exception
//! table, line numbers, and local variable debug entries, plus
//! the abstract interpretation pass that computes `max_stack`, `max_locals`,
//! and stack map frames.
//!
//! See `frame.rs` for the simplifications this interpreter relies on.

use std::collections::HashMap;

use crate::ast::expr::{CompareOp, FieldRef, InvokeKind, MethodRef};
use crate::instructions::{ArrayKind, CmpBias, ConvertOp, Instruction, NumKind};
use crate::instructions::tables::{classify_double, classify_float, classify_int, classify_long, IntEncoding};
use crate::types::{ClassReference, FieldType, ReturnType};
use crate::writer::byte_vec::ByteVec;
use crate::writer::constant_pool::ConstantPool;
use crate::writer::frame::{StackMapFrame, VerificationTypeInfo};
use crate::writer::label::Label;
use crate::EmitError;

/// An entry in the `exception_table` of a `Code` attribute (JVM Spec §4.7.3).
#[derive(Debug, Clone)]
pub struct ExceptionHandler {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    /// `None` models a `finally`'s synthetic catch-all, written with
    /// `catch_type = 0`.
    pub catch_type: Option<ClassReference>,
}

/// A recorded local-variable debug entry, pending label resolution.
#[derive(Debug, Clone)]
pub struct LocalVarDebug {
    pub name: String,
    pub descriptor: FieldType,
    pub start: Label,
    pub end: Label,
    pub slot: u16,
}

#[derive(Debug, Clone)]
enum Item {
    Instr(Instruction),
    Place(Label),
    Line(u32),
}

/// Builds one method's `Code` attribute.
pub struct MethodWriter {
    next_label: u32,
    items: Vec<Item>,
    exception_handlers: Vec<ExceptionHandler>,
    local_debug: Vec<LocalVarDebug>,
    /// The declared type of every parameter slot (including `this` for
    /// instance methods), used to seed the frame interpreter's initial
    /// locals.
    initial_locals: Vec<VerificationTypeInfo>,
    debug: bool,
}

/// Which jump-operand position in an encoded instruction needs patching
/// once its target label's PC is known.
enum PendingPatch {
    /// A 2-byte relative branch offset at `operand_offset`, relative to
    /// `instr_pc`.
    Branch { instr_pc: u16, operand_offset: usize },
    /// A 4-byte absolute PC in a table/lookup switch, relative to `switch_pc`.
    SwitchTarget { switch_pc: u16, operand_offset: usize },
}

impl MethodWriter {
    #[must_use]
    pub fn new(initial_locals: Vec<VerificationTypeInfo>, debug: bool) -> Self {
        MethodWriter {
            next_label: 0,
            items: Vec::new(),
            exception_handlers: Vec::new(),
            local_debug: Vec::new(),
            initial_locals,
            debug,
        }
    }

    /// Whether local variable debug entries should be recorded at all,
    /// gated behind both the `local-variable-tables` feature and the
    /// runtime `debug` flag.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        if self.debug && !cfg!(feature = "local-variable-tables") {
            log::debug!("debug config requested but the `local-variable-tables` feature is compiled out; ignoring");
        }
        self.debug && cfg!(feature = "local-variable-tables")
    }

    /// Allocates a fresh, unplaced label.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Places a label at the current instruction position. Every label must
    /// be placed exactly once.
    pub fn place_label(&mut self, label: Label) {
        self.items.push(Item::Place(label));
    }

    /// Records the source line the next-emitted instructions map to. A no-op if `line` repeats the last recorded one.
    pub fn set_line(&mut self, line: u32) {
        self.items.push(Item::Line(line));
    }

    pub fn emit(&mut self, instr: Instruction) {
        self.items.push(Item::Instr(instr));
    }

    /// The emitted instructions so far, labels/line markers stripped --
    /// used by the crate's own stack-discipline property tests, which
    /// check net stack effect without going through a full `finish()`.
    #[cfg(test)]
    pub(crate) fn instructions(&self) -> Vec<Instruction> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Instr(i) => Some(i.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn add_exception_handler(&mut self, handler: ExceptionHandler) {
        self.exception_handlers.push(handler);
    }

    pub fn record_local_debug(&mut self, entry: LocalVarDebug) {
        if self.debug_enabled() {
            self.local_debug.push(entry);
        }
    }

    /// Assembles the `Code` attribute body: resolves labels, computes
    /// `max_stack`/`max_locals` and stack map frames, and serializes
    /// everything the caller (`ClassWriter`) needs to write the attribute.
    pub fn finish(self, pool: &mut ConstantPool) -> Result<MethodBytes, EmitError> {
        let MethodWriter {
            items,
            exception_handlers,
            local_debug,
            initial_locals,
            ..
        } = self;

        let mut code = ByteVec::new();
        let mut label_pc: HashMap<Label, u16> = HashMap::new();
        let mut pending: Vec<(Label, PendingPatch)> = Vec::new();
        let mut item_pc: Vec<u16> = Vec::with_capacity(items.len());
        let mut line_table: Vec<(u16, u32)> = Vec::new();
        let mut last_line: Option<u32> = None;

        for item in &items {
            item_pc.push(code.len() as u16);
            match item {
                Item::Place(label) => {
                    label_pc.insert(*label, code.len() as u16);
                }
                Item::Line(line) => {
                    if last_line != Some(*line) {
                        line_table.push((code.len() as u16, *line));
                        last_line = Some(*line);
                    }
                }
                Item::Instr(instr) => {
                    write_instruction(instr, &mut code, pool, &mut pending)?;
                }
            }
        }

        let code_len = code.len() as u16;
        for (label, patch) in pending {
            let target = *label_pc
                .get(&label)
                .ok_or(EmitError::InvariantViolation(format!(
                    "label {label} referenced from an instruction but never placed"
                )))?;
            match patch {
                PendingPatch::Branch {
                    instr_pc,
                    operand_offset,
                } => {
                    let offset = i32::from(target) - i32::from(instr_pc);
                    let offset = i16::try_from(offset).map_err(|_| {
                        EmitError::BackendFailure(
                            "branch offset exceeds i16 range; wide jumps are unsupported".into(),
                        )
                    })?;
                    code.patch_i16(operand_offset, offset);
                }
                PendingPatch::SwitchTarget {
                    switch_pc,
                    operand_offset,
                } => {
                    let offset = i32::from(target) - i32::from(switch_pc);
                    code.patch_u32(operand_offset, offset as u32);
                }
            }
        }
        let _ = code_len;

        let (max_stack, max_locals, frames) = compute_frames(
            &items,
            &item_pc,
            &label_pc,
            &exception_handlers,
            initial_locals,
        )?;

        let exception_table = exception_handlers
            .into_iter()
            .map(|h| {
                Ok(ResolvedExceptionHandler {
                    start_pc: *label_pc.get(&h.start).ok_or_else(unresolved)?,
                    end_pc: *label_pc.get(&h.end).ok_or_else(unresolved)?,
                    handler_pc: *label_pc.get(&h.handler).ok_or_else(unresolved)?,
                    catch_type: h.catch_type,
                })
            })
            .collect::<Result<Vec<_>, EmitError>>()?;

        let local_variable_table = local_debug
            .into_iter()
            .map(|entry| {
                Ok(ResolvedLocalVar {
                    start_pc: *label_pc.get(&entry.start).ok_or_else(unresolved)?,
                    end_pc: *label_pc.get(&entry.end).ok_or_else(unresolved)?,
                    name: entry.name,
                    descriptor: entry.descriptor,
                    slot: entry.slot,
                })
            })
            .collect::<Result<Vec<_>, EmitError>>()?;

        Ok(MethodBytes {
            code: code.into_vec(),
            max_stack,
            max_locals,
            exception_table,
            line_number_table: line_table,
            local_variable_table,
            stack_map_frames: frames,
        })
    }
}

fn unresolved() -> EmitError {
    EmitError::InvariantViolation("label referenced but never placed".into())
}

/// The fully resolved output of [`MethodWriter::finish`], ready for the
/// class writer facade to serialize as a `Code` attribute.
pub struct MethodBytes {
    pub code: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub exception_table: Vec<ResolvedExceptionHandler>,
    pub line_number_table: Vec<(u16, u32)>,
    pub local_variable_table: Vec<ResolvedLocalVar>,
    pub stack_map_frames: Vec<StackMapFrame>,
}

pub struct ResolvedExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: Option<ClassReference>,
}

pub struct ResolvedLocalVar {
    pub start_pc: u16,
    pub end_pc: u16,
    pub name: String,
    pub descriptor: FieldType,
    pub slot: u16,
}

/// Encodes one instruction's bytes, interning any constant-pool references
/// it needs and recording patch requests for jump operands.
fn write_instruction(
    instr: &Instruction,
    code: &mut ByteVec,
    pool: &mut ConstantPool,
    pending: &mut Vec<(Label, PendingPatch)>,
) -> Result<(), EmitError> {
    let pc = code.len() as u16;
    match instr {
        Instruction::Nop => code.push_u8(0x00),
        Instruction::PushNull => code.push_u8(0x01),
        Instruction::Push(value) => write_push(value, code, pool),
        Instruction::PushPrimitiveClass(p) => {
            let field = FieldRef {
                owner: ClassReference::new(p.boxed_class_name()),
                name: "TYPE".to_string(),
                descriptor: FieldType::Object(ClassReference::new("java/lang/Class")),
            };
            code.push_u8(0xB2); // getstatic
            code.push_u16(pool.add_field_ref(&field.owner.internal_name, &field.name, &field.descriptor.descriptor_string()));
        }
        Instruction::Load(kind, slot) => write_var_op(code, kind, *slot, true),
        Instruction::Store(kind, slot) => write_var_op(code, kind, *slot, false),
        Instruction::IInc(slot, by) => {
            if let (Ok(s), Ok(b)) = (u8::try_from(*slot), i8::try_from(*by)) {
                code.push_u8(0x84);
                code.push_u8(s);
                code.push_u8(b as u8);
            } else {
                code.push_u8(0xC4); // wide
                code.push_u8(0x84);
                code.push_u16(*slot);
                code.push_i16(i16::try_from(*by).map_err(|_| {
                    EmitError::BackendFailure("iinc constant exceeds i16 range".into())
                })?);
            }
        }
        Instruction::Add(k) => code.push_u8(arith_opcode(0x60, *k)),
        Instruction::Sub(k) => code.push_u8(arith_opcode(0x64, *k)),
        Instruction::Mul(k) => code.push_u8(arith_opcode(0x68, *k)),
        Instruction::Div(k) => code.push_u8(arith_opcode(0x6C, *k)),
        Instruction::Rem(k) => code.push_u8(arith_opcode(0x70, *k)),
        Instruction::Neg(k) => code.push_u8(arith_opcode(0x74, *k)),
        Instruction::Shl(k) => code.push_u8(int_long_opcode(0x78, *k)),
        Instruction::Shr(k) => code.push_u8(int_long_opcode(0x7A, *k)),
        Instruction::UShr(k) => code.push_u8(int_long_opcode(0x7C, *k)),
        Instruction::And(k) => code.push_u8(int_long_opcode(0x7E, *k)),
        Instruction::Or(k) => code.push_u8(int_long_opcode(0x80, *k)),
        Instruction::Xor(k) => code.push_u8(int_long_opcode(0x82, *k)),
        Instruction::Convert(op) => code.push_u8(convert_opcode(*op)),
        Instruction::CheckCast(class) => {
            code.push_u8(0xC0);
            code.push_u16(pool.add_class(&class.internal_name));
        }
        Instruction::InstanceOf(class) => {
            code.push_u8(0xC1);
            code.push_u16(pool.add_class(&class.internal_name));
        }
        Instruction::New(class) => {
            code.push_u8(0xBB);
            code.push_u16(pool.add_class(&class.internal_name));
        }
        Instruction::Dup => code.push_u8(0x59),
        Instruction::DupX1 => code.push_u8(0x5A),
        Instruction::DupX2 => code.push_u8(0x5B),
        Instruction::Dup2 => code.push_u8(0x5C),
        Instruction::Dup2X1 => code.push_u8(0x5D),
        Instruction::Dup2X2 => code.push_u8(0x5E),
        Instruction::Pop => code.push_u8(0x57),
        Instruction::Pop2 => code.push_u8(0x58),
        Instruction::Swap => code.push_u8(0x5F),
        Instruction::Goto(label) => {
            code.push_u8(0xA7);
            let at = code.len();
            code.push_i16(0);
            pending.push((
                *label,
                PendingPatch::Branch {
                    instr_pc: pc,
                    operand_offset: at,
                },
            ));
        }
        Instruction::Cmp(kind, bias) => code.push_u8(cmp_opcode(*kind, *bias)),
        Instruction::IfZero(op, label) => {
            code.push_u8(if_zero_opcode(*op));
            let at = code.len();
            code.push_i16(0);
            pending.push((
                *label,
                PendingPatch::Branch {
                    instr_pc: pc,
                    operand_offset: at,
                },
            ));
        }
        Instruction::IfNull(op, label) => {
            code.push_u8(if matches!(op, CompareOp::Eq) { 0xC6 } else { 0xC7 });
            let at = code.len();
            code.push_i16(0);
            pending.push((
                *label,
                PendingPatch::Branch {
                    instr_pc: pc,
                    operand_offset: at,
                },
            ));
        }
        Instruction::IfICmp(op, label) => {
            code.push_u8(if_icmp_opcode(*op));
            let at = code.len();
            code.push_i16(0);
            pending.push((
                *label,
                PendingPatch::Branch {
                    instr_pc: pc,
                    operand_offset: at,
                },
            ));
        }
        Instruction::IfACmp(op, label) => {
            code.push_u8(if matches!(op, CompareOp::Eq) { 0xA5 } else { 0xA6 });
            let at = code.len();
            code.push_i16(0);
            pending.push((
                *label,
                PendingPatch::Branch {
                    instr_pc: pc,
                    operand_offset: at,
                },
            ));
        }
        Instruction::TableSwitch {
            low,
            high,
            default,
            targets,
        } => {
            code.push_u8(0xAA);
            pad_to_4(code, pc);
            let default_offset_at = code.len();
            code.push_i32(0);
            code.push_i32(*low);
            code.push_i32(*high);
            let mut target_offsets = Vec::with_capacity(targets.len());
            for t in targets {
                target_offsets.push((code.len(), *t));
                code.push_i32(0);
            }
            pending.push((
                *default,
                PendingPatch::SwitchTarget {
                    switch_pc: pc,
                    operand_offset: default_offset_at,
                },
            ));
            for (offset, label) in target_offsets {
                pending.push((
                    label,
                    PendingPatch::SwitchTarget {
                        switch_pc: pc,
                        operand_offset: offset,
                    },
                ));
            }
        }
        Instruction::LookupSwitch { default, pairs } => {
            code.push_u8(0xAB);
            pad_to_4(code, pc);
            let default_offset_at = code.len();
            code.push_i32(0);
            code.push_i32(pairs.len() as i32);
            let mut target_offsets = Vec::with_capacity(pairs.len());
            for (key, label) in pairs {
                code.push_i32(*key);
                target_offsets.push((code.len(), *label));
                code.push_i32(0);
            }
            pending.push((
                *default,
                PendingPatch::SwitchTarget {
                    switch_pc: pc,
                    operand_offset: default_offset_at,
                },
            ));
            for (offset, label) in target_offsets {
                pending.push((
                    label,
                    PendingPatch::SwitchTarget {
                        switch_pc: pc,
                        operand_offset: offset,
                    },
                ));
            }
        }
        Instruction::Return(kind) => code.push_u8(return_opcode(*kind)),
        Instruction::AThrow => code.push_u8(0xBF),
        Instruction::GetField(f) => write_field_op(0xB4, f, code, pool),
        Instruction::PutField(f) => write_field_op(0xB5, f, code, pool),
        Instruction::GetStatic(f) => write_field_op(0xB2, f, code, pool),
        Instruction::PutStatic(f) => write_field_op(0xB3, f, code, pool),
        Instruction::Invoke(kind, method) => write_invoke(*kind, method, code, pool),
        Instruction::NewArrayPrimitive(p) => {
            code.push_u8(0xBC);
            code.push_u8(crate::instructions::tables::newarray_tag(*p));
        }
        Instruction::ANewArray(descriptor) => {
            code.push_u8(0xBD);
            code.push_u16(pool.add_class(descriptor));
        }
        Instruction::MultiANewArray { descriptor, dimensions } => {
            code.push_u8(0xC5);
            code.push_u16(pool.add_class(descriptor));
            code.push_u8(*dimensions);
        }
        Instruction::ArrayLength => code.push_u8(0xBE),
        Instruction::ArrayLoad(kind) => code.push_u8(array_load_opcode(*kind)),
        Instruction::ArrayStore(kind) => code.push_u8(array_store_opcode(*kind)),
    }
    Ok(())
}

fn pad_to_4(code: &mut ByteVec, opcode_pc: u16) {
    let after_opcode = u32::from(opcode_pc) + 1;
    let padding = (4 - (after_opcode % 4)) % 4;
    for _ in 0..padding {
        code.push_u8(0);
    }
}

fn write_push(value: &crate::ast::expr::ConstantValue, code: &mut ByteVec, pool: &mut ConstantPool) {
    use crate::ast::expr::ConstantValue as C;
    match value {
        C::Int(v) => match classify_int(*v) {
            IntEncoding::Const(c) => code.push_u8((3 + c) as u8), // ICONST_M1..ICONST_5 = 2..8
            IntEncoding::Byte(b) => {
                code.push_u8(0x10);
                code.push_u8(b as u8);
            }
            IntEncoding::Short(s) => {
                code.push_u8(0x11);
                code.push_i16(s);
            }
            IntEncoding::Ldc => push_ldc(pool.add_integer(*v), code),
        },
        C::Long(v) => match classify_long(*v) {
            Some(0) => code.push_u8(0x09),
            Some(_) => code.push_u8(0x0A),
            None => {
                code.push_u8(0x14); // ldc2_w
                code.push_u16(pool.add_long(*v));
            }
        },
        C::Float(v) => match classify_float(*v) {
            Some(c) => code.push_u8(0x0B + c),
            None => push_ldc(pool.add_float(*v), code),
        },
        C::Double(v) => match classify_double(*v) {
            Some(0) => code.push_u8(0x0E),
            Some(_) => code.push_u8(0x0F),
            None => {
                code.push_u8(0x14);
                code.push_u16(pool.add_double(*v));
            }
        },
        C::String(s) => push_ldc(pool.add_string(s), code),
        C::Class(c) => push_ldc(pool.add_class(&c.internal_name), code),
        C::PrimitiveClass(_) => unreachable!("PrimitiveClass lowers via PushPrimitiveClass"),
    }
}

fn push_ldc(index: u16, code: &mut ByteVec) {
    if let Ok(byte_index) = u8::try_from(index) {
        code.push_u8(0x12);
        code.push_u8(byte_index);
    } else {
        code.push_u8(0x13);
        code.push_u16(index);
    }
}

/// Arithmetic opcodes are laid out as op-family blocks of 4, one per
/// [`NumKind`] (`IADD 0x60 .. DADD 0x63`, `ISUB 0x64 .. DSUB 0x67`, ...,
/// `INEG 0x74 .. DNEG 0x77`) — `family` is the block's `Int` opcode.
fn arith_opcode(family: u8, kind: NumKind) -> u8 {
    let kind_offset = match kind {
        NumKind::Int => 0,
        NumKind::Long => 1,
        NumKind::Float => 2,
        NumKind::Double => 3,
        NumKind::Ref => unreachable!("no arithmetic on references"),
    };
    family + kind_offset
}

/// Shift/bitwise opcodes are laid out the same family-block way as
/// arithmetic, but with a 2-wide block (`int`,
/// `long` only): `ISHL 0x78, LSHL 0x79, ISHR 0x7A, LSHR 0x7B, IUSHR 0x7C,
/// LUSHR 0x7D` / `IAND 0x7E, LAND 0x7F, IOR 0x80, LOR 0x81, IXOR 0x82,
/// LXOR 0x83` — `family` is the block's `Int` opcode.
fn int_long_opcode(family: u8, kind: NumKind) -> u8 {
    let kind_offset = match kind {
        NumKind::Int => 0,
        NumKind::Long => 1,
        _ => unreachable!("shift/bitwise ops apply only to int/long"),
    };
    family + kind_offset
}

const fn convert_opcode(op: ConvertOp) -> u8 {
    match op {
        ConvertOp::I2L => 0x85,
        ConvertOp::I2F => 0x86,
        ConvertOp::I2D => 0x87,
        ConvertOp::L2I => 0x88,
        ConvertOp::L2F => 0x89,
        ConvertOp::L2D => 0x8A,
        ConvertOp::F2I => 0x8B,
        ConvertOp::F2L => 0x8C,
        ConvertOp::F2D => 0x8D,
        ConvertOp::D2I => 0x8E,
        ConvertOp::D2L => 0x8F,
        ConvertOp::D2F => 0x90,
        ConvertOp::I2B => 0x91,
        ConvertOp::I2C => 0x92,
        ConvertOp::I2S => 0x93,
    }
}

const fn cmp_opcode(kind: NumKind, bias: CmpBias) -> u8 {
    match (kind, bias) {
        (NumKind::Long, _) => 0x94,
        (NumKind::Float, CmpBias::Less) => 0x95,
        (NumKind::Float, CmpBias::Greater) => 0x96,
        (NumKind::Double, CmpBias::Less) => 0x97,
        (NumKind::Double, CmpBias::Greater) => 0x98,
        _ => unreachable!("cmp applies only to long/float/double"),
    }
}

const fn if_zero_opcode(op: CompareOp) -> u8 {
    match op {
        CompareOp::Eq => 0x99,
        CompareOp::Ne => 0x9A,
        CompareOp::Lt => 0x9B,
        CompareOp::Ge => 0x9C,
        CompareOp::Gt => 0x9D,
        CompareOp::Le => 0x9E,
    }
}

const fn if_icmp_opcode(op: CompareOp) -> u8 {
    match op {
        CompareOp::Eq => 0x9F,
        CompareOp::Ne => 0xA0,
        CompareOp::Lt => 0xA1,
        CompareOp::Ge => 0xA2,
        CompareOp::Gt => 0xA3,
        CompareOp::Le => 0xA4,
    }
}

const fn return_opcode(kind: Option<NumKind>) -> u8 {
    match kind {
        None => 0xB1,
        Some(NumKind::Int) => 0xAC,
        Some(NumKind::Long) => 0xAD,
        Some(NumKind::Float) => 0xAE,
        Some(NumKind::Double) => 0xAF,
        Some(NumKind::Ref) => 0xB0,
    }
}

fn write_field_op(opcode: u8, field: &FieldRef, code: &mut ByteVec, pool: &mut ConstantPool) {
    code.push_u8(opcode);
    code.push_u16(pool.add_field_ref(
        &field.owner.internal_name,
        &field.name,
        &field.descriptor.descriptor_string(),
    ));
}

fn write_invoke(kind: InvokeKind, method: &MethodRef, code: &mut ByteVec, pool: &mut ConstantPool) {
    let descriptor = method.descriptor.descriptor_string();
    match kind {
        InvokeKind::Static => {
            code.push_u8(0xB8);
            code.push_u16(pool.add_method_ref(&method.owner.internal_name, &method.name, &descriptor));
        }
        InvokeKind::Virtual => {
            code.push_u8(0xB6);
            code.push_u16(pool.add_method_ref(&method.owner.internal_name, &method.name, &descriptor));
        }
        InvokeKind::Special => {
            code.push_u8(0xB7);
            code.push_u16(pool.add_method_ref(&method.owner.internal_name, &method.name, &descriptor));
        }
        InvokeKind::Interface => {
            code.push_u8(0xB9);
            let index = pool.add_interface_method_ref(&method.owner.internal_name, &method.name, &descriptor);
            code.push_u16(index);
            let arg_words: u8 = method
                .descriptor
                .parameters_types
                .iter()
                .map(|t| t.category().width() as u8)
                .sum::<u8>()
                + 1; // + objectref
            code.push_u8(arg_words);
            code.push_u8(0);
        }
    }
}

const fn array_load_opcode(kind: ArrayKind) -> u8 {
    match kind {
        ArrayKind::Int => 0x2E,
        ArrayKind::Long => 0x2F,
        ArrayKind::Float => 0x30,
        ArrayKind::Double => 0x31,
        ArrayKind::Ref => 0x32,
        ArrayKind::Byte | ArrayKind::Boolean => 0x33,
        ArrayKind::Char => 0x34,
        ArrayKind::Short => 0x35,
    }
}

const fn array_store_opcode(kind: ArrayKind) -> u8 {
    match kind {
        ArrayKind::Int => 0x4F,
        ArrayKind::Long => 0x50,
        ArrayKind::Float => 0x51,
        ArrayKind::Double => 0x52,
        ArrayKind::Ref => 0x53,
        ArrayKind::Byte | ArrayKind::Boolean => 0x54,
        ArrayKind::Char => 0x55,
        ArrayKind::Short => 0x56,
    }
}

fn write_var_op(code: &mut ByteVec, kind: &NumKind, slot: u16, load: bool) {
    // Prefer the compact *LOAD_n/*STORE_n forms for slots 0-3.
    let base_wide = match (kind, load) {
        (NumKind::Int, true) => 0x15,
        (NumKind::Long, true) => 0x16,
        (NumKind::Float, true) => 0x17,
        (NumKind::Double, true) => 0x18,
        (NumKind::Ref, true) => 0x19,
        (NumKind::Int, false) => 0x36,
        (NumKind::Long, false) => 0x37,
        (NumKind::Float, false) => 0x38,
        (NumKind::Double, false) => 0x39,
        (NumKind::Ref, false) => 0x3A,
    };
    if slot > u16::from(u8::MAX) {
        code.push_u8(0xC4); // wide
        code.push_u8(base_wide);
        code.push_u16(slot);
        return;
    }
    if slot <= 3 {
        let compact_base = match (kind, load) {
            (NumKind::Int, true) => 0x1A,
            (NumKind::Long, true) => 0x1E,
            (NumKind::Float, true) => 0x22,
            (NumKind::Double, true) => 0x26,
            (NumKind::Ref, true) => 0x2A,
            (NumKind::Int, false) => 0x3B,
            (NumKind::Long, false) => 0x3F,
            (NumKind::Float, false) => 0x43,
            (NumKind::Double, false) => 0x47,
            (NumKind::Ref, false) => 0x4B,
        };
        code.push_u8(compact_base + slot as u8);
    } else {
        code.push_u8(base_wide);
        code.push_u8(slot as u8);
    }
}

/// The static [`VerificationTypeInfo`] a [`FieldType`] lowers to.
/// Arrays use the `Object` form keyed by the array's own descriptor, which
/// is a valid `CONSTANT_Class` name.
fn vti_of(ty: &FieldType) -> VerificationTypeInfo {
    use crate::types::PrimitiveType as P;
    match ty {
        FieldType::Base(P::Long) => VerificationTypeInfo::Long,
        FieldType::Base(P::Float) => VerificationTypeInfo::Float,
        FieldType::Base(P::Double) => VerificationTypeInfo::Double,
        FieldType::Base(_) => VerificationTypeInfo::Integer,
        FieldType::Object(c) => VerificationTypeInfo::Object(c.clone()),
        FieldType::Array(_) => VerificationTypeInfo::Object(ClassReference::new(ty.descriptor_string())),
    }
}

fn category_width(vti: &VerificationTypeInfo) -> u16 {
    if vti.is_wide() {
        2
    } else {
        1
    }
}

/// Collapses a physical-slot-indexed locals array (one entry per JVM local
/// variable slot, with an explicit `Top` placeholder covering a wide type's
/// companion slot) into the form `StackMapTable` requires: a `long`/
/// `double` gets exactly one `verification_type_info` entry for both slots,
/// and its companion placeholder is omitted rather than written as `Top`.
/// Relies on the AST-level invariant that category-2 locals always occupy
/// two *consecutive* slots.
fn compact_locals(locals: &[VerificationTypeInfo]) -> Vec<VerificationTypeInfo> {
    let mut out = Vec::with_capacity(locals.len());
    let mut i = 0;
    while i < locals.len() {
        let wide = locals[i].is_wide();
        out.push(locals[i].clone());
        i += if wide { 2 } else { 1 };
    }
    out
}

/// Runs the same verifier-lite dataflow step [`compute_frames`] uses, but
/// just to report the net stack word delta of `instrs` run from an empty
/// operand stack -- the stack-discipline invariant the property tests check.
#[cfg(test)]
pub(crate) fn net_word_stack_delta(instrs: &[Instruction]) -> i32 {
    let mut locals: Vec<VerificationTypeInfo> = Vec::new();
    let mut stack: Vec<VerificationTypeInfo> = Vec::new();
    for instr in instrs {
        apply_stack_effect(instr, &mut stack, &mut locals);
    }
    stack.iter().map(category_width).sum::<u16>() as i32
}

/// Interprets the instruction stream to compute `max_stack`, `max_locals`,
/// and stack map frames at jump targets and exception handler entries. See
/// module docs / `frame.rs` for the simplifications this relies on.
fn compute_frames(
    items: &[Item],
    item_pc: &[u16],
    label_pc: &HashMap<Label, u16>,
    handlers: &[ExceptionHandler],
    initial_locals: Vec<VerificationTypeInfo>,
) -> Result<(u16, u16, Vec<StackMapFrame>), EmitError> {
    let mut jump_targets: std::collections::HashSet<Label> = std::collections::HashSet::new();
    for item in items {
        if let Item::Instr(instr) = item {
            collect_targets(instr, &mut jump_targets);
        }
    }
    jump_targets.extend(handlers.iter().map(|h| h.handler));
    let handler_reset: HashMap<Label, (Option<ClassReference>, Label)> = handlers
        .iter()
        .map(|h| (h.handler, (h.catch_type.clone(), h.start)))
        .collect();

    let mut locals: Vec<VerificationTypeInfo> = initial_locals;
    let mut stack: Vec<VerificationTypeInfo> = Vec::new();
    let mut max_stack_words: u16 = 0;
    // `locals` is indexed by physical JVM slot (a wide entry's companion
    // slot is an explicit `Top`), so the slot count is just its length --
    // unlike the operand stack, there is no per-entry width to sum here.
    let mut max_locals_slots: u16 = locals.len() as u16;
    let mut locals_at_label: HashMap<Label, Vec<VerificationTypeInfo>> = HashMap::new();
    let mut frames = Vec::new();

    let stack_words = |s: &[VerificationTypeInfo]| -> u16 { s.iter().map(category_width).sum() };

    for (idx, item) in items.iter().enumerate() {
        match item {
            Item::Line(_) => {}
            Item::Place(label) => {
                if let Some((catch_type, start_label)) = handler_reset.get(label) {
                    stack = vec![VerificationTypeInfo::Object(
                        catch_type.clone().unwrap_or_else(ClassReference::throwable),
                    )];
                    locals = locals_at_label
                        .get(start_label)
                        .cloned()
                        .unwrap_or_else(|| locals.clone());
                }
                locals_at_label.insert(*label, locals.clone());
                let pc = item_pc[idx];
                if jump_targets.contains(label) && pc > 0 {
                    frames.push(StackMapFrame {
                        offset: pc,
                        // The `StackMapTable` format gives a wide
                        // local exactly one `verification_type_info` entry
                        // covering both physical slots; `locals` here still
                        // carries the explicit companion `Top` we need for
                        // direct slot indexing, so compact it on the way out.
                        locals: compact_locals(&locals),
                        stack: stack.clone(),
                    });
                }
            }
            Item::Instr(instr) => {
                apply_stack_effect(instr, &mut stack, &mut locals);
                max_stack_words = max_stack_words.max(stack_words(&stack));
                max_locals_slots = max_locals_slots.max(locals.len() as u16);
            }
        }
    }

    frames.sort_by_key(|f| f.offset);
    let _ = label_pc;
    Ok((max_stack_words.max(1), max_locals_slots.max(1), frames))
}

fn collect_targets(instr: &Instruction, out: &mut std::collections::HashSet<Label>) {
    match instr {
        Instruction::Goto(l)
        | Instruction::IfZero(_, l)
        | Instruction::IfNull(_, l)
        | Instruction::IfICmp(_, l)
        | Instruction::IfACmp(_, l) => {
            out.insert(*l);
        }
        Instruction::TableSwitch { default, targets, .. } => {
            out.insert(*default);
            out.extend(targets.iter().copied());
        }
        Instruction::LookupSwitch { default, pairs } => {
            out.insert(*default);
            out.extend(pairs.iter().map(|(_, l)| *l));
        }
        _ => {}
    }
}

/// Mutates `stack`/`locals` to reflect executing one instruction. This is
/// the verifier-lite dataflow step described in the module docs.
fn apply_stack_effect(
    instr: &Instruction,
    stack: &mut Vec<VerificationTypeInfo>,
    locals: &mut Vec<VerificationTypeInfo>,
) {
    use VerificationTypeInfo as V;

    let set_local = |locals: &mut Vec<VerificationTypeInfo>, slot: u16, ty: V| {
        let slot = slot as usize;
        let wide = ty.is_wide();
        let last = if wide { slot + 1 } else { slot };
        if locals.len() <= last {
            locals.resize(last + 1, V::Top);
        }
        locals[slot] = ty;
        if wide {
            locals[slot + 1] = V::Top;
        }
    };

    match instr {
        Instruction::Nop => {}
        Instruction::PushNull => stack.push(V::Null),
        Instruction::Push(v) => stack.push(push_vti(v)),
        Instruction::PushPrimitiveClass(_) => {
            stack.push(V::Object(ClassReference::new("java/lang/Class")));
        }
        Instruction::Load(kind, slot) => {
            let ty = locals.get(*slot as usize).cloned().unwrap_or(match kind {
                NumKind::Int => V::Integer,
                NumKind::Long => V::Long,
                NumKind::Float => V::Float,
                NumKind::Double => V::Double,
                NumKind::Ref => V::Object(ClassReference::object()),
            });
            stack.push(ty);
        }
        Instruction::Store(_, slot) => {
            if let Some(v) = stack.pop() {
                set_local(locals, *slot, v);
            }
        }
        Instruction::IInc(_, _) => {}
        Instruction::Add(_) | Instruction::Sub(_) | Instruction::Mul(_) | Instruction::Div(_) | Instruction::Rem(_) => {
            stack.pop();
        }
        Instruction::Neg(_) => {}
        Instruction::And(_) | Instruction::Or(_) | Instruction::Xor(_) => {
            stack.pop();
        }
        Instruction::Shl(_) | Instruction::Shr(_) | Instruction::UShr(_) => {
            stack.pop();
        }
        Instruction::Convert(op) => {
            stack.pop();
            stack.push(match op {
                ConvertOp::I2L | ConvertOp::F2L | ConvertOp::D2L => V::Long,
                ConvertOp::I2F | ConvertOp::L2F | ConvertOp::D2F => V::Float,
                ConvertOp::I2D | ConvertOp::L2D | ConvertOp::F2D => V::Double,
                ConvertOp::L2I | ConvertOp::F2I | ConvertOp::D2I | ConvertOp::I2B | ConvertOp::I2C | ConvertOp::I2S => {
                    V::Integer
                }
            });
        }
        Instruction::CheckCast(class) => {
            stack.pop();
            stack.push(V::Object(class.clone()));
        }
        Instruction::InstanceOf(_) => {
            stack.pop();
            stack.push(V::Integer);
        }
        Instruction::New(class) => stack.push(V::Object(class.clone())),
        Instruction::Dup => {
            if let Some(top) = stack.last().cloned() {
                stack.push(top);
            }
        }
        Instruction::DupX1 => {
            if stack.len() >= 2 {
                let top = stack[stack.len() - 1].clone();
                stack.insert(stack.len() - 2, top);
            }
        }
        Instruction::DupX2 => {
            if stack.len() >= 3 {
                let top = stack[stack.len() - 1].clone();
                stack.insert(stack.len() - 3, top);
            }
        }
        Instruction::Dup2 => {
            let n = stack.len();
            if n >= 1 && stack[n - 1].is_wide() {
                let top = stack[n - 1].clone();
                stack.push(top);
            } else if n >= 2 {
                let pair = [stack[n - 2].clone(), stack[n - 1].clone()];
                stack.extend(pair);
            }
        }
        Instruction::Dup2X1 => {
            let n = stack.len();
            if n >= 2 && stack[n - 1].is_wide() {
                let top = stack[n - 1].clone();
                stack.insert(n - 2, top);
            } else if n >= 3 {
                let pair = [stack[n - 2].clone(), stack[n - 1].clone()];
                stack.splice(n - 3..n - 3, pair);
            }
        }
        Instruction::Dup2X2 => {
            let n = stack.len();
            if n >= 1 && stack[n - 1].is_wide() {
                if n >= 2 && stack[n - 2].is_wide() {
                    // Form 4: value1, value2 both wide -- dup below value2.
                    let top = stack[n - 1].clone();
                    stack.insert(n - 2, top);
                } else if n >= 3 {
                    // Form 2: value1 wide, value2/value3 category-1 -- dup
                    // below both.
                    let top = stack[n - 1].clone();
                    stack.insert(n - 3, top);
                }
            } else if n >= 2 {
                let pair = [stack[n - 2].clone(), stack[n - 1].clone()];
                if n >= 3 && stack[n - 3].is_wide() {
                    // Form 3: value1/value2 category-1, value3 wide -- pair
                    // goes below value3.
                    stack.splice(n - 3..n - 3, pair);
                } else if n >= 4 {
                    // Form 1: all four category-1 -- pair goes below
                    // value3, value4.
                    stack.splice(n - 4..n - 4, pair);
                }
            }
        }
        Instruction::Pop => {
            stack.pop();
        }
        Instruction::Pop2 => {
            stack.pop();
            stack.pop();
        }
        Instruction::Swap => {
            let n = stack.len();
            if n >= 2 {
                stack.swap(n - 1, n - 2);
            }
        }
        Instruction::Goto(_) => {}
        Instruction::Cmp(_, _) => {
            stack.pop();
            stack.pop();
            stack.push(V::Integer);
        }
        Instruction::IfZero(_, _) => {
            stack.pop();
        }
        Instruction::IfNull(_, _) => {
            stack.pop();
        }
        Instruction::IfICmp(_, _) | Instruction::IfACmp(_, _) => {
            stack.pop();
            stack.pop();
        }
        Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. } => {
            stack.pop();
        }
        Instruction::Return(_) => {
            stack.clear();
        }
        Instruction::AThrow => {
            stack.clear();
        }
        Instruction::GetField(f) => {
            stack.pop();
            stack.push(vti_of(&f.descriptor));
        }
        Instruction::PutField(_) => {
            stack.pop();
            stack.pop();
        }
        Instruction::GetStatic(f) => stack.push(vti_of(&f.descriptor)),
        Instruction::PutStatic(_) => {
            stack.pop();
        }
        Instruction::Invoke(kind, method) => {
            for _ in &method.descriptor.parameters_types {
                stack.pop();
            }
            if !matches!(kind, InvokeKind::Static) {
                stack.pop();
            }
            if let ReturnType::Some(ty) = &method.descriptor.return_type {
                stack.push(vti_of(ty));
            }
        }
        Instruction::NewArrayPrimitive(p) => {
            stack.pop();
            stack.push(V::Object(ClassReference::new(format!(
                "[{}",
                p.descriptor_char()
            ))));
        }
        Instruction::ANewArray(descriptor) => {
            stack.pop();
            stack.push(V::Object(ClassReference::new(format!("[{descriptor}"))));
        }
        Instruction::MultiANewArray { descriptor, dimensions } => {
            for _ in 0..*dimensions {
                stack.pop();
            }
            stack.push(V::Object(ClassReference::new(descriptor.clone())));
        }
        Instruction::ArrayLength => {
            stack.pop();
            stack.push(V::Integer);
        }
        Instruction::ArrayLoad(kind) => {
            stack.pop();
            stack.pop();
            stack.push(match kind {
                ArrayKind::Long => V::Long,
                ArrayKind::Float => V::Float,
                ArrayKind::Double => V::Double,
                ArrayKind::Ref => V::Object(ClassReference::object()),
                _ => V::Integer,
            });
        }
        Instruction::ArrayStore(_) => {
            stack.pop();
            stack.pop();
            stack.pop();
        }
    }
}

fn push_vti(value: &crate::ast::expr::ConstantValue) -> VerificationTypeInfo {
    use crate::ast::expr::ConstantValue as C;
    match value {
        C::Int(_) => VerificationTypeInfo::Integer,
        C::Long(_) => VerificationTypeInfo::Long,
        C::Float(_) => VerificationTypeInfo::Float,
        C::Double(_) => VerificationTypeInfo::Double,
        C::String(_) => VerificationTypeInfo::Object(ClassReference::new("java/lang/String")),
        C::Class(_) | C::PrimitiveClass(_) => {
            VerificationTypeInfo::Object(ClassReference::new("java/lang/Class"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::expr::ConstantValue;

    fn new_writer() -> MethodWriter {
        MethodWriter::new(vec![], false)
    }

    #[test]
    fn simple_add_resolves_with_no_pending_labels() {
        let mut pool = ConstantPool::new();
        let mut w = new_writer();
        w.emit(Instruction::Load(NumKind::Int, 0));
        w.emit(Instruction::Load(NumKind::Int, 1));
        w.emit(Instruction::Add(NumKind::Int));
        w.emit(Instruction::Return(Some(NumKind::Int)));
        let bytes = w.finish(&mut pool).expect("resolves");
        assert_eq!(bytes.code, vec![0x1A, 0x1B, 0x60, 0xAC]);
        assert_eq!(bytes.max_stack, 2);
    }

    /// Each arithmetic family occupies its own 4-opcode block
    /// (`IADD..DADD`, `ISUB..DSUB`, ...); a previous revision mis-derived
    /// every opcode but `IADD` by adding the wrong stride.
    #[test]
    fn arithmetic_opcodes_match_the_jvm_table() {
        let cases = [
            (Instruction::Add(NumKind::Int), 0x60),
            (Instruction::Add(NumKind::Double), 0x63),
            (Instruction::Sub(NumKind::Int), 0x64),
            (Instruction::Sub(NumKind::Long), 0x65),
            (Instruction::Mul(NumKind::Int), 0x68),
            (Instruction::Mul(NumKind::Float), 0x6A),
            (Instruction::Div(NumKind::Int), 0x6C),
            (Instruction::Div(NumKind::Double), 0x6F),
            (Instruction::Rem(NumKind::Int), 0x70),
            (Instruction::Rem(NumKind::Double), 0x73),
            (Instruction::Neg(NumKind::Int), 0x74),
            (Instruction::Neg(NumKind::Double), 0x77),
            (Instruction::Shl(NumKind::Int), 0x78),
            (Instruction::Shl(NumKind::Long), 0x79),
            (Instruction::Shr(NumKind::Int), 0x7A),
            (Instruction::Shr(NumKind::Long), 0x7B),
            (Instruction::UShr(NumKind::Int), 0x7C),
            (Instruction::UShr(NumKind::Long), 0x7D),
            (Instruction::And(NumKind::Int), 0x7E),
            (Instruction::And(NumKind::Long), 0x7F),
            (Instruction::Or(NumKind::Int), 0x80),
            (Instruction::Or(NumKind::Long), 0x81),
            (Instruction::Xor(NumKind::Int), 0x82),
            (Instruction::Xor(NumKind::Long), 0x83),
        ];
        for (instr, expected) in cases {
            let mut pool = ConstantPool::new();
            let mut w = new_writer();
            w.emit(instr);
            w.emit(Instruction::Return(None));
            let bytes = w.finish(&mut pool).expect("resolves");
            assert_eq!(bytes.code[0], expected);
        }
    }

    #[test]
    fn forward_goto_patches_offset() {
        let mut pool = ConstantPool::new();
        let mut w = new_writer();
        let end = w.new_label();
        w.emit(Instruction::Goto(end));
        w.emit(Instruction::Nop);
        w.place_label(end);
        w.emit(Instruction::Return(None));
        let bytes = w.finish(&mut pool).expect("resolves");
        // GOTO at pc 0, offset 0 is the 3rd byte, target pc is 4 (after nop).
        assert_eq!(bytes.code[0], 0xA7);
        let offset = i16::from_be_bytes([bytes.code[1], bytes.code[2]]);
        assert_eq!(offset, 4);
    }

    #[test]
    fn unresolved_label_is_invariant_violation() {
        let mut pool = ConstantPool::new();
        let mut w = new_writer();
        let stray = w.new_label();
        w.emit(Instruction::Goto(stray));
        assert!(matches!(
            w.finish(&mut pool),
            Err(EmitError::InvariantViolation(_))
        ));
    }

    #[test]
    fn ldc_picks_narrow_form_for_low_indices() {
        let mut pool = ConstantPool::new();
        let mut w = new_writer();
        w.emit(Instruction::Push(ConstantValue::String("hi".into())));
        w.emit(Instruction::Return(Some(NumKind::Ref)));
        let bytes = w.finish(&mut pool).expect("resolves");
        assert_eq!(bytes.code[0], 0x12); // ldc, not ldc_w
    }

    /// A wide local's companion `Top` slot must not survive into a
    /// `StackMapTable` entry as its own `verification_type_info` - it would
    /// shift every subsequent local's slot interpretation by one.
    #[test]
    fn compact_locals_drops_wide_companion_slot() {
        use VerificationTypeInfo as V;
        let locals = vec![V::Object(ClassReference::object()), V::Long, V::Top, V::Integer];
        assert_eq!(
            compact_locals(&locals),
            vec![V::Object(ClassReference::object()), V::Long, V::Integer]
        );
    }

    #[test]
    fn max_locals_counts_physical_slots_not_category_width() {
        let mut pool = ConstantPool::new();
        let locals = vec![VerificationTypeInfo::Long, VerificationTypeInfo::Top];
        let mut w = MethodWriter::new(locals, false);
        w.emit(Instruction::Return(None));
        let bytes = w.finish(&mut pool).expect("resolves");
        assert_eq!(bytes.max_locals, 2);
    }
}
