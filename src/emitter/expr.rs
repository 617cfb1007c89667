//! The expression emitter.
//!
//! [`emit_expr`] is the single entry point every recursive call goes
//! through. It dispatches on [`ExprKind`] via [`emit_node`], then applies
//! the return-opcode tail uniformly: after emitting any expression whose
//! context includes `return`, it emits the type-specialized return opcode.
//! Individual node kinds never emit a return themselves.
//!
//! Operand-position children (the left/right of an arithmetic op, a
//! method argument, ...) are always emitted in `Expression` disposition by
//! construction - their value is genuinely consumed by the opcode that
//! follows. Most node kinds therefore unconditionally emit their children,
//! perform their own opcode, and call [`drop_if_statement`] once at the
//! end to honor their *own* context. `null`/`literal` are the exception:
//! they elide the push entirely under `Statement` context rather than
//! push-then-pop.

use crate::ast::expr::{
    ArithOp, BitwiseOp, CatchClause, CompareOp, ConstantValue, Expr, ExprKind, InvokeKind, MethodRef,
    ShiftOp, SwitchClause,
};
use crate::emitter::ctx::EmitCtx;
use crate::instructions::tables;
use crate::instructions::{ArrayKind, CmpBias, Instruction, NumKind};
use crate::types::{Category, ClassReference, FieldType, MethodDescriptor, PrimitiveType, ReturnType};
use crate::writer::method_writer::{ExceptionHandler, LocalVarDebug};
use crate::writer::Label;
use crate::EmitError;

fn invariant(msg: impl Into<String>) -> EmitError {
    EmitError::InvariantViolation(msg.into())
}

/// Emits one AST node, honoring its context.
pub fn emit_expr(ctx: &mut EmitCtx, expr: &Expr) -> Result<(), EmitError> {
    if let Some(line) = expr.line {
        ctx.method.set_line(line);
    }
    emit_node(ctx, expr)?;
    emit_return_tail(ctx, expr)
}

/// The return-opcode tail, applied uniformly after any node whose context
/// carries `return`.
///
/// An `ExprKind::Return` node's own `ty` is conventionally `Void` (it has no
/// value of its own — it's a control-transfer node), so the opcode's type
/// must come from the returned *value*'s type, not the node's. Every other
/// node kind reached here is the method's single top-level tail expression
/// (possibly nested inside `if`/`switch`/`try` branches that are themselves
/// in tail position), whose own `ty` is the method's declared return type.
fn emit_return_tail(ctx: &mut EmitCtx, expr: &Expr) -> Result<(), EmitError> {
    if !expr.context.is_return {
        return Ok(());
    }
    let return_ty = match &expr.kind {
        ExprKind::Return(Some(value)) => value.ty.clone(),
        ExprKind::Return(None) => ReturnType::Void,
        _ => expr.ty.clone(),
    };
    match return_ty {
        ReturnType::Void => ctx.method.emit(Instruction::Return(None)),
        ReturnType::Some(t) => ctx.method.emit(Instruction::Return(Some(tables::num_kind(&t)))),
    }
    Ok(())
}

/// Pops the value a node left on the stack, if its own context discards it.
fn drop_if_statement(ctx: &mut EmitCtx, expr: &Expr) {
    if !expr.context.is_statement() {
        return;
    }
    match expr.category() {
        Some(Category::One) => ctx.method.emit(Instruction::Pop),
        Some(Category::Two) => ctx.method.emit(Instruction::Pop2),
        None => {}
    }
}

fn emit_args(ctx: &mut EmitCtx, args: &[Expr]) -> Result<(), EmitError> {
    for arg in args {
        emit_expr(ctx, arg)?;
    }
    Ok(())
}

fn field_type_of(ty: &ReturnType) -> Result<&FieldType, EmitError> {
    match ty {
        ReturnType::Some(t) => Ok(t),
        ReturnType::Void => Err(invariant("expected a non-void type, found void")),
    }
}

fn num_kind_of_ty(ty: &ReturnType) -> Result<NumKind, EmitError> {
    field_type_of(ty).map(tables::num_kind)
}

fn primitive_of(ty: &ReturnType) -> Result<PrimitiveType, EmitError> {
    match field_type_of(ty)? {
        FieldType::Base(p) => Ok(*p),
        other => Err(invariant(format!("expected a primitive type, found {other}"))),
    }
}

/// The element type of an array-typed operand, used by `array-access`/
/// `array-update` since neither carries an explicit element-type field.
fn array_element_type(array: &Expr) -> Result<&FieldType, EmitError> {
    match field_type_of(&array.ty)? {
        FieldType::Array(inner) => Ok(inner),
        other => Err(invariant(format!("expected an array type, found {other}"))),
    }
}

fn is_literal_true(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Literal(ConstantValue::Int(v)) if *v != 0)
}

/// A conservative "does this node already end in a jump/return/throw"
/// check, used to elide a redundant trailing `GOTO` in `if`/`switch`
/// lowering.
fn is_terminal(expr: &Expr) -> bool {
    if expr.context.is_tail {
        return true;
    }
    match &expr.kind {
        ExprKind::Return(_) | ExprKind::Throw(_) | ExprKind::Continue(_) | ExprKind::Break(_) => true,
        ExprKind::Do(children) => children.last().is_some_and(is_terminal),
        ExprKind::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => is_terminal(then_branch) && is_terminal(else_branch),
        ExprKind::Let { body, .. } => is_terminal(body),
        ExprKind::Try {
            body,
            catches,
            finally_block,
        } => {
            if finally_block.as_deref().is_some_and(is_terminal) {
                return true;
            }
            is_terminal(body) && catches.iter().all(|c| is_terminal(&c.body))
        }
        _ => false,
    }
}

/// Folds a literal source value to the target primitive's width via plain
/// `as` casts (two's-complement truncation / IEEE-754 rounding) - never via
/// an intermediate host-numeric type.
#[allow(clippy::cast_possible_truncation)]
fn fold_literal(value: &ConstantValue, target: PrimitiveType) -> Option<ConstantValue> {
    use PrimitiveType as P;
    match (value, target) {
        (ConstantValue::Int(v), P::Long) => Some(ConstantValue::Long(i64::from(*v))),
        (ConstantValue::Int(v), P::Float) => Some(ConstantValue::Float(*v as f32)),
        (ConstantValue::Int(v), P::Double) => Some(ConstantValue::Double(f64::from(*v))),
        (ConstantValue::Int(v), P::Byte) => Some(ConstantValue::Int(i32::from(*v as i8))),
        (ConstantValue::Int(v), P::Short) => Some(ConstantValue::Int(i32::from(*v as i16))),
        (ConstantValue::Int(v), P::Char) => Some(ConstantValue::Int(i32::from(*v as u16))),
        (ConstantValue::Long(v), P::Float) => Some(ConstantValue::Float(*v as f32)),
        (ConstantValue::Long(v), P::Double) => Some(ConstantValue::Double(*v as f64)),
        (ConstantValue::Float(v), P::Double) => Some(ConstantValue::Double(f64::from(*v))),
        (ConstantValue::Double(v), P::Float) => Some(ConstantValue::Float(*v as f32)),
        _ => None,
    }
}

fn arith_instruction(op: ArithOp, kind: NumKind) -> Instruction {
    match op {
        ArithOp::Add => Instruction::Add(kind),
        ArithOp::Sub => Instruction::Sub(kind),
        ArithOp::Mul => Instruction::Mul(kind),
        ArithOp::Div => Instruction::Div(kind),
        ArithOp::Rem => Instruction::Rem(kind),
    }
}

fn init_method_ref(owner: ClassReference, descriptor: MethodDescriptor) -> MethodRef {
    MethodRef {
        owner,
        name: "<init>".to_string(),
        descriptor,
    }
}

/// The per-`ExprKind` dispatch. Does not itself apply the
/// return tail - [`emit_expr`] wraps every call with that.
fn emit_node(ctx: &mut EmitCtx, expr: &Expr) -> Result<(), EmitError> {
    match &expr.kind {
        ExprKind::Do(children) => {
            if let Some((last, rest)) = children.split_last() {
                for child in rest {
                    emit_expr(ctx, child)?;
                }
                emit_expr(ctx, last)?;
            }
        }

        ExprKind::Null => {
            if !expr.context.is_statement() {
                ctx.method.emit(Instruction::PushNull);
            }
        }

        ExprKind::Literal(value) => {
            if !expr.context.is_statement() {
                match value {
                    ConstantValue::PrimitiveClass(p) => {
                        ctx.method.emit(Instruction::PushPrimitiveClass(*p));
                    }
                    other => ctx.method.emit(Instruction::Push(other.clone())),
                }
            }
        }

        ExprKind::Local { slot } => {
            let kind = num_kind_of_ty(&expr.ty)?;
            ctx.method.emit(Instruction::Load(kind, *slot));
            drop_if_statement(ctx, expr);
        }

        ExprKind::Super => {
            ctx.method.emit(Instruction::Load(NumKind::Ref, 0));
            drop_if_statement(ctx, expr);
        }

        ExprKind::Assignment { slot, value } => {
            emit_expr(ctx, value)?;
            if !expr.context.is_statement() {
                match value.category() {
                    Some(Category::Two) => ctx.method.emit(Instruction::Dup2),
                    _ => ctx.method.emit(Instruction::Dup),
                }
            }
            let kind = num_kind_of_ty(&value.ty)?;
            ctx.method.emit(Instruction::Store(kind, *slot));
        }

        ExprKind::Increment { slot, by } => {
            ctx.method.emit(Instruction::IInc(*slot, *by));
            if !expr.context.is_statement() {
                ctx.method.emit(Instruction::Load(NumKind::Int, *slot));
            }
        }

        ExprKind::Arith { op, lhs, rhs } => {
            emit_expr(ctx, lhs)?;
            emit_expr(ctx, rhs)?;
            let kind = num_kind_of_ty(&expr.ty)?;
            ctx.method.emit(arith_instruction(*op, kind));
            drop_if_statement(ctx, expr);
        }

        ExprKind::Neg(operand) => {
            emit_expr(ctx, operand)?;
            let kind = num_kind_of_ty(&expr.ty)?;
            ctx.method.emit(Instruction::Neg(kind));
            drop_if_statement(ctx, expr);
        }

        ExprKind::Bitwise { op, lhs, rhs } => {
            emit_expr(ctx, lhs)?;
            emit_expr(ctx, rhs)?;
            let kind = num_kind_of_ty(&expr.ty)?;
            ctx.method.emit(match op {
                BitwiseOp::And => Instruction::And(kind),
                BitwiseOp::Or => Instruction::Or(kind),
                BitwiseOp::Xor => Instruction::Xor(kind),
            });
            drop_if_statement(ctx, expr);
        }

        ExprKind::Shift { op, lhs, rhs } => {
            emit_expr(ctx, lhs)?;
            emit_expr(ctx, rhs)?;
            let kind = num_kind_of_ty(&expr.ty)?;
            ctx.method.emit(match op {
                ShiftOp::Shl => Instruction::Shl(kind),
                ShiftOp::Shr => Instruction::Shr(kind),
                ShiftOp::UShr => Instruction::UShr(kind),
            });
            drop_if_statement(ctx, expr);
        }

        ExprKind::Compare { .. }
        | ExprKind::CompareZero { .. }
        | ExprKind::And(_)
        | ExprKind::Or(_)
        | ExprKind::Not(_) => {
            return Err(invariant(
                "comparison/logical node reached outside the conditional emitter",
            ));
        }

        ExprKind::WideningPrimitive { source, target } => {
            if let ExprKind::Literal(value) = &source.kind {
                if matches!(target, PrimitiveType::Long | PrimitiveType::Double) {
                    if let Some(folded) = fold_literal(value, *target) {
                        ctx.method.emit(Instruction::Push(folded));
                        drop_if_statement(ctx, expr);
                        return Ok(());
                    }
                }
            }
            emit_expr(ctx, source)?;
            let source_prim = primitive_of(&source.ty)?;
            for op in tables::widen(source_prim, *target) {
                ctx.method.emit(Instruction::Convert(op));
            }
            drop_if_statement(ctx, expr);
        }

        ExprKind::NarrowingPrimitive { source, target } => {
            if let ExprKind::Literal(value) = &source.kind {
                if matches!(
                    target,
                    PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char | PrimitiveType::Float
                ) {
                    if let Some(folded) = fold_literal(value, *target) {
                        ctx.method.emit(Instruction::Push(folded));
                        drop_if_statement(ctx, expr);
                        return Ok(());
                    }
                }
            }
            emit_expr(ctx, source)?;
            let source_prim = primitive_of(&source.ty)?;
            for op in tables::narrow(source_prim, *target) {
                ctx.method.emit(Instruction::Convert(op));
            }
            drop_if_statement(ctx, expr);
        }

        ExprKind::Boxing { source } => {
            emit_expr(ctx, source)?;
            let prim = primitive_of(&source.ty)?;
            let owner = ClassReference::new(prim.boxed_class_name());
            let descriptor = MethodDescriptor::new(
                vec![FieldType::Base(prim)],
                ReturnType::Some(FieldType::Object(owner.clone())),
            );
            ctx.method.emit(Instruction::Invoke(
                InvokeKind::Static,
                MethodRef {
                    owner,
                    name: "valueOf".to_string(),
                    descriptor,
                },
            ));
            drop_if_statement(ctx, expr);
        }

        ExprKind::Unboxing { source, target } => {
            emit_expr(ctx, source)?;
            let owner = ClassReference::new(target.boxed_class_name());
            let descriptor = MethodDescriptor::new(vec![], ReturnType::Some(FieldType::Base(*target)));
            ctx.method.emit(Instruction::Invoke(
                InvokeKind::Virtual,
                MethodRef {
                    owner,
                    name: target.unboxing_method_name().to_string(),
                    descriptor,
                },
            ));
            drop_if_statement(ctx, expr);
        }

        ExprKind::WideningReference(source) => {
            emit_expr(ctx, source)?;
        }

        ExprKind::NarrowingReference { source, target } => {
            emit_expr(ctx, source)?;
            ctx.method.emit(Instruction::CheckCast(target.clone()));
            drop_if_statement(ctx, expr);
        }

        ExprKind::InstanceOf { source, target } => {
            emit_expr(ctx, source)?;
            ctx.method.emit(Instruction::InstanceOf(target.clone()));
            drop_if_statement(ctx, expr);
        }

        ExprKind::Let { bindings, body } => {
            let mut starts = Vec::with_capacity(bindings.len());
            for binding in bindings {
                emit_expr(ctx, &binding.init)?;
                let kind = tables::num_kind(&binding.var_type);
                ctx.method.emit(Instruction::Store(kind, binding.slot));
                let start = ctx.method.new_label();
                ctx.method.place_label(start);
                starts.push(start);
            }
            emit_expr(ctx, body)?;
            let end = ctx.method.new_label();
            ctx.method.place_label(end);
            for (binding, start) in bindings.iter().zip(starts) {
                ctx.method.record_local_debug(LocalVarDebug {
                    name: binding.name.clone(),
                    descriptor: binding.var_type.clone(),
                    start,
                    end,
                    slot: binding.slot,
                });
            }
        }

        ExprKind::Labeled { label, target } => {
            let break_label = ctx.method.new_label();
            let mut child = ctx.with_loop(Some(label.clone()), break_label, break_label);
            emit_expr(&mut child, target)?;
            ctx.method.place_label(break_label);
        }

        ExprKind::If {
            test,
            then_branch,
            else_branch,
        } => {
            let end = ctx.method.new_label();
            let else_label = if else_branch.is_some() { ctx.method.new_label() } else { end };
            emit_conditional(ctx, test, else_label, false)?;
            emit_expr(ctx, then_branch)?;
            if let Some(else_expr) = else_branch {
                if !is_terminal(then_branch) {
                    ctx.method.emit(Instruction::Goto(end));
                }
                ctx.method.place_label(else_label);
                emit_expr(ctx, else_expr)?;
            }
            ctx.method.place_label(end);
        }

        ExprKind::Switch { test, clauses, default } => {
            emit_switch(ctx, test, clauses, default.as_deref())?;
        }

        ExprKind::While { label, test, body } => {
            emit_loop(ctx, expr, label.clone(), test, None, body)?;
        }

        ExprKind::For { label, test, step, body } => {
            emit_loop(ctx, expr, label.clone(), test, Some(step), body)?;
        }

        ExprKind::Try {
            body,
            catches,
            finally_block,
        } => {
            emit_try(ctx, body, catches, finally_block.as_deref())?;
        }

        ExprKind::Continue(name) => {
            let target = resolve_label(ctx, name.as_deref(), true)?;
            ctx.method.emit(Instruction::Goto(target));
        }

        ExprKind::Break(name) => {
            let target = resolve_label(ctx, name.as_deref(), false)?;
            ctx.method.emit(Instruction::Goto(target));
        }

        ExprKind::Return(value) => {
            if let Some(v) = value {
                emit_expr(ctx, v)?;
            }
        }

        ExprKind::Throw(exception) => {
            emit_expr(ctx, exception)?;
            ctx.method.emit(Instruction::AThrow);
        }

        ExprKind::New { class, descriptor, args } => {
            ctx.method.emit(Instruction::New(class.clone()));
            if !expr.context.is_statement() {
                ctx.method.emit(Instruction::Dup);
            }
            emit_args(ctx, args)?;
            ctx.method.emit(Instruction::Invoke(
                InvokeKind::Special,
                init_method_ref(class.clone(), descriptor.clone()),
            ));
        }

        ExprKind::CtorInvocation { class, descriptor, args } => {
            ctx.method.emit(Instruction::Load(NumKind::Ref, 0));
            emit_args(ctx, args)?;
            ctx.method.emit(Instruction::Invoke(
                InvokeKind::Special,
                init_method_ref(class.clone(), descriptor.clone()),
            ));
        }

        ExprKind::FieldAccess { target, field } => {
            if let Some(t) = target {
                emit_expr(ctx, t)?;
                ctx.method.emit(Instruction::GetField(field.clone()));
            } else {
                ctx.method.emit(Instruction::GetStatic(field.clone()));
            }
            drop_if_statement(ctx, expr);
        }

        ExprKind::FieldUpdate { target, field, value } => {
            if let Some(t) = target {
                emit_expr(ctx, t)?;
                emit_expr(ctx, value)?;
                if !expr.context.is_statement() {
                    match value.category() {
                        Some(Category::Two) => ctx.method.emit(Instruction::Dup2X1),
                        _ => ctx.method.emit(Instruction::DupX1),
                    }
                }
                ctx.method.emit(Instruction::PutField(field.clone()));
            } else {
                emit_expr(ctx, value)?;
                if !expr.context.is_statement() {
                    match value.category() {
                        Some(Category::Two) => ctx.method.emit(Instruction::Dup2),
                        _ => ctx.method.emit(Instruction::Dup),
                    }
                }
                ctx.method.emit(Instruction::PutStatic(field.clone()));
            }
        }

        ExprKind::MethodInvocation { target, kind, method, args } => {
            if let Some(t) = target {
                emit_expr(ctx, t)?;
            }
            emit_args(ctx, args)?;
            ctx.method.emit(Instruction::Invoke(*kind, method.clone()));
            match &method.descriptor.return_type {
                ReturnType::Void => {
                    if !expr.context.is_statement() {
                        ctx.method.emit(Instruction::PushNull);
                    }
                }
                ReturnType::Some(_) => drop_if_statement(ctx, expr),
            }
        }

        ExprKind::NewArray {
            element_type,
            dimensions,
            initializer,
        } => {
            if dimensions.len() == 1 {
                emit_expr(ctx, &dimensions[0])?;
                match element_type {
                    FieldType::Base(p) => ctx.method.emit(Instruction::NewArrayPrimitive(*p)),
                    FieldType::Object(_) | FieldType::Array(_) => {
                        ctx.method.emit(Instruction::ANewArray(element_type.internal_name()));
                    }
                }
                if let Some(init) = initializer {
                    let array_kind = tables::array_kind(element_type);
                    for (index, element) in init.iter().enumerate() {
                        ctx.method.emit(Instruction::Dup);
                        ctx.method.emit(Instruction::Push(ConstantValue::Int(index as i32)));
                        emit_expr(ctx, element)?;
                        ctx.method.emit(Instruction::ArrayStore(array_kind));
                    }
                }
            } else {
                for dim in dimensions {
                    emit_expr(ctx, dim)?;
                }
                let mut full_type = element_type.clone();
                for _ in 0..dimensions.len() {
                    full_type = full_type.make_array_type();
                }
                ctx.method.emit(Instruction::MultiANewArray {
                    descriptor: full_type.descriptor_string(),
                    dimensions: dimensions.len() as u8,
                });
            }
            drop_if_statement(ctx, expr);
        }

        ExprKind::ArrayLength(array) => {
            emit_expr(ctx, array)?;
            ctx.method.emit(Instruction::ArrayLength);
            drop_if_statement(ctx, expr);
        }

        ExprKind::ArrayAccess { array, index } => {
            emit_expr(ctx, array)?;
            emit_expr(ctx, index)?;
            let element_type = array_element_type(array)?;
            ctx.method.emit(Instruction::ArrayLoad(tables::array_kind(element_type)));
            drop_if_statement(ctx, expr);
        }

        ExprKind::ArrayUpdate { array, index, value } => {
            emit_expr(ctx, array)?;
            emit_expr(ctx, index)?;
            emit_expr(ctx, value)?;
            if !expr.context.is_statement() {
                match value.category() {
                    Some(Category::Two) => ctx.method.emit(Instruction::Dup2X2),
                    _ => ctx.method.emit(Instruction::DupX2),
                }
            }
            let element_type = array_element_type(array)?;
            ctx.method.emit(Instruction::ArrayStore(tables::array_kind(element_type)));
        }
    }
    Ok(())
}

fn resolve_label(ctx: &EmitCtx, name: Option<&str>, continue_target: bool) -> Result<Label, EmitError> {
    let scope = match name {
        Some(n) => ctx
            .labels
            .named(n)
            .ok_or_else(|| invariant(format!("no enclosing loop or labeled statement named '{n}'")))?,
        None => ctx
            .labels
            .innermost()
            .ok_or_else(|| invariant("continue/break used outside any loop"))?,
    };
    Ok(if continue_target {
        scope.continue_label
    } else {
        scope.break_label
    })
}

/// `switch` lowering.
fn emit_switch(
    ctx: &mut EmitCtx,
    test: &Expr,
    clauses: &[SwitchClause],
    default: Option<&Expr>,
) -> Result<(), EmitError> {
    emit_expr(ctx, test)?;

    let mut keyed_labels: Vec<(i32, Label)> = Vec::new();
    let mut bodies: Vec<(Label, &SwitchClause)> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let label = ctx.method.new_label();
        for key in &clause.keys {
            keyed_labels.push((*key, label));
        }
        bodies.push((label, clause));
    }
    keyed_labels.sort_by_key(|(key, _)| *key);

    let default_label = ctx.method.new_label();
    let end = ctx.method.new_label();

    if keyed_labels.is_empty() {
        // No clauses at all: the test value was still pushed above (every
        // switch evaluates its selector), but with no table/lookup switch to
        // consume it as a key, it would otherwise sit live on the stack
        // through the unconditional jump to `default`.
        ctx.method.emit(Instruction::Pop);
        ctx.method.emit(Instruction::Goto(default_label));
    } else {
        let contiguous = keyed_labels.windows(2).all(|w| w[1].0 == w[0].0 + 1);
        let low = keyed_labels[0].0;
        let high = keyed_labels[keyed_labels.len() - 1].0;
        if contiguous {
            let targets = keyed_labels.iter().map(|(_, l)| *l).collect();
            ctx.method.emit(Instruction::TableSwitch {
                low,
                high,
                default: default_label,
                targets,
            });
        } else {
            ctx.method.emit(Instruction::LookupSwitch {
                default: default_label,
                pairs: keyed_labels,
            });
        }
    }

    for (label, clause) in &bodies {
        ctx.method.place_label(*label);
        if let Some(guard) = &clause.guard {
            emit_conditional(ctx, guard, default_label, false)?;
        }
        emit_expr(ctx, &clause.body)?;
        if !is_terminal(&clause.body) {
            ctx.method.emit(Instruction::Goto(end));
        }
    }

    ctx.method.place_label(default_label);
    if let Some(default_expr) = default {
        emit_expr(ctx, default_expr)?;
    }
    ctx.method.place_label(end);
    Ok(())
}

/// `while`/`for`, sharing a single lowering: `for`'s `continue`
/// target is its step, `while`'s is its own test re-check.
fn emit_loop(
    ctx: &mut EmitCtx,
    expr: &Expr,
    label: Option<String>,
    test: &Expr,
    step: Option<&Expr>,
    body: &Expr,
) -> Result<(), EmitError> {
    let start = ctx.method.new_label();
    let end = ctx.method.new_label();
    let continue_label = if step.is_some() { ctx.method.new_label() } else { start };

    ctx.method.place_label(start);
    if !is_literal_true(test) {
        emit_conditional(ctx, test, end, false)?;
    }
    {
        let mut child = ctx.with_loop(label, continue_label, end);
        emit_expr(&mut child, body)?;
    }
    if let Some(step_expr) = step {
        ctx.method.place_label(continue_label);
        emit_expr(ctx, step_expr)?;
    }
    ctx.method.emit(Instruction::Goto(start));
    ctx.method.place_label(end);

    if !expr.context.is_statement() {
        ctx.method.emit(Instruction::PushNull);
    }
    Ok(())
}

/// `try`/`catch`/`finally`. The finally body is inlined at every
/// exit path (normal completion, each catch's completion, and the
/// synthetic default handler), per the Design Note: "the present contract
/// is inlining", no subroutine-dispatch variant.
fn emit_try(
    ctx: &mut EmitCtx,
    body: &Expr,
    catches: &[CatchClause],
    finally_block: Option<&Expr>,
) -> Result<(), EmitError> {
    let body_start = ctx.method.new_label();
    let body_end = ctx.method.new_label();
    let try_end = ctx.method.new_label();
    let default_handler = finally_block.is_some().then(|| ctx.method.new_label());

    ctx.method.place_label(body_start);
    emit_expr(ctx, body)?;
    ctx.method.place_label(body_end);
    if let Some(finally_expr) = finally_block {
        emit_expr(ctx, finally_expr)?;
    }
    ctx.method.emit(Instruction::Goto(try_end));

    let mut catch_spans = Vec::with_capacity(catches.len());
    for catch in catches {
        let catch_start = ctx.method.new_label();
        ctx.method.place_label(catch_start);
        ctx.method.emit(Instruction::Store(NumKind::Ref, catch.local_slot));
        let var_start = ctx.method.new_label();
        ctx.method.place_label(var_start);
        emit_expr(ctx, &catch.body)?;
        let catch_end = ctx.method.new_label();
        ctx.method.place_label(catch_end);
        ctx.method.record_local_debug(LocalVarDebug {
            name: catch.local_name.clone(),
            descriptor: FieldType::Object(catch.exception_type.clone()),
            start: var_start,
            end: catch_end,
            slot: catch.local_slot,
        });
        if let Some(finally_expr) = finally_block {
            emit_expr(ctx, finally_expr)?;
        }
        ctx.method.emit(Instruction::Goto(try_end));
        catch_spans.push((catch_start, catch_end, catch));
    }

    if let (Some(handler), Some(finally_expr)) = (default_handler, finally_block) {
        ctx.method.place_label(handler);
        emit_expr(ctx, finally_expr)?;
        ctx.method.emit(Instruction::AThrow);
    }

    ctx.method.place_label(try_end);

    for (catch_start, _, catch) in &catch_spans {
        ctx.method.add_exception_handler(ExceptionHandler {
            start: body_start,
            end: body_end,
            handler: *catch_start,
            catch_type: Some(catch.exception_type.clone()),
        });
    }
    if let Some(handler) = default_handler {
        ctx.method.add_exception_handler(ExceptionHandler {
            start: body_start,
            end: body_end,
            handler,
            catch_type: None,
        });
        for (catch_start, catch_end, _) in &catch_spans {
            ctx.method.add_exception_handler(ExceptionHandler {
                start: *catch_start,
                end: *catch_end,
                handler,
                catch_type: None,
            });
        }
    }
    Ok(())
}

/// The conditional emitter, generalized with a `branch_if` sense so
/// `and`/`or`/`not` compose correctly under nesting (e.g. `(a && b) ||
/// c`). External call sites (`if`, `switch` guards, loop tests) always use
/// the plain contract, `branch_if = false`: branch to `target`
/// when the condition is false. `branch_if = true` ("branch when true") is
/// an internal mechanism `and`/`or` use on each other's behalf.
pub fn emit_conditional(
    ctx: &mut EmitCtx,
    expr: &Expr,
    target: Label,
    branch_if: bool,
) -> Result<(), EmitError> {
    match &expr.kind {
        ExprKind::Compare { op, lhs, rhs } => emit_compare(ctx, *op, lhs, rhs, target, branch_if),
        ExprKind::CompareZero { op, operand } => emit_compare_zero(ctx, *op, operand, target, branch_if),
        ExprKind::And(operands) => emit_and(ctx, operands, target, branch_if),
        ExprKind::Or(operands) => emit_or(ctx, operands, target, branch_if),
        ExprKind::Not(inner) => emit_conditional(ctx, inner, target, !branch_if),
        _ => {
            emit_expr(ctx, expr)?;
            let op = if branch_if { CompareOp::Ne } else { CompareOp::Eq };
            ctx.method.emit(Instruction::IfZero(op, target));
            Ok(())
        }
    }
}

fn emit_compare(
    ctx: &mut EmitCtx,
    op: CompareOp,
    lhs: &Expr,
    rhs: &Expr,
    target: Label,
    branch_if: bool,
) -> Result<(), EmitError> {
    emit_expr(ctx, lhs)?;
    emit_expr(ctx, rhs)?;
    let effective_op = if branch_if { op } else { op.negated() };
    let ty = field_type_of(&lhs.ty)?;
    match tables::num_kind(ty) {
        NumKind::Int => ctx.method.emit(Instruction::IfICmp(effective_op, target)),
        NumKind::Ref => {
            if !matches!(op, CompareOp::Eq | CompareOp::Ne) {
                return Err(invariant("reference comparison only supports eq/ne"));
            }
            ctx.method.emit(Instruction::IfACmp(effective_op, target));
        }
        NumKind::Long => {
            ctx.method.emit(Instruction::Cmp(NumKind::Long, CmpBias::Greater));
            ctx.method.emit(Instruction::IfZero(effective_op, target));
        }
        kind @ (NumKind::Float | NumKind::Double) => {
            let bias = tables::float_cmp_bias(op);
            ctx.method.emit(Instruction::Cmp(kind, bias));
            ctx.method.emit(Instruction::IfZero(effective_op, target));
        }
    }
    Ok(())
}

fn emit_compare_zero(
    ctx: &mut EmitCtx,
    op: CompareOp,
    operand: &Expr,
    target: Label,
    branch_if: bool,
) -> Result<(), EmitError> {
    emit_expr(ctx, operand)?;
    let effective_op = if branch_if { op } else { op.negated() };
    match field_type_of(&operand.ty)? {
        FieldType::Object(_) | FieldType::Array(_) => {
            if !matches!(op, CompareOp::Eq | CompareOp::Ne) {
                return Err(invariant("null comparison only supports eq/ne"));
            }
            ctx.method.emit(Instruction::IfNull(effective_op, target));
        }
        FieldType::Base(_) => {
            ctx.method.emit(Instruction::IfZero(effective_op, target));
        }
    }
    Ok(())
}

fn emit_and(ctx: &mut EmitCtx, operands: &[Expr], target: Label, branch_if: bool) -> Result<(), EmitError> {
    if branch_if {
        let skip = ctx.method.new_label();
        if let Some((last, rest)) = operands.split_last() {
            for operand in rest {
                emit_conditional(ctx, operand, skip, false)?;
            }
            emit_conditional(ctx, last, target, true)?;
        }
        ctx.method.place_label(skip);
    } else {
        for operand in operands {
            emit_conditional(ctx, operand, target, false)?;
        }
    }
    Ok(())
}

fn emit_or(ctx: &mut EmitCtx, operands: &[Expr], target: Label, branch_if: bool) -> Result<(), EmitError> {
    if branch_if {
        for operand in operands {
            emit_conditional(ctx, operand, target, true)?;
        }
    } else {
        let then_label = ctx.method.new_label();
        if let Some((last, rest)) = operands.split_last() {
            for operand in rest {
                emit_conditional(ctx, operand, then_label, true)?;
            }
            emit_conditional(ctx, last, target, false)?;
        }
        ctx.method.place_label(then_label);
    }
    Ok(())
}
