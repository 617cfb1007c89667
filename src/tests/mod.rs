//! Crate-wide property tests, kept separate from the per-module `#[cfg(test)]
//! mod test` blocks under their own `src/tests/mod.rs` rather than scattered
//! throughout the crate.
//!
//! These only exercise shallow expression trees (a literal, or one
//! arithmetic op over two literals) -- deep enough to catch a stack-effect
//! regression in [`crate::emitter::expr`], shallow enough that a hand-rolled
//! `Strategy` stays honest without a generator for the whole AST.

use proptest::prelude::*;

use crate::ast::expr::ArithOp;
use crate::ast::{ConstantValue, Context, Expr, ExprKind};
use crate::emitter::ctx::EmitCtx;
use crate::emitter::expr::emit_expr;
use crate::types::{Category, FieldType, PrimitiveType, ReturnType};
use crate::writer::method_writer::{net_word_stack_delta, MethodWriter};

/// The four numeric primitive types arithmetic/literals are exercised over;
/// `boolean`/`byte`/`char`/`short` all narrow to `Category::One` the same
/// way `int` does, so they'd add cases without adding coverage.
pub(crate) fn arb_field_type() -> impl Strategy<Value = PrimitiveType> {
    prop_oneof![
        Just(PrimitiveType::Int),
        Just(PrimitiveType::Long),
        Just(PrimitiveType::Float),
        Just(PrimitiveType::Double),
    ]
}

fn literal_of(ty: PrimitiveType, int_bits: i64) -> ConstantValue {
    match ty {
        PrimitiveType::Long => ConstantValue::Long(int_bits),
        PrimitiveType::Float => ConstantValue::Float(int_bits as f32),
        PrimitiveType::Double => ConstantValue::Double(int_bits as f64),
        _ => ConstantValue::Int(int_bits as i32),
    }
}

fn leaf(ty: PrimitiveType) -> impl Strategy<Value = Expr> {
    any::<i32>().prop_map(move |v| {
        Expr::new(
            ExprKind::Literal(literal_of(ty, v as i64)),
            ReturnType::Some(FieldType::Base(ty)),
            Context::expression(),
        )
    })
}

/// A shallow expression tree: a bare literal, or one arithmetic op applied
/// to two literals of the same primitive type. Always
/// built in [`Context::expression`] -- the property test fixture re-wraps
/// the *top* node with whichever context it's checking.
pub(crate) fn arb_expr(ty: PrimitiveType) -> impl Strategy<Value = Expr> {
    leaf(ty).prop_recursive(2, 4, 2, move |_inner| {
        (
            leaf(ty),
            leaf(ty),
            prop_oneof![
                Just(ArithOp::Add),
                Just(ArithOp::Sub),
                Just(ArithOp::Mul),
                Just(ArithOp::Div),
                Just(ArithOp::Rem),
            ],
        )
            .prop_map(move |(lhs, rhs, op)| {
                Expr::new(
                    ExprKind::Arith {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ReturnType::Some(FieldType::Base(ty)),
                    Context::expression(),
                )
            })
    })
}

/// Re-lowers `expr` with its top-level context swapped to `context`
/// (children are left alone -- they keep the `expression` context
/// [`arb_expr`] built them with).
fn with_top_context(mut expr: Expr, context: Context) -> Expr {
    expr.context = context;
    expr
}

fn net_stack_delta(expr: &Expr) -> i32 {
    let mut method = MethodWriter::new(Vec::new(), false);
    let mut ctx = EmitCtx::new(&mut method, false);
    emit_expr(&mut ctx, expr).expect("shallow literal/arith trees always lower");
    net_word_stack_delta(&method.instructions())
}

fn arb_typed_expr() -> impl Strategy<Value = Expr> {
    arb_field_type().prop_flat_map(arb_expr)
}

proptest! {
    /// A node emitted in `expression` context leaves the stack exactly
    /// `category(n.type)` words deeper than it found it.
    #[test]
    fn stack_discipline(expr in arb_typed_expr()) {
        let category_words = match expr.ty.category() {
            Some(Category::One) => 1,
            Some(Category::Two) => 2,
            None => 0,
        };
        let top = with_top_context(expr, Context::expression());
        prop_assert_eq!(net_stack_delta(&top), category_words);
    }

    /// The same node emitted in `statement` context leaves the stack
    /// exactly as deep as it found it.
    #[test]
    fn statement_discipline(expr in arb_typed_expr()) {
        let top = with_top_context(expr, Context::statement());
        prop_assert_eq!(net_stack_delta(&top), 0);
    }
}
