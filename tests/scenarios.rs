//! End-to-end scenario tests.
//!
//! Each scenario hand-builds a [`ClassNode`] the way a real parser/typer
//! would hand it to [`classgen::emit_class`], then asserts on the emitted
//! instruction bytes of the relevant method's `Code` attribute — this crate
//! has no verifier or interpreter of its own, so "runs correctly on a JVM"
//! is approximated by asserting the exact expected opcode sequence (S1, S6)
//! or a defining structural marker (S2, S3, S4, S5).

mod support;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use classgen::ast::expr::{ArithOp, CompareOp, InvokeKind, LetBinding, MethodRef, SwitchClause};
use classgen::ast::{ClassNode, ConstantValue, Context, Expr, ExprKind, MethodFlags, MethodNode, Parameter};
use classgen::config::EmitConfig;
use classgen::types::access::{AccessFlag, AccessSet};
use classgen::types::{ClassReference, FieldType, MethodDescriptor, PrimitiveType, ReturnType};

use support::ClassFile;

fn local(slot: u16, ty: PrimitiveType) -> Expr {
    Expr::new(
        ExprKind::Local { slot },
        ReturnType::Some(FieldType::Base(ty)),
        Context::expression(),
    )
}

fn int_literal(v: i32) -> Expr {
    Expr::new(
        ExprKind::Literal(ConstantValue::Int(v)),
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    )
}

fn param(name: &str, ty: PrimitiveType, slot: u16) -> Parameter {
    Parameter {
        name: name.to_string(),
        param_type: FieldType::Base(ty),
        access: AccessSet::new(),
        annotations: vec![],
        slot,
    }
}

fn plain_method(
    name: &str,
    access: AccessSet,
    parameters: Vec<Parameter>,
    return_type: ReturnType,
    body: Expr,
) -> MethodNode {
    MethodNode {
        access,
        name: name.to_string(),
        return_type,
        parameters,
        thrown_exceptions: vec![],
        body: Some(body),
        flags: MethodFlags::Plain,
        is_varargs: false,
        runtime_visible_annotations: vec![],
        runtime_invisible_annotations: vec![],
        runtime_visible_parameter_annotations: Default::default(),
        runtime_invisible_parameter_annotations: Default::default(),
    }
}

fn wrap_class(internal_name: &str, methods: Vec<MethodNode>) -> ClassNode {
    let mut class = ClassNode::new(internal_name, AccessSet::from([AccessFlag::Public]));
    class.methods = methods;
    class
}

/// S1 — `static int add(int a, int b) { return a + b; }` lowers to exactly
/// `ILOAD_0; ILOAD_1; IADD; IRETURN`.
#[test]
fn s1_add_two_ints() {
    let body = Expr::new(
        ExprKind::Arith {
            op: ArithOp::Add,
            lhs: Box::new(local(0, PrimitiveType::Int)),
            rhs: Box::new(local(1, PrimitiveType::Int)),
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    );
    let method = plain_method(
        "add",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![param("a", PrimitiveType::Int, 0), param("b", PrimitiveType::Int, 1)],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("Scenario1", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, max_stack, max_locals) = reader.method_code("add");
    assert_eq!(code, vec![0x1A, 0x1B, 0x60, 0xAC]);
    assert_eq!(max_stack, 1);
    assert_eq!(max_locals, 2);
}

/// S2 — a labeled `break` from an inner `for` loop exits both the inner
/// and the outer `for`:
/// ```text
/// outer: for (int i = 0; i < rows; i++) {
///     for (int j = 0; j < cols; j++) {
///         if (j == 1) break outer;
///     }
/// }
/// ```
/// The break must jump past the outer loop's own back-edge, not just the
/// inner one's.
#[test]
fn s2_labeled_break_out_of_nested_loop() {
    let i_slot = 2u16;
    let j_slot = 3u16;

    let inner_body = Expr::new(
        ExprKind::If {
            test: Box::new(Expr::new(
                ExprKind::Compare {
                    op: CompareOp::Eq,
                    lhs: Box::new(local(j_slot, PrimitiveType::Int)),
                    rhs: Box::new(int_literal(1)),
                },
                ReturnType::Some(FieldType::Base(PrimitiveType::Boolean)),
                Context::expression(),
            )),
            then_branch: Box::new(Expr::new(
                ExprKind::Break(Some("outer".to_string())),
                ReturnType::Void,
                Context::statement(),
            )),
            else_branch: None,
        },
        ReturnType::Void,
        Context::statement(),
    );

    let inner_for = Expr::new(
        ExprKind::For {
            label: None,
            test: Box::new(Expr::new(
                ExprKind::Compare {
                    op: CompareOp::Lt,
                    lhs: Box::new(local(j_slot, PrimitiveType::Int)),
                    rhs: Box::new(local(1, PrimitiveType::Int)),
                },
                ReturnType::Some(FieldType::Base(PrimitiveType::Boolean)),
                Context::expression(),
            )),
            step: Box::new(Expr::new(
                ExprKind::Increment { slot: j_slot, by: 1 },
                ReturnType::Void,
                Context::statement(),
            )),
            body: Box::new(inner_body),
        },
        ReturnType::Void,
        Context::statement(),
    );

    let inner_let = Expr::new(
        ExprKind::Let {
            bindings: vec![LetBinding {
                slot: j_slot,
                name: "j".to_string(),
                var_type: FieldType::Base(PrimitiveType::Int),
                init: int_literal(0),
            }],
            body: Box::new(inner_for),
        },
        ReturnType::Void,
        Context::statement(),
    );

    let outer_for = Expr::new(
        ExprKind::For {
            label: None,
            test: Box::new(Expr::new(
                ExprKind::Compare {
                    op: CompareOp::Lt,
                    lhs: Box::new(local(i_slot, PrimitiveType::Int)),
                    rhs: Box::new(local(0, PrimitiveType::Int)),
                },
                ReturnType::Some(FieldType::Base(PrimitiveType::Boolean)),
                Context::expression(),
            )),
            step: Box::new(Expr::new(
                ExprKind::Increment { slot: i_slot, by: 1 },
                ReturnType::Void,
                Context::statement(),
            )),
            body: Box::new(inner_let),
        },
        ReturnType::Void,
        Context::statement(),
    );

    let labeled = Expr::new(
        ExprKind::Labeled {
            label: "outer".to_string(),
            target: Box::new(outer_for),
        },
        ReturnType::Void,
        Context::statement(),
    );

    let outer_let = Expr::new(
        ExprKind::Let {
            bindings: vec![LetBinding {
                slot: i_slot,
                name: "i".to_string(),
                var_type: FieldType::Base(PrimitiveType::Int),
                init: int_literal(0),
            }],
            body: Box::new(labeled),
        },
        ReturnType::Void,
        Context::statement(),
    );

    let method = plain_method(
        "loop",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![param("rows", PrimitiveType::Int, 0), param("cols", PrimitiveType::Int, 1)],
        ReturnType::Void,
        outer_let,
    );
    let class = wrap_class("Scenario2", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, max_locals) = reader.method_code("loop");
    assert_eq!(max_locals, 4, "slots 0,1 are the params, 2 and 3 are `i` and `j`: {code:02x?}");
    let goto_count = code.iter().filter(|&&b| b == 0xA7).count();
    assert_eq!(goto_count, 3, "expected one GOTO per loop back-edge plus the break itself: {code:02x?}");
    let if_icmpge_count = code.iter().filter(|&&b| b == 0xA2).count();
    assert_eq!(if_icmpge_count, 2, "both loop tests negate `<` to `IF_ICMPGE`: {code:02x?}");
    assert!(code.contains(&0x84), "expected IINC for the loop steps: {code:02x?}");
}

/// S5 — a switch with keys `{1,2,3,4,5}` selects `TABLESWITCH` (opcode
/// `0xAA`), not `LOOKUPSWITCH`.
#[test]
fn s5_sequential_keys_emit_tableswitch() {
    let clauses: Vec<SwitchClause> = (1..=5)
        .map(|k| SwitchClause {
            keys: vec![k],
            guard: None,
            body: Expr::new(ExprKind::Return(Some(Box::new(int_literal(k)))), ReturnType::Void, Context::expression().returning()),
        })
        .collect();
    let body = Expr::new(
        ExprKind::Switch {
            test: Box::new(local(0, PrimitiveType::Int)),
            clauses,
            default: Some(Box::new(Expr::new(
                ExprKind::Return(Some(Box::new(int_literal(0)))),
                ReturnType::Void,
                Context::expression().returning(),
            ))),
        },
        ReturnType::Void,
        Context::statement(),
    );
    let method = plain_method(
        "pick",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![param("k", PrimitiveType::Int, 0)],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("Scenario5", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("pick");
    assert!(code.contains(&0xAA), "expected a TABLESWITCH opcode, got {code:02x?}");
    assert!(!code.contains(&0xAB), "must not fall back to LOOKUPSWITCH for contiguous keys");
}

/// A switch over a sparse key set `{1, 10, 100}` selects `LOOKUPSWITCH`
/// (`0xAB`), the density counterpart to S5.
#[test]
fn sparse_keys_emit_lookupswitch() {
    let clauses: Vec<SwitchClause> = [1, 10, 100]
        .into_iter()
        .map(|k| SwitchClause {
            keys: vec![k],
            guard: None,
            body: Expr::new(ExprKind::Return(Some(Box::new(int_literal(k)))), ReturnType::Void, Context::expression().returning()),
        })
        .collect();
    let body = Expr::new(
        ExprKind::Switch {
            test: Box::new(local(0, PrimitiveType::Int)),
            clauses,
            default: Some(Box::new(Expr::new(
                ExprKind::Return(Some(Box::new(int_literal(0)))),
                ReturnType::Void,
                Context::expression().returning(),
            ))),
        },
        ReturnType::Void,
        Context::statement(),
    );
    let method = plain_method(
        "pick",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![param("k", PrimitiveType::Int, 0)],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("ScenarioSparse", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("pick");
    assert!(code.contains(&0xAB), "expected a LOOKUPSWITCH opcode, got {code:02x?}");
    assert!(!code.contains(&0xAA));
}

/// Stress test: a switch statement shuffled out of key order, over a
/// randomly-placed but genuinely contiguous run of keys, still selects
/// `TABLESWITCH` -- the emitter sorts clauses by key itself
/// (`emit_switch`), so caller order must not matter. Seeded for a
/// reproducible run.
#[test]
fn random_contiguous_keys_emit_tableswitch_regardless_of_order() {
    let mut rng = StdRng::seed_from_u64(0xC1A5_5EED);
    let start: i32 = rng.random_range(-500..500);
    let mut clauses: Vec<SwitchClause> = (0..40)
        .map(|i| {
            let k = start + i;
            SwitchClause {
                keys: vec![k],
                guard: None,
                body: Expr::new(ExprKind::Return(Some(Box::new(int_literal(k)))), ReturnType::Void, Context::expression().returning()),
            }
        })
        .collect();
    clauses.shuffle(&mut rng);

    let body = Expr::new(
        ExprKind::Switch {
            test: Box::new(local(0, PrimitiveType::Int)),
            clauses,
            default: Some(Box::new(Expr::new(
                ExprKind::Return(Some(Box::new(int_literal(0)))),
                ReturnType::Void,
                Context::expression().returning(),
            ))),
        },
        ReturnType::Void,
        Context::statement(),
    );
    let method = plain_method(
        "pick",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![param("k", PrimitiveType::Int, 0)],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("ScenarioRandomContiguous", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("pick");
    assert!(code.contains(&0xAA), "expected TABLESWITCH for a shuffled-but-contiguous key run, got {code:02x?}");
    assert!(!code.contains(&0xAB));
}

/// The density counterpart: keys spread `1000` apart plus a small random
/// jitter are sparse by construction regardless of the jitter drawn, so
/// `LOOKUPSWITCH` is always selected.
#[test]
fn random_widely_spaced_keys_emit_lookupswitch() {
    let mut rng = StdRng::seed_from_u64(0xC1A5_5EED);
    let clauses: Vec<SwitchClause> = (0..20)
        .map(|i| {
            let jitter: i32 = rng.random_range(0..5);
            let k = i * 1000 + jitter;
            SwitchClause {
                keys: vec![k],
                guard: None,
                body: Expr::new(ExprKind::Return(Some(Box::new(int_literal(k)))), ReturnType::Void, Context::expression().returning()),
            }
        })
        .collect();
    let body = Expr::new(
        ExprKind::Switch {
            test: Box::new(local(0, PrimitiveType::Int)),
            clauses,
            default: Some(Box::new(Expr::new(
                ExprKind::Return(Some(Box::new(int_literal(0)))),
                ReturnType::Void,
                Context::expression().returning(),
            ))),
        },
        ReturnType::Void,
        Context::statement(),
    );
    let method = plain_method(
        "pick",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![param("k", PrimitiveType::Int, 0)],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("ScenarioRandomSparse", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("pick");
    assert!(code.contains(&0xAB), "expected LOOKUPSWITCH for widely-spaced keys, got {code:02x?}");
    assert!(!code.contains(&0xAA));
}

/// S3 — `int g() { try { return 1; } finally { return 2; } }`: the
/// `finally`'s own return is the one the emitter actually lowers to an
/// `IRETURN`; regardless of what the try body leaves on the stack, the
/// finally block's `ICONST_2; IRETURN` always runs before the method can
/// exit the try construct.
#[test]
fn s3_finally_return_wins() {
    let try_body = int_literal(1);
    let finally_block = Expr::new(
        ExprKind::Return(Some(Box::new(int_literal(2)))),
        ReturnType::Void,
        Context::expression().returning(),
    );
    let body = Expr::new(
        ExprKind::Try {
            body: Box::new(try_body),
            catches: vec![],
            finally_block: Some(Box::new(finally_block)),
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    );
    let method = plain_method(
        "g",
        AccessSet::from([AccessFlag::Public]),
        vec![],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("Scenario3", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("g");
    // ICONST_1 (0x04), ICONST_2 (0x05), IRETURN (0xAC) must all appear, and
    // the finally's ICONST_2/IRETURN pair must immediately follow the body.
    let iconst2_ireturn = code.windows(2).any(|w| w == [0x05, 0xAC]);
    assert!(iconst2_ireturn, "finally's ICONST_2;IRETURN must appear back-to-back: {code:02x?}");
}

fn local_ref(slot: u16, class_name: &str) -> Expr {
    Expr::new(
        ExprKind::Local { slot },
        ReturnType::Some(FieldType::Object(ClassReference::new(class_name))),
        Context::expression(),
    )
}

fn string_equals_call(literal: &str) -> Expr {
    Expr::new(
        ExprKind::MethodInvocation {
            target: Some(Box::new(local_ref(0, "java/lang/String"))),
            kind: InvokeKind::Virtual,
            method: MethodRef {
                owner: ClassReference::new("java/lang/String"),
                name: "equals".to_string(),
                descriptor: MethodDescriptor::new(
                    vec![FieldType::Object(ClassReference::new("java/lang/Object"))],
                    ReturnType::Some(FieldType::Base(PrimitiveType::Boolean)),
                ),
            },
            args: vec![Expr::new(
                ExprKind::Literal(ConstantValue::String(literal.to_string())),
                ReturnType::Some(FieldType::Object(ClassReference::new("java/lang/String"))),
                Context::expression(),
            )],
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Boolean)),
        Context::expression(),
    )
}

/// S4 — a string switch arrives pre-rewritten by the parser as a
/// `hashCode()`-keyed `switch` with an `equals` guard on each clause
/// (disambiguating hash collisions):
/// ```text
/// switch (s) {
///     case "foo": return 1;
///     case "bar": return 2;
///     default: return 0;
/// }
/// ```
#[test]
fn s4_string_switch_via_hashcode_and_guards() {
    let test = Expr::new(
        ExprKind::MethodInvocation {
            target: Some(Box::new(local_ref(0, "java/lang/String"))),
            kind: InvokeKind::Virtual,
            method: MethodRef {
                owner: ClassReference::new("java/lang/String"),
                name: "hashCode".to_string(),
                descriptor: MethodDescriptor::new(vec![], ReturnType::Some(FieldType::Base(PrimitiveType::Int))),
            },
            args: vec![],
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    );

    let clauses = vec![
        SwitchClause {
            keys: vec![3143], // "foo".hashCode()
            guard: Some(string_equals_call("foo")),
            body: Expr::new(ExprKind::Return(Some(Box::new(int_literal(1)))), ReturnType::Void, Context::expression().returning()),
        },
        SwitchClause {
            keys: vec![97299], // "bar".hashCode()
            guard: Some(string_equals_call("bar")),
            body: Expr::new(ExprKind::Return(Some(Box::new(int_literal(2)))), ReturnType::Void, Context::expression().returning()),
        },
    ];

    let body = Expr::new(
        ExprKind::Switch {
            test: Box::new(test),
            clauses,
            default: Some(Box::new(Expr::new(
                ExprKind::Return(Some(Box::new(int_literal(0)))),
                ReturnType::Void,
                Context::expression().returning(),
            ))),
        },
        ReturnType::Void,
        Context::statement(),
    );

    let method = plain_method(
        "classify",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![Parameter {
            name: "s".to_string(),
            param_type: FieldType::Object(ClassReference::new("java/lang/String")),
            access: AccessSet::new(),
            annotations: vec![],
            slot: 0,
        }],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        body,
    );
    let class = wrap_class("Scenario4", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("classify");
    assert!(code.contains(&0xAB), "non-contiguous hash keys must emit LOOKUPSWITCH: {code:02x?}");
    assert!(!code.contains(&0xAA));
    let invokevirtual_count = code.iter().filter(|&&b| b == 0xB6).count();
    assert_eq!(invokevirtual_count, 3, "hashCode() plus one equals() guard per clause: {code:02x?}");
}

/// S6 — `((Integer) 42).intValue()`: boxing lowers to `Integer.valueOf`,
/// unboxing to `.intValue()`.
#[test]
fn s6_boxing_round_trip() {
    let boxed = Expr::new(
        ExprKind::Boxing {
            source: Box::new(int_literal(42)),
        },
        ReturnType::Some(FieldType::Object(ClassReference::new("java/lang/Integer"))),
        Context::expression(),
    );
    let unboxed = Expr::new(
        ExprKind::Unboxing {
            source: Box::new(boxed),
            target: PrimitiveType::Int,
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    );
    let method = plain_method(
        "roundTrip",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![],
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        unboxed,
    );
    let class = wrap_class("Scenario6", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, _max_locals) = reader.method_code("roundTrip");
    // BIPUSH 42; INVOKESTATIC valueOf; INVOKEVIRTUAL intValue; IRETURN.
    assert_eq!(code[0], 0x10); // BIPUSH
    assert_eq!(code[1], 42);
    assert_eq!(code[2], 0xB8); // INVOKESTATIC
    assert_eq!(code[5], 0xB6); // INVOKEVIRTUAL
    assert_eq!(*code.last().unwrap(), 0xAC); // IRETURN
}

/// A wide (`long`) local occupies *two* physical JVM slots; `max_locals`
/// must count both, not just the slot the value is stored at.
/// `static long f() { long x = 5L; return x; }`.
#[test]
fn wide_local_occupies_two_physical_slots() {
    let body = Expr::new(
        ExprKind::Let {
            bindings: vec![LetBinding {
                slot: 0,
                name: "x".to_string(),
                var_type: FieldType::Base(PrimitiveType::Long),
                init: Expr::new(
                    ExprKind::Literal(ConstantValue::Long(5)),
                    ReturnType::Some(FieldType::Base(PrimitiveType::Long)),
                    Context::expression(),
                ),
            }],
            body: Box::new(local(0, PrimitiveType::Long)),
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Long)),
        Context::expression(),
    );
    let method = plain_method(
        "f",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![],
        ReturnType::Some(FieldType::Base(PrimitiveType::Long)),
        body,
    );
    let class = wrap_class("ScenarioWideLocal", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, _max_stack, max_locals) = reader.method_code("f");
    assert_eq!(max_locals, 2, "a long at slot 0 needs slots 0-1: {code:02x?}");
    assert!(code.contains(&0x3F), "expected LSTORE_0: {code:02x?}");
    assert_eq!(*code.last().unwrap(), 0xAD, "expected LRETURN: {code:02x?}");
}

/// A category-2 (`long`) value assigned in non-statement context is
/// duplicated with `DUP2`, which on a stack holding a single wide entry must
/// duplicate that one entry, not a no-op pair of category-1 entries.
/// `static long g() { long y; return (y = 5L); }` — the assignment's own
/// value is consumed by the `return`, so `DUP2` must leave a second copy of
/// the long on the stack for the method's `LRETURN`.
#[test]
fn dup2_duplicates_a_single_wide_entry() {
    let body = Expr::new(
        ExprKind::Assignment {
            slot: 0,
            value: Box::new(Expr::new(
                ExprKind::Literal(ConstantValue::Long(5)),
                ReturnType::Some(FieldType::Base(PrimitiveType::Long)),
                Context::expression(),
            )),
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Long)),
        Context::expression(),
    );
    let method = plain_method(
        "g",
        AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        vec![],
        ReturnType::Some(FieldType::Base(PrimitiveType::Long)),
        body,
    );
    let class = wrap_class("ScenarioDup2Wide", vec![method]);
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("emits");

    let mut reader = ClassFile::parse(&bytes);
    let (code, max_stack, max_locals) = reader.method_code("g");
    assert_eq!(max_locals, 2, "a long at slot 0 needs slots 0-1: {code:02x?}");
    assert_eq!(max_stack, 4, "LDC2_W pushes 2 words, DUP2 of the wide value pushes 2 more: {code:02x?}");
    assert!(code.contains(&0x5C), "expected DUP2: {code:02x?}");
    assert_eq!(*code.last().unwrap(), 0xAD, "expected LRETURN: {code:02x?}");
}

#[allow(dead_code)]
fn unused_method_ref_shape_check(owner: ClassReference, name: &str, descriptor: MethodDescriptor) -> MethodRef {
    // Keeps `MethodRef`/`InvokeKind`/`CompareOp` imports exercised without an
    // extra scenario; `cargo test` compiles this even though it's never run.
    let _ = InvokeKind::Virtual;
    let _ = CompareOp::Eq;
    MethodRef {
        owner,
        name: name.to_string(),
        descriptor,
    }
}
