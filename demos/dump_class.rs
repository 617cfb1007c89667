//! Hand-built-AST demo: emits a tiny class with one static method and
//! writes the resulting `.class` file to the path given on the command
//! line (defaults to `Demo.class` in the current directory).
//!
//! There is no parser in this crate, so the `ClassNode` below plays the
//! role a real frontend would: `Demo.add(int, int)` returning `a + b`.

use classgen::ast::expr::{ArithOp, Context, Expr, ExprKind};
use classgen::ast::{ClassNode, MethodFlags, MethodNode, Parameter};
use classgen::config::EmitConfig;
use classgen::types::access::{AccessFlag, AccessSet};
use classgen::types::{FieldType, PrimitiveType, ReturnType};

fn local(slot: u16) -> Expr {
    Expr::new(
        ExprKind::Local { slot },
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    )
}

fn param(name: &str, slot: u16) -> Parameter {
    Parameter {
        name: name.to_string(),
        param_type: FieldType::Base(PrimitiveType::Int),
        access: AccessSet::new(),
        annotations: vec![],
        slot,
    }
}

fn add_method() -> MethodNode {
    // The top-level body context is overwritten by `emit_class` itself
    // (it always lowers the body in `return`/`tail` position per the
    // method's declared return type), so the context set here is just a
    // placeholder -- see S1 in `tests/scenarios.rs` for the same shape.
    let body = Expr::new(
        ExprKind::Arith {
            op: ArithOp::Add,
            lhs: Box::new(local(0)),
            rhs: Box::new(local(1)),
        },
        ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        Context::expression(),
    );
    MethodNode {
        access: AccessSet::from([AccessFlag::Public, AccessFlag::Static]),
        name: "add".to_string(),
        return_type: ReturnType::Some(FieldType::Base(PrimitiveType::Int)),
        parameters: vec![param("a", 0), param("b", 1)],
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

fn demo_class() -> ClassNode {
    let mut class = ClassNode::new("Demo", AccessSet::from([AccessFlag::Public]));
    class.source_file = Some("Demo.java".to_string());
    class.methods.push(add_method());
    class
}

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "Demo.class".to_string());
    let class = demo_class();
    let bytes = classgen::emit_class(&class, EmitConfig::new()).expect("demo class is well-formed");
    std::fs::write(&path, bytes).expect("failed to write class file");
    println!("wrote {path}");
}
