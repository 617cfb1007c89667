//! Expression nodes.

use crate::types::{ClassReference, FieldType, MethodDescriptor, PrimitiveType, ReturnType};

/// Where an expression's value disposition falls. At most one of `Statement`
/// or `Expression` is ever meaningful for a given node; this enum makes that
/// mutual exclusion structural instead of two independent booleans.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Disposition {
    /// The value produced, if any, is discarded.
    Statement,
    /// The value produced is consumed by an enclosing expression.
    Expression,
}

/// The context bitset attached to every node.
///
/// `return` and `tail` are orthogonal to `disposition`: a node can be in
/// return position and tail position regardless of whether its own value
/// is discarded or consumed.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Value disposition: is the result discarded or consumed?
    pub disposition: Disposition,
    /// At function return position: emit a return opcode after the value.
    pub is_return: bool,
    /// In tail position within the enclosing structured construct.
    pub is_tail: bool,
}

impl Context {
    /// A plain statement context: value discarded, no return, not tail.
    #[must_use]
    pub const fn statement() -> Self {
        Context {
            disposition: Disposition::Statement,
            is_return: false,
            is_tail: false,
        }
    }

    /// A plain expression context: value consumed, no return, not tail.
    #[must_use]
    pub const fn expression() -> Self {
        Context {
            disposition: Disposition::Expression,
            is_return: false,
            is_tail: false,
        }
    }

    /// This context with `is_return` set.
    #[must_use]
    pub const fn returning(mut self) -> Self {
        self.is_return = true;
        self
    }

    /// This context with `is_tail` set.
    #[must_use]
    pub const fn tail(mut self) -> Self {
        self.is_tail = true;
        self
    }

    /// Whether the value produced, if any, is discarded.
    #[must_use]
    pub const fn is_statement(&self) -> bool {
        matches!(self.disposition, Disposition::Statement)
    }
}

/// A literal constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// A `boolean`, `byte`, `char`, `short`, or `int` value, carried at full
    /// `int` width; the emitter narrows per the node's declared type.
    Int(i32),
    /// A `long` value.
    Long(i64),
    /// A `float` value.
    Float(f32),
    /// A `double` value.
    Double(f64),
    /// A `String` constant.
    String(String),
    /// A class literal, e.g. `String.class`.
    Class(ClassReference),
    /// A primitive-type class literal, e.g. `int.class`, which lowers to
    /// `GETSTATIC java/lang/Integer.TYPE Ljava/lang/Class;`.
    PrimitiveClass(PrimitiveType),
}

/// Arithmetic operators: `add`, `sub`, `mul`, `div`, `rem`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Bitwise operators: `and`, `or`, `xor`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
}

/// Shift operators: `<<`, `>>`, `>>>`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ShiftOp {
    Shl,
    Shr,
    UShr,
}

/// A relational operator used by both binary and zero/null comparisons
///.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    /// The complementary relation, used by the conditional emitter to
    /// branch "if the condition is false" and by `not` of a comparison.
    #[must_use]
    pub const fn negated(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Ge => CompareOp::Lt,
        }
    }
}

/// How a [`ExprKind::MethodInvocation`] resolves to an `INVOKE*` opcode
///.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InvokeKind {
    /// `INVOKESTATIC`.
    Static,
    /// `INVOKEVIRTUAL`.
    Virtual,
    /// `INVOKEINTERFACE`, for methods declared on an interface.
    Interface,
    /// `INVOKESPECIAL`, for private methods and `super.foo()` calls.
    Special,
}

/// A reference to a field, fully resolved by the external typer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub owner: ClassReference,
    pub name: String,
    pub descriptor: FieldType,
}

/// A reference to a method, fully resolved by the external typer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub owner: ClassReference,
    pub name: String,
    pub descriptor: MethodDescriptor,
}

/// One binding introduced by a [`ExprKind::Let`].
#[derive(Debug, Clone)]
pub struct LetBinding {
    /// The local variable slot assigned by the parser.
    pub slot: u16,
    /// The source name, used for local variable debug entries.
    pub name: String,
    /// The declared type of the local.
    pub var_type: FieldType,
    /// The initializer expression.
    pub init: Expr,
}

/// One `case` clause of a [`ExprKind::Switch`].
///
/// Keys are always integers: a string switch arrives pre-rewritten by the
/// parser to a `hashCode()` dispatch with per-clause equality guards, so this AST never needs a string-keyed variant.
#[derive(Debug, Clone)]
pub struct SwitchClause {
    /// The integer key(s) that select this clause. Multiple keys sharing a
    /// label are modeled as multiple entries with the same `body`/`guard`
    ///.
    pub keys: Vec<i32>,
    /// An optional equality guard (used to disambiguate hash collisions in
    /// a rewritten string switch).
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// One `catch` clause of a [`ExprKind::Try`].
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// The declared exception type.
    pub exception_type: ClassReference,
    /// The local slot the caught exception is stored into.
    pub local_slot: u16,
    /// The name of that local, for debug entries.
    pub local_name: String,
    pub body: Expr,
}

/// A 1-D array element initializer list, for [`ExprKind::NewArray`].
pub type ArrayInitializer = Vec<Expr>;

/// An expression node: a `kind` tag, the static [`ReturnType`] the node
/// evaluates to (`Void` for nodes with no value, e.g. a bare `continue`),
/// the [`Context`] it was emitted in, and an optional source line.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: ReturnType,
    pub context: Context,
    pub line: Option<u32>,
}

impl Expr {
    /// Wraps a kind with the given type and context, no line information.
    #[must_use]
    pub fn new(kind: ExprKind, ty: ReturnType, context: Context) -> Self {
        Expr {
            kind,
            ty,
            context,
            line: None,
        }
    }

    /// Attaches a source line number.
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// The JVM operand category this node contributes to the stack when
    /// emitted in `Expression` disposition; `None` for `void`.
    #[must_use]
    pub fn category(&self) -> Option<crate::types::Category> {
        self.ty.category()
    }
}

/// The tagged variant at the heart of the AST.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Evaluate each child in order; value/disposition follows the last.
    Do(Vec<Expr>),
    /// The `null` reference literal.
    Null,
    /// A constant value.
    Literal(ConstantValue),
    /// Load from a local variable slot.
    Local { slot: u16 },
    /// Load `this` typed as the declared parent type (`slot 0`).
    Super,
    /// Evaluate `value`, optionally duplicate it, then store into `slot`.
    Assignment { slot: u16, value: Box<Expr> },
    /// `IINC slot, by`; if consumed, loads the post-increment value.
    Increment { slot: u16, by: i32 },
    /// A binary arithmetic operation.
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Unary negation.
    Neg(Box<Expr>),
    /// A binary bitwise operation.
    Bitwise {
        op: BitwiseOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A binary shift operation.
    Shift {
        op: ShiftOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A relational comparison between two operands. Reachable only through
    /// the conditional emitter.
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A comparison against an implicit zero (numeric operand) or `null`
    /// (reference operand). Reachable only through the conditional emitter.
    CompareZero { op: CompareOp, operand: Box<Expr> },
    /// Short-circuit logical AND. Reachable only through the conditional
    /// emitter.
    And(Vec<Expr>),
    /// Short-circuit logical OR. Reachable only through the conditional
    /// emitter.
    Or(Vec<Expr>),
    /// Logical negation. Reachable only through the conditional emitter.
    Not(Box<Expr>),
    /// A primitive conversion that only ever widens (e.g. `int` to `long`).
    WideningPrimitive { source: Box<Expr>, target: PrimitiveType },
    /// A primitive conversion that narrows (e.g. `int` to `byte`).
    NarrowingPrimitive { source: Box<Expr>, target: PrimitiveType },
    /// Autoboxing: rewritten by the emitter to `valueOf`.
    Boxing { source: Box<Expr> },
    /// Auto-unboxing: rewritten by the emitter to `<primitive>Value`.
    Unboxing { source: Box<Expr>, target: PrimitiveType },
    /// A reference widening (upcast); emits `source` with no opcode.
    WideningReference(Box<Expr>),
    /// A reference narrowing (downcast); emits `source` then `CHECKCAST`.
    NarrowingReference { source: Box<Expr>, target: ClassReference },
    /// `instanceof`.
    InstanceOf { source: Box<Expr>, target: ClassReference },
    /// A scoped sequence of local bindings followed by a body.
    Let { bindings: Vec<LetBinding>, body: Box<Expr> },
    /// A labeled statement, establishing a break target under `label`.
    Labeled { label: String, target: Box<Expr> },
    /// `if`/`else`.
    If {
        test: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// `switch`.
    Switch {
        test: Box<Expr>,
        clauses: Vec<SwitchClause>,
        default: Option<Box<Expr>>,
    },
    /// `while`.
    While {
        label: Option<String>,
        test: Box<Expr>,
        body: Box<Expr>,
    },
    /// `for`, with an explicit per-iteration step (any prior `init` clause
    /// is modeled as an enclosing [`ExprKind::Let`]).
    For {
        label: Option<String>,
        test: Box<Expr>,
        step: Box<Expr>,
        body: Box<Expr>,
    },
    /// Structured exception handling.
    Try {
        body: Box<Expr>,
        catches: Vec<CatchClause>,
        finally_block: Option<Box<Expr>>,
    },
    /// `continue`, optionally to a named enclosing loop.
    Continue(Option<String>),
    /// `break`, optionally to a named enclosing loop or labeled statement.
    Break(Option<String>),
    /// `return`, with a value unless the enclosing method is `void`.
    Return(Option<Box<Expr>>),
    /// `throw`.
    Throw(Box<Expr>),
    /// `new Class(args...)`.
    New {
        class: ClassReference,
        descriptor: MethodDescriptor,
        args: Vec<Expr>,
    },
    /// An explicit `super(...)`/`this(...)` constructor delegation.
    CtorInvocation {
        class: ClassReference,
        descriptor: MethodDescriptor,
        args: Vec<Expr>,
    },
    /// Instance or static field read.
    FieldAccess { target: Option<Box<Expr>>, field: FieldRef },
    /// Instance or static field write.
    FieldUpdate {
        target: Option<Box<Expr>>,
        field: FieldRef,
        value: Box<Expr>,
    },
    /// A method call.
    MethodInvocation {
        target: Option<Box<Expr>>,
        kind: InvokeKind,
        method: MethodRef,
        args: Vec<Expr>,
    },
    /// Array allocation: 1-D primitive/reference, or multi-dimensional.
    NewArray {
        element_type: FieldType,
        dimensions: Vec<Expr>,
        initializer: Option<ArrayInitializer>,
    },
    /// `array.length`.
    ArrayLength(Box<Expr>),
    /// Array element read.
    ArrayAccess { array: Box<Expr>, index: Box<Expr> },
    /// Array element write.
    ArrayUpdate {
        array: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn negated_comparison_is_involutive() {
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::Le,
            CompareOp::Ge,
        ] {
            assert_eq!(op.negated().negated(), op);
        }
    }

    #[test]
    fn context_builders_are_orthogonal() {
        let ctx = Context::expression().returning().tail();
        assert!(!ctx.is_statement());
        assert!(ctx.is_return);
        assert!(ctx.is_tail);
    }
}
