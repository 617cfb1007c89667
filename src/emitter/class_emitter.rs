//! The class emitter: orchestrates the whole `emit_class`
//! pipeline -- fields, then the static initializer, then constructors, then
//! methods -- driving the class writer facade with the expression emitter's
//! output for each method body.

use crate::ast::method::{MethodFlags, MethodNode, Parameter};
use crate::ast::ClassNode;
use crate::config::EmitConfig;
use crate::emitter::ctx::EmitCtx;
use crate::emitter::expr::emit_expr;
use crate::emitter::munge::munge;
use crate::types::access::{class_access_flags, field_access_flags, method_access_flags, AccessFlag, ClassAccessFlags};
use crate::types::{ClassReference, FieldType, MethodDescriptor, ReturnType};
use crate::ast::expr::{Context, Disposition};
use crate::writer::frame::VerificationTypeInfo;
use crate::writer::ClassWriter;
use crate::EmitError;

/// Lowers a fully-resolved [`ClassNode`] to a Java class file (major version
/// 52, `ACC_SUPER` always set).
pub fn emit_class(class: &ClassNode, config: EmitConfig) -> Result<Vec<u8>, EmitError> {
    log::debug!(
        "emitting class {} ({} field(s), {} method(s))",
        class.internal_name,
        class.fields.len(),
        class.methods.len()
    );
    let access_flags = (class_access_flags(&class.access) | ClassAccessFlags::SUPER).bits();
    let interfaces: Vec<String> = class.interfaces.iter().map(|i| i.internal_name.clone()).collect();
    let mut writer = ClassWriter::begin_class(
        access_flags,
        &class.internal_name,
        &class.parent.internal_name,
        interfaces,
    );

    if !class.annotations.is_empty() {
        writer.set_class_annotations(&class.annotations);
    }

    if let Some(source_file) = &class.source_file {
        writer.set_source_file(source_file);
    }

    for field in &class.fields {
        let access_flags = field_access_flags(&field.access).bits();
        let name = munge(&field.name);
        let descriptor = field.field_type.descriptor_string();
        let constant = field.constant_value.as_ref().map(|v| {
            let primitive = match &field.field_type {
                FieldType::Base(p) => Some(*p),
                _ => None,
            };
            (v, primitive)
        });
        writer.declare_field(access_flags, &name, &descriptor, constant, &field.annotations)?;
    }

    if let Some(clinit) = &class.static_initializer {
        emit_method(&mut writer, clinit, class, config)?;
    }
    for ctor in &class.constructors {
        emit_method(&mut writer, ctor, class, config)?;
    }
    for method in &class.methods {
        emit_method(&mut writer, method, class, config)?;
    }

    Ok(writer.finish())
}

/// The fixed name and return type a [`MethodNode`] is emitted with:
/// `<clinit>`/`<init>` bypass the declared name and are always `void`; a
/// plain method uses its own.
fn resolved_name_and_return(method: &MethodNode) -> (&str, ReturnType) {
    match method.flags {
        MethodFlags::StaticInitializer => ("<clinit>", ReturnType::Void),
        MethodFlags::Constructor => ("<init>", ReturnType::Void),
        MethodFlags::Plain => (method.name.as_str(), method.return_type.clone()),
    }
}

fn is_static(method: &MethodNode) -> bool {
    method.flags == MethodFlags::StaticInitializer || method.access.contains(&AccessFlag::Static)
}

/// The verification type a parameter/`this` slot starts a method with,
/// for seeding the frame interpreter's initial locals.
fn verification_type_of(ty: &FieldType) -> VerificationTypeInfo {
    match ty {
        FieldType::Base(crate::types::PrimitiveType::Long) => VerificationTypeInfo::Long,
        FieldType::Base(crate::types::PrimitiveType::Double) => VerificationTypeInfo::Double,
        FieldType::Base(crate::types::PrimitiveType::Float) => VerificationTypeInfo::Float,
        FieldType::Base(_) => VerificationTypeInfo::Integer,
        FieldType::Object(_) | FieldType::Array(_) => {
            VerificationTypeInfo::Object(ClassReference::new(ty.internal_name()))
        }
    }
}

/// Builds the initial locals array (`this` slot if applicable, then each
/// parameter at its assigned slot), category-2 types occupying two
/// verification-type entries.
fn initial_locals(class: &ClassNode, method: &MethodNode, params: &[Parameter]) -> Vec<VerificationTypeInfo> {
    let mut locals = Vec::new();
    if !is_static(method) {
        locals.push(VerificationTypeInfo::Object(ClassReference::new(class.internal_name.clone())));
    }
    for param in params {
        // Slots are assigned by the parser; pad with `Top` if a prior
        // category-2 parameter left a gap (defensive against sparse slot
        // assignment — see `DESIGN.md`).
        if (locals.len() as u16) < param.slot {
            log::trace!(
                "padding locals from slot {} to {} before parameter `{}`",
                locals.len(),
                param.slot,
                param.name
            );
        }
        while (locals.len() as u16) < param.slot {
            locals.push(VerificationTypeInfo::Top);
        }
        locals.push(verification_type_of(&param.param_type));
        if param.param_type.category() == crate::types::Category::Two {
            locals.push(VerificationTypeInfo::Top);
        }
    }
    locals
}

fn descriptor_for(method: &MethodNode, return_type: &ReturnType) -> MethodDescriptor {
    let params = method.parameters.iter().map(|p| p.param_type.clone()).collect();
    MethodDescriptor::new(params, return_type.clone())
}

fn emit_method(
    writer: &mut ClassWriter,
    method: &MethodNode,
    class: &ClassNode,
    config: EmitConfig,
) -> Result<(), EmitError> {
    let (name, return_type) = resolved_name_and_return(method);
    let name = munge(name);
    let descriptor = descriptor_for(method, &return_type);
    let access_flags = method_access_flags(&method.access).bits();

    let body = match &method.body {
        Some(body_expr) => {
            let locals = initial_locals(class, method, &method.parameters);
            let mut method_writer = writer.new_method_writer(locals, config.debug);
            {
                let mut ctx = EmitCtx::new(&mut method_writer, config.debug);
                let param_scope = if ctx.debug {
                    let start = ctx.method.new_label();
                    ctx.method.place_label(start);
                    Some(start)
                } else {
                    None
                };
                let expr = with_return_context(body_expr, &return_type);
                emit_expr(&mut ctx, &expr)?;
                if let Some(start) = param_scope {
                    let end = ctx.method.new_label();
                    ctx.method.place_label(end);
                    for param in &method.parameters {
                        record_param_debug(&mut *ctx.method, param, start, end);
                    }
                }
            }
            Some(method_writer)
        }
        None => None,
    };

    let annotations: Vec<_> = method
        .runtime_visible_annotations
        .iter()
        .chain(&method.runtime_invisible_annotations)
        .cloned()
        .collect();

    writer.declare_method(
        access_flags,
        &name,
        &descriptor.descriptor_string(),
        &method.thrown_exceptions,
        body,
        &annotations,
        &method.runtime_visible_parameter_annotations,
        &method.runtime_invisible_parameter_annotations,
        method.parameters.len() as u16,
    )?;

    Ok(())
}

/// The top-level body expression is always in `return` context: if the
/// declared return type is non-void, also `expression`; a void body is emitted purely
/// for its statement side effects before the implicit `RETURN`.
fn with_return_context(body: &crate::ast::Expr, return_type: &ReturnType) -> crate::ast::Expr {
    let mut expr = body.clone();
    let disposition = match return_type {
        ReturnType::Void => Disposition::Statement,
        ReturnType::Some(_) => Disposition::Expression,
    };
    expr.context = Context {
        disposition,
        is_return: true,
        is_tail: true,
    };
    expr.ty = return_type.clone();
    expr
}

/// Records a `LocalVariableTable` entry for a parameter, scoped to `start`/
/// `end` labels bracketing the whole method body -- parameters are live for
/// its entire extent.
fn record_param_debug(
    method_writer: &mut crate::writer::MethodWriter,
    param: &Parameter,
    start: crate::writer::Label,
    end: crate::writer::Label,
) {
    method_writer.record_local_debug(crate::writer::method_writer::LocalVarDebug {
        name: param.name.clone(),
        descriptor: param.param_type.clone(),
        start,
        end,
        slot: param.slot,
    });
}
