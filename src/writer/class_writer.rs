//! The class writer facade proper: assembles the `ClassFile` structure
//! (JVM Spec §4.1) from fields, methods, and attributes declared against it.
//!
//! Every `add_*`/`declare_*` call mutates the shared [`ConstantPool`]; by
//! the time [`ClassWriter::finish`] runs, every index it needs has already
//! been interned, so serialization is a single linear pass with no second
//! lookup phase.

use crate::ast::annotation::{Annotation, ParameterAnnotations, Retention};
use crate::ast::expr::ConstantValue;
use crate::types::{ClassReference, PrimitiveType};
use crate::writer::annotations::{
    write_annotations_attribute_body, write_parameter_annotations_attribute_body,
};
use crate::writer::byte_vec::ByteVec;
use crate::writer::constant_pool::ConstantPool;
use crate::writer::frame::write_stack_map_table;
use crate::writer::method_writer::MethodWriter;
use crate::EmitError;

/// Major class file version this crate emits: Java SE 8.
const MAJOR_VERSION: u16 = 52;
const MINOR_VERSION: u16 = 0;

/// One resolved `attribute_info`: a name already interned in the pool, and
/// its already-serialized body.
type ResolvedAttribute = (u16, Vec<u8>);

struct FieldInfo {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<ResolvedAttribute>,
}

struct MethodInfo {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<ResolvedAttribute>,
}

/// Builds one `ClassFile`. Construct with [`ClassWriter::begin_class`],
/// declare fields and methods, then call [`ClassWriter::finish`] for the
/// byte snapshot.
pub struct ClassWriter {
    pool: ConstantPool,
    access_flags: u16,
    this_class: String,
    super_class: String,
    interfaces: Vec<String>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    class_attributes: Vec<ResolvedAttribute>,
}

impl ClassWriter {
    /// Begins a class. `access_flags` is the caller's already-combined
    /// bitmask.
    #[must_use]
    pub fn begin_class(
        access_flags: u16,
        this_class: impl Into<String>,
        super_class: impl Into<String>,
        interfaces: Vec<String>,
    ) -> Self {
        ClassWriter {
            pool: ConstantPool::new(),
            access_flags,
            this_class: this_class.into(),
            super_class: super_class.into(),
            interfaces,
            fields: Vec::new(),
            methods: Vec::new(),
            class_attributes: Vec::new(),
        }
    }

    /// Allocates a fresh [`MethodWriter`] for a method body. The caller
    /// drives it, then passes it to [`ClassWriter::declare_method`] once the
    /// body has been fully emitted.
    #[must_use]
    pub fn new_method_writer(
        &mut self,
        initial_locals: Vec<crate::writer::frame::VerificationTypeInfo>,
        debug: bool,
    ) -> MethodWriter {
        MethodWriter::new(initial_locals, debug)
    }

    /// Records the `SourceFile` attribute.
    pub fn set_source_file(&mut self, name: &str) {
        let attr = self.simple_attribute("SourceFile", |out, pool| {
            out.push_u16(pool.add_utf8(name));
        });
        self.class_attributes.push(attr);
    }

    /// Records the class-level `RuntimeVisibleAnnotations`/
    /// `RuntimeInvisibleAnnotations` attributes.
    pub fn set_class_annotations(&mut self, annotations: &[Annotation]) {
        self.add_annotation_attributes(annotations);
    }

    fn add_annotation_attributes(&mut self, annotations: &[Annotation]) {
        for (retention, attr_name) in [
            (Retention::Runtime, "RuntimeVisibleAnnotations"),
            (Retention::Class, "RuntimeInvisibleAnnotations"),
        ] {
            if annotations.iter().any(|a| a.retention == retention) {
                let attr = self.simple_attribute(attr_name, |out, pool| {
                    write_annotations_attribute_body(annotations, retention, out, pool);
                });
                self.class_attributes.push(attr);
            }
        }
    }

    /// Declares a field: access, munged name, descriptor, an
    /// optional coerced `ConstantValue` attribute, and field annotations.
    pub fn declare_field(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        constant_value: Option<(&ConstantValue, Option<PrimitiveType>)>,
        annotations: &[Annotation],
    ) -> Result<(), EmitError> {
        let name_index = self.pool.add_utf8(name);
        let descriptor_index = self.pool.add_utf8(descriptor);
        let mut attributes = Vec::new();

        if let Some((value, primitive)) = constant_value {
            let body_index = constant_value_pool_index(&mut self.pool, value, primitive)?;
            let name_index = self.pool.add_utf8("ConstantValue");
            let mut body = ByteVec::new();
            body.push_u16(body_index);
            attributes.push((name_index, body.into_vec()));
        }

        attributes.extend(self.annotation_attributes_for(annotations));

        self.fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
        Ok(())
    }

    /// Declares a method: access, name (already the
    /// munged/fixed `<init>`/`<clinit>`/method name), descriptor, thrown
    /// exceptions, optional `Code` (absent for `abstract`/`native`
    /// methods), method and parameter annotations.
    #[allow(clippy::too_many_arguments)]
    pub fn declare_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        thrown_exceptions: &[ClassReference],
        body: Option<MethodWriter>,
        annotations: &[Annotation],
        parameter_annotations_visible: &ParameterAnnotations,
        parameter_annotations_invisible: &ParameterAnnotations,
        num_parameters: u16,
    ) -> Result<(), EmitError> {
        let name_index = self.pool.add_utf8(name);
        let descriptor_index = self.pool.add_utf8(descriptor);
        let mut attributes = Vec::new();

        if let Some(writer) = body {
            let code = writer.finish(&mut self.pool)?;
            let code_attr_name = self.pool.add_utf8("Code");
            let mut body_bytes = ByteVec::new();
            body_bytes.push_u16(code.max_stack);
            body_bytes.push_u16(code.max_locals);
            body_bytes.push_u32(code.code.len() as u32);
            body_bytes.push_bytes(&code.code);
            body_bytes.push_u16(code.exception_table.len() as u16);
            for handler in &code.exception_table {
                body_bytes.push_u16(handler.start_pc);
                body_bytes.push_u16(handler.end_pc);
                body_bytes.push_u16(handler.handler_pc);
                body_bytes.push_u16(match &handler.catch_type {
                    Some(class) => self.pool.add_class(&class.internal_name),
                    None => 0,
                });
            }

            let mut code_attrs: Vec<ResolvedAttribute> = Vec::new();
            if !code.line_number_table.is_empty() {
                let attr_name = self.pool.add_utf8("LineNumberTable");
                let mut attr_body = ByteVec::new();
                attr_body.push_u16(code.line_number_table.len() as u16);
                for (pc, line) in &code.line_number_table {
                    attr_body.push_u16(*pc);
                    attr_body.push_u16(*line as u16);
                }
                code_attrs.push((attr_name, attr_body.into_vec()));
            }
            if !code.local_variable_table.is_empty() {
                let attr_name = self.pool.add_utf8("LocalVariableTable");
                let mut attr_body = ByteVec::new();
                attr_body.push_u16(code.local_variable_table.len() as u16);
                for entry in &code.local_variable_table {
                    attr_body.push_u16(entry.start_pc);
                    attr_body.push_u16(entry.end_pc - entry.start_pc);
                    attr_body.push_u16(self.pool.add_utf8(&entry.name));
                    attr_body.push_u16(self.pool.add_utf8(&entry.descriptor.descriptor_string()));
                    attr_body.push_u16(entry.slot);
                }
                code_attrs.push((attr_name, attr_body.into_vec()));
            }
            if !code.stack_map_frames.is_empty() {
                let attr_name = self.pool.add_utf8("StackMapTable");
                let mut attr_body = ByteVec::new();
                write_stack_map_table(&code.stack_map_frames, &mut attr_body, &mut self.pool);
                code_attrs.push((attr_name, attr_body.into_vec()));
            }

            body_bytes.push_u16(code_attrs.len() as u16);
            for (attr_name, attr_body) in &code_attrs {
                body_bytes.push_u16(*attr_name);
                body_bytes.push_u32(attr_body.len() as u32);
                body_bytes.push_bytes(attr_body);
            }

            attributes.push((code_attr_name, body_bytes.into_vec()));
        }

        if !thrown_exceptions.is_empty() {
            let attr_name = self.pool.add_utf8("Exceptions");
            let mut body = ByteVec::new();
            body.push_u16(thrown_exceptions.len() as u16);
            for exc in thrown_exceptions {
                body.push_u16(self.pool.add_class(&exc.internal_name));
            }
            attributes.push((attr_name, body.into_vec()));
        }

        attributes.extend(self.annotation_attributes_for(annotations));
        attributes.extend(self.parameter_annotation_attributes_for(
            parameter_annotations_visible,
            parameter_annotations_invisible,
            num_parameters,
        ));

        self.methods.push(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
        Ok(())
    }

    fn annotation_attributes_for(&mut self, annotations: &[Annotation]) -> Vec<ResolvedAttribute> {
        let mut out = Vec::new();
        for (retention, attr_name) in [
            (Retention::Runtime, "RuntimeVisibleAnnotations"),
            (Retention::Class, "RuntimeInvisibleAnnotations"),
        ] {
            if annotations.iter().any(|a| a.retention == retention) {
                out.push(self.simple_attribute(attr_name, |body, pool| {
                    write_annotations_attribute_body(annotations, retention, body, pool);
                }));
            }
        }
        out
    }

    fn parameter_annotation_attributes_for(
        &mut self,
        visible: &ParameterAnnotations,
        invisible: &ParameterAnnotations,
        num_parameters: u16,
    ) -> Vec<ResolvedAttribute> {
        let mut out = Vec::new();
        if !visible.is_empty() {
            out.push(self.simple_attribute("RuntimeVisibleParameterAnnotations", |body, pool| {
                write_parameter_annotations_attribute_body(
                    visible,
                    num_parameters,
                    Retention::Runtime,
                    body,
                    pool,
                );
            }));
        }
        if !invisible.is_empty() {
            out.push(self.simple_attribute(
                "RuntimeInvisibleParameterAnnotations",
                |body, pool| {
                    write_parameter_annotations_attribute_body(
                        invisible,
                        num_parameters,
                        Retention::Class,
                        body,
                        pool,
                    );
                },
            ));
        }
        out
    }

    /// Builds one resolved attribute: interns `name`, runs `write_body`
    /// against a scratch buffer, and returns `(name_index, body_bytes)`.
    fn simple_attribute(
        &mut self,
        name: &str,
        write_body: impl FnOnce(&mut ByteVec, &mut ConstantPool),
    ) -> ResolvedAttribute {
        let name_index = self.pool.add_utf8(name);
        let mut body = ByteVec::new();
        write_body(&mut body, &mut self.pool);
        (name_index, body.into_vec())
    }

    /// Serializes the whole `ClassFile` structure.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        let this_class_index = self.pool.add_class(&self.this_class);
        let super_class_index = self.pool.add_class(&self.super_class);
        let interface_indices: Vec<u16> = self
            .interfaces
            .iter()
            .map(|i| self.pool.add_class(i))
            .collect();

        let mut out = ByteVec::new();
        out.push_u32(0xCAFE_BABE);
        out.push_u16(MINOR_VERSION);
        out.push_u16(MAJOR_VERSION);
        out.push_u16(self.pool.count());
        self.pool.write(&mut out);
        out.push_u16(self.access_flags);
        out.push_u16(this_class_index);
        out.push_u16(super_class_index);
        out.push_u16(interface_indices.len() as u16);
        for index in interface_indices {
            out.push_u16(index);
        }

        out.push_u16(self.fields.len() as u16);
        for field in &self.fields {
            out.push_u16(field.access_flags);
            out.push_u16(field.name_index);
            out.push_u16(field.descriptor_index);
            write_attributes(&mut out, &field.attributes);
        }

        out.push_u16(self.methods.len() as u16);
        for method in &self.methods {
            out.push_u16(method.access_flags);
            out.push_u16(method.name_index);
            out.push_u16(method.descriptor_index);
            write_attributes(&mut out, &method.attributes);
        }

        write_attributes(&mut out, &self.class_attributes);

        out.into_vec()
    }
}

fn write_attributes(out: &mut ByteVec, attributes: &[ResolvedAttribute]) {
    out.push_u16(attributes.len() as u16);
    for (name_index, body) in attributes {
        out.push_u16(*name_index);
        out.push_u32(body.len() as u32);
        out.push_bytes(body);
    }
}

/// Interns a field's constant initializer at its declared primitive width
/// and returns the pool index the `ConstantValue`
/// attribute points at.
fn constant_value_pool_index(
    pool: &mut ConstantPool,
    value: &ConstantValue,
    primitive: Option<PrimitiveType>,
) -> Result<u16, EmitError> {
    use PrimitiveType as P;
    Ok(match (value, primitive) {
        (ConstantValue::Int(v), Some(P::Byte)) => pool.add_integer(i32::from(*v as i8)),
        (ConstantValue::Int(v), Some(P::Short)) => pool.add_integer(i32::from(*v as i16)),
        (ConstantValue::Int(v), Some(P::Char)) => pool.add_integer(i32::from(*v as u16)),
        (ConstantValue::Int(v), Some(P::Boolean)) => pool.add_integer(*v & 1),
        (ConstantValue::Int(v), _) => pool.add_integer(*v),
        (ConstantValue::Long(v), _) => pool.add_long(*v),
        (ConstantValue::Float(v), _) => pool.add_float(*v),
        (ConstantValue::Double(v), _) => pool.add_double(*v),
        (ConstantValue::String(s), _) => pool.add_string(s),
        (ConstantValue::Class(_) | ConstantValue::PrimitiveClass(_), _) => {
            return Err(EmitError::InvariantViolation(
                "a field's constant initializer must be a primitive or String value".into(),
            ))
        }
    })
}
