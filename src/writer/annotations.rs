//! Annotation serialization.
//!
//! Traverses the AST's [`Annotation`]/[`AnnotationValue`] tree recursively:
//! arrays recurse into each element, nested annotations recurse into their
//! own value map, primitives and strings are written directly.
//! `Retention::Source` annotations are dropped by the caller before
//! reaching these functions — only `Class`/`Runtime` retention is ever
//! serialized.

use crate::ast::annotation::{Annotation, AnnotationValue, ParameterAnnotations, Retention};
use crate::writer::byte_vec::ByteVec;
use crate::writer::constant_pool::ConstantPool;

/// Writes the body of a `RuntimeVisibleAnnotations`/`RuntimeInvisibleAnnotations`
/// attribute (`num_annotations` followed by each `annotation` structure),
/// filtering by the given retention.
pub fn write_annotations_attribute_body(
    annotations: &[Annotation],
    retention: Retention,
    out: &mut ByteVec,
    pool: &mut ConstantPool,
) {
    let matching: Vec<&Annotation> = annotations
        .iter()
        .filter(|a| a.retention == retention)
        .collect();
    out.push_u16(matching.len() as u16);
    for annotation in matching {
        write_annotation(annotation, out, pool);
    }
}

/// Writes the body of a `RuntimeVisibleParameterAnnotations`/
/// `RuntimeInvisibleParameterAnnotations` attribute: `num_parameters`
/// followed by, for each parameter index in `0..num_parameters`, its
/// annotations.
pub fn write_parameter_annotations_attribute_body(
    per_parameter: &ParameterAnnotations,
    num_parameters: u16,
    retention: Retention,
    out: &mut ByteVec,
    pool: &mut ConstantPool,
) {
    out.push_u8(num_parameters as u8);
    for index in 0..num_parameters {
        let empty = Vec::new();
        let annotations = per_parameter.get(&index).unwrap_or(&empty);
        write_annotations_attribute_body(annotations, retention, out, pool);
    }
}

fn write_annotation(annotation: &Annotation, out: &mut ByteVec, pool: &mut ConstantPool) {
    let descriptor = format!("L{};", annotation.annotation_type.internal_name);
    out.push_u16(pool.add_utf8(&descriptor));
    out.push_u16(annotation.values.len() as u16);
    for (name, value) in &annotation.values {
        out.push_u16(pool.add_utf8(name));
        write_annotation_value(value, out, pool);
    }
}

fn write_annotation_value(value: &AnnotationValue, out: &mut ByteVec, pool: &mut ConstantPool) {
    match value {
        AnnotationValue::Boolean(b) => {
            out.push_u8(b'Z');
            out.push_u16(pool.add_integer(i32::from(*b)));
        }
        AnnotationValue::Byte(v) => {
            out.push_u8(b'B');
            out.push_u16(pool.add_integer(i32::from(*v)));
        }
        AnnotationValue::Char(v) => {
            out.push_u8(b'C');
            out.push_u16(pool.add_integer(i32::from(*v)));
        }
        AnnotationValue::Short(v) => {
            out.push_u8(b'S');
            out.push_u16(pool.add_integer(i32::from(*v)));
        }
        AnnotationValue::Int(v) => {
            out.push_u8(b'I');
            out.push_u16(pool.add_integer(*v));
        }
        AnnotationValue::Long(v) => {
            out.push_u8(b'J');
            out.push_u16(pool.add_long(*v));
        }
        AnnotationValue::Float(v) => {
            out.push_u8(b'F');
            out.push_u16(pool.add_float(*v));
        }
        AnnotationValue::Double(v) => {
            out.push_u8(b'D');
            out.push_u16(pool.add_double(*v));
        }
        AnnotationValue::String(s) => {
            out.push_u8(b's');
            out.push_u16(pool.add_utf8(s));
        }
        AnnotationValue::Annotation(nested) => {
            out.push_u8(b'@');
            write_annotation(nested, out, pool);
        }
        AnnotationValue::Array(items) => {
            out.push_u8(b'[');
            out.push_u16(items.len() as u16);
            for item in items {
                write_annotation_value(item, out, pool);
            }
        }
    }
}
