//! Method descriptors: parameter and return types.

use std::fmt::Display;
use std::str::FromStr;

use crate::types::field_type::{FieldType, InvalidDescriptor};

/// The descriptor of a method: its parameter types and return type.
/// See the [JVM Specification §4.3.3](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.3.3).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MethodDescriptor {
    /// The types of the parameters, in declaration order.
    pub parameters_types: Vec<FieldType>,
    /// The return type.
    pub return_type: ReturnType,
}

/// The return type of a method: either a [`FieldType`] or `void`.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ReturnType {
    /// The method returns a value of the given type.
    Some(FieldType),
    /// The method returns no value.
    Void,
}

impl ReturnType {
    /// The JVM operand category of this return type, if non-`void`.
    #[must_use]
    pub fn category(&self) -> Option<crate::types::Category> {
        match self {
            ReturnType::Some(t) => Some(t.category()),
            ReturnType::Void => None,
        }
    }

    fn descriptor_string(&self) -> String {
        match self {
            ReturnType::Some(t) => t.descriptor_string(),
            ReturnType::Void => "V".to_owned(),
        }
    }
}

impl Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnType::Some(t) => t.fmt(f),
            ReturnType::Void => write!(f, "void"),
        }
    }
}

impl MethodDescriptor {
    /// Builds a descriptor from parameter types and a return type.
    #[must_use]
    pub fn new(parameters_types: Vec<FieldType>, return_type: ReturnType) -> Self {
        Self {
            parameters_types,
            return_type,
        }
    }

    /// The descriptor string, e.g. `(IJLjava/lang/String;)Z`.
    #[must_use]
    pub fn descriptor_string(&self) -> String {
        let mut result = String::from("(");
        for param in &self.parameters_types {
            result.push_str(&param.descriptor_string());
        }
        result.push(')');
        result.push_str(&self.return_type.descriptor_string());
        result
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor_string())
    }
}

impl FromStr for MethodDescriptor {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let mut chars = descriptor.chars();
        let mut parameters_types = Vec::new();
        let return_type = loop {
            match chars.next() {
                Some('(') => {}
                Some(')') => break FromStr::from_str(chars.as_str())?,
                Some(c) => parameters_types.push(FieldType::parse_single(c, &mut chars)?),
                None => return Err(InvalidDescriptor(descriptor.into())),
            }
        };
        Ok(Self {
            parameters_types,
            return_type,
        })
    }
}

impl FromStr for ReturnType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor == "V" {
            Ok(ReturnType::Void)
        } else {
            FieldType::from_str(descriptor).map(ReturnType::Some)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::field_type::PrimitiveType::*;

    #[test]
    fn single_param() {
        let descriptor: MethodDescriptor = "(I)V".parse().expect("valid descriptor");
        assert_eq!(descriptor.return_type, ReturnType::Void);
        assert_eq!(descriptor.parameters_types, vec![FieldType::Base(Int)]);
    }

    #[test]
    fn param_complex() {
        let descriptor: MethodDescriptor =
            "(I[JLjava/lang/String;J)I".parse().expect("valid descriptor");
        assert_eq!(descriptor.return_type, ReturnType::Some(FieldType::Base(Int)));
        assert_eq!(descriptor.parameters_types.len(), 4);
    }

    #[test]
    fn round_trip_string() {
        let descriptor: MethodDescriptor = "(IJB)Ljava/lang/String;".parse().unwrap();
        assert_eq!(descriptor.descriptor_string(), "(IJB)Ljava/lang/String;");
    }

    #[test]
    fn rejects_garbage() {
        assert!("(I)VJ".parse::<MethodDescriptor>().is_err());
        assert!("(V)V".parse::<MethodDescriptor>().is_err());
    }
}
