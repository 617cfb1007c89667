//! JVM field (i.e. non-method) type descriptors.
//!
//! See the [JVM Specification §4.3.2](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.3.2).

use std::fmt::Display;
use std::str::FromStr;

use crate::types::class::ClassReference;
use crate::types::Category;

/// A JVM primitive type.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveType {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl PrimitiveType {
    /// The single-character descriptor prefix for this primitive, e.g. `I` for `int`.
    #[must_use]
    pub const fn descriptor_char(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Char => 'C',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    /// The JVM operand category of this primitive.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            PrimitiveType::Long | PrimitiveType::Double => Category::Two,
            _ => Category::One,
        }
    }

    /// The internal name of this primitive's boxed wrapper class, e.g.
    /// `java/lang/Integer` for `int`.
    #[must_use]
    pub const fn boxed_class_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java/lang/Boolean",
            PrimitiveType::Byte => "java/lang/Byte",
            PrimitiveType::Char => "java/lang/Character",
            PrimitiveType::Short => "java/lang/Short",
            PrimitiveType::Int => "java/lang/Integer",
            PrimitiveType::Long => "java/lang/Long",
            PrimitiveType::Float => "java/lang/Float",
            PrimitiveType::Double => "java/lang/Double",
        }
    }

    /// The unboxing instance method name, e.g. `intValue` for `int`.
    #[must_use]
    pub const fn unboxing_method_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "booleanValue",
            PrimitiveType::Byte => "byteValue",
            PrimitiveType::Char => "charValue",
            PrimitiveType::Short => "shortValue",
            PrimitiveType::Int => "intValue",
            PrimitiveType::Long => "longValue",
            PrimitiveType::Float => "floatValue",
            PrimitiveType::Double => "doubleValue",
        }
    }
}

impl TryFrom<char> for PrimitiveType {
    type Error = InvalidDescriptor;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'Z' => Ok(PrimitiveType::Boolean),
            'B' => Ok(PrimitiveType::Byte),
            'C' => Ok(PrimitiveType::Char),
            'S' => Ok(PrimitiveType::Short),
            'I' => Ok(PrimitiveType::Int),
            'J' => Ok(PrimitiveType::Long),
            'F' => Ok(PrimitiveType::Float),
            'D' => Ok(PrimitiveType::Double),
            other => Err(InvalidDescriptor(other.to_string())),
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        };
        write!(f, "{name}")
    }
}

/// A JVM field type: a primitive, a class reference, or an array thereof.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum FieldType {
    /// A primitive type.
    Base(PrimitiveType),
    /// A reference to a class or interface.
    Object(ClassReference),
    /// An array with the given element type (one dimension; nest for more).
    Array(Box<FieldType>),
}

impl FieldType {
    /// Wraps this type in one additional array dimension.
    #[must_use]
    pub fn make_array_type(self) -> Self {
        FieldType::Array(Box::new(self))
    }

    /// The number of array dimensions, `0` if this is not an array type.
    #[must_use]
    pub fn dimensions(&self) -> u8 {
        match self {
            FieldType::Array(inner) => 1 + inner.dimensions(),
            _ => 0,
        }
    }

    /// The JVM operand category of this type. All reference types,
    /// including arrays, are category 1.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            FieldType::Base(p) => p.category(),
            FieldType::Object(_) | FieldType::Array(_) => Category::One,
        }
    }

    /// The internal (slash-separated) name of this type. For arrays and
    /// primitives this is the descriptor string itself.
    #[must_use]
    pub fn internal_name(&self) -> String {
        match self {
            FieldType::Object(c) => c.internal_name.clone(),
            FieldType::Base(_) | FieldType::Array(_) => self.descriptor_string(),
        }
    }

    /// The JVM descriptor string of this type, e.g. `I`, `Ljava/lang/String;`, `[[I`.
    #[must_use]
    pub fn descriptor_string(&self) -> String {
        match self {
            FieldType::Base(p) => p.descriptor_char().to_string(),
            FieldType::Object(c) => format!("L{};", c.internal_name),
            FieldType::Array(inner) => format!("[{}", inner.descriptor_string()),
        }
    }

    /// Whether this type is a primitive.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, FieldType::Base(_))
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Base(p) => p.fmt(f),
            FieldType::Object(c) => write!(f, "{}", c.internal_name.replace('/', ".")),
            FieldType::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

impl FieldType {
    pub(crate) fn parse_single(
        prefix: char,
        remaining: &mut std::str::Chars<'_>,
    ) -> Result<Self, InvalidDescriptor> {
        use itertools::Itertools;

        if let Ok(p) = PrimitiveType::try_from(prefix) {
            return Ok(FieldType::Base(p));
        }
        let build_err = |rem: &std::str::Chars<'_>| {
            InvalidDescriptor(format!("{}{}", prefix, rem.as_str()))
        };
        match prefix {
            'L' => {
                let binary_name: String = remaining.take_while_ref(|c| *c != ';').collect();
                match remaining.next() {
                    Some(';') => Ok(FieldType::Object(ClassReference::new(binary_name))),
                    _ => Err(build_err(remaining)),
                }
            }
            '[' => {
                let next_prefix = remaining.next().ok_or_else(|| build_err(remaining))?;
                Self::parse_single(next_prefix, remaining).map(FieldType::make_array_type)
            }
            _ => Err(build_err(remaining)),
        }
    }
}

impl FromStr for FieldType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let mut chars = descriptor.chars();
        let prefix = chars.next().ok_or_else(|| InvalidDescriptor(descriptor.into()))?;
        let result = Self::parse_single(prefix, &mut chars)?;
        if chars.as_str().is_empty() {
            Ok(result)
        } else {
            Err(InvalidDescriptor(descriptor.into()))
        }
    }
}

/// An error indicating that the descriptor string is invalid.
#[derive(Debug, thiserror::Error)]
#[error("Invalid descriptor: {0}")]
pub struct InvalidDescriptor(pub String);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descriptor_string_primitive() {
        assert_eq!(FieldType::Base(PrimitiveType::Int).descriptor_string(), "I");
        assert_eq!(
            FieldType::Base(PrimitiveType::Double).descriptor_string(),
            "D"
        );
    }

    #[test]
    fn descriptor_string_object() {
        let t = FieldType::Object(ClassReference::new("java/lang/String"));
        assert_eq!(t.descriptor_string(), "Ljava/lang/String;");
    }

    #[test]
    fn descriptor_string_array() {
        let t = FieldType::Base(PrimitiveType::Int)
            .make_array_type()
            .make_array_type();
        assert_eq!(t.descriptor_string(), "[[I");
        assert_eq!(t.dimensions(), 2);
    }

    #[test]
    fn category_long_double_are_two() {
        assert_eq!(FieldType::Base(PrimitiveType::Long).category(), Category::Two);
        assert_eq!(FieldType::Base(PrimitiveType::Double).category(), Category::Two);
        assert_eq!(FieldType::Base(PrimitiveType::Int).category(), Category::One);
        assert_eq!(
            FieldType::Object(ClassReference::new("java/lang/Object")).category(),
            Category::One
        );
    }

    #[test]
    fn parse_round_trip() {
        for d in ["I", "[[I", "Ljava/lang/String;", "[Ljava/lang/String;", "Z"] {
            let t: FieldType = d.parse().expect("valid descriptor");
            assert_eq!(t.descriptor_string(), d);
        }
    }

    #[test]
    fn parse_rejects_trailing_garbage() {
        assert!("IJ".parse::<FieldType>().is_err());
    }
}
