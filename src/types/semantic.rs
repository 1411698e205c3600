//! Semantic type descriptions
//!
//! A `SemanticType` describes the shape of a parameter or return value
//! independently of any Rust type. Structural types carry their own schema so
//! the transcoder never needs reflection.

use std::fmt;

/// Integer kinds with their inclusive ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Inclusive lower bound.
    pub const fn min(self) -> i128 {
        match self {
            Self::I8 => i8::MIN as i128,
            Self::I16 => i16::MIN as i128,
            Self::I32 => i32::MIN as i128,
            Self::I64 => i64::MIN as i128,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 0,
        }
    }

    /// Inclusive upper bound.
    pub const fn max(self) -> i128 {
        match self {
            Self::I8 => i8::MAX as i128,
            Self::I16 => i16::MAX as i128,
            Self::I32 => i32::MAX as i128,
            Self::I64 => i64::MAX as i128,
            Self::U8 => u8::MAX as i128,
            Self::U16 => u16::MAX as i128,
            Self::U32 => u32::MAX as i128,
            Self::U64 => u64::MAX as i128,
        }
    }

    pub const fn contains(self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
        }
    }
}

/// Floating point kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

impl FloatKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

/// A named field of a structural object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSchema {
    pub name: String,
    pub ty: SemanticType,
}

impl FieldSchema {
    /// Fields of an optional type may be omitted by the model.
    pub fn is_optional(&self) -> bool {
        matches!(self.ty, SemanticType::Optional(_))
    }
}

/// Structural description of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Field order is the encoding order.
    pub fn field(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Description of an enumeration with unit variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumSchema {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumSchema {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a candidate to a declared variant: exact match first, then
    /// case-insensitive.
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.as_str() == candidate)
            .or_else(|| {
                self.variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(candidate))
            })
            .map(String::as_str)
    }
}

/// Language-independent type description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Int(IntKind),
    Float(FloatKind),
    Bool,
    Char,
    String,
    /// Calendar date, `yyyy-MM-dd`.
    Date,
    /// Wall clock time, `HH:mm:ss[.fraction]`.
    Time,
    /// Date and time without zone, `yyyy-MM-dd HH:mm:ss[.fraction]`.
    DateTime,
    /// UTC instant, RFC 3339.
    Timestamp,
    /// ISO-8601 duration.
    Duration,
    List(Box<SemanticType>),
    Set(Box<SemanticType>),
    Map(Box<SemanticType>, Box<SemanticType>),
    Optional(Box<SemanticType>),
    Enum(EnumSchema),
    Object(ObjectSchema),
    /// Caller-named type handled by a registered transcoding rule.
    Custom(String),
}

impl SemanticType {
    pub fn list(inner: SemanticType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn set(inner: SemanticType) -> Self {
        Self::Set(Box::new(inner))
    }

    pub fn map(key: SemanticType, value: SemanticType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn optional(inner: SemanticType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Types whose encoding is a single token and can therefore key a map.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Int(_)
                | Self::Bool
                | Self::Char
                | Self::String
                | Self::Date
                | Self::Time
                | Self::DateTime
                | Self::Timestamp
                | Self::Duration
                | Self::Enum(_)
                | Self::Custom(_)
        )
    }

    /// Human readable type name used in prompts and error messages.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(kind) => f.write_str(kind.name()),
            Self::Float(kind) => f.write_str(kind.name()),
            Self::Bool => f.write_str("bool"),
            Self::Char => f.write_str("char"),
            Self::String => f.write_str("String"),
            Self::Date => f.write_str("Date"),
            Self::Time => f.write_str("Time"),
            Self::DateTime => f.write_str("DateTime"),
            Self::Timestamp => f.write_str("Timestamp"),
            Self::Duration => f.write_str("Duration"),
            Self::List(inner) => write!(f, "List<{inner}>"),
            Self::Set(inner) => write!(f, "Set<{inner}>"),
            Self::Map(k, v) => write!(f, "Map<{k}, {v}>"),
            Self::Optional(inner) => write!(f, "Option<{inner}>"),
            Self::Enum(schema) => f.write_str(&schema.name),
            Self::Object(schema) => f.write_str(&schema.name),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_ranges_are_inclusive() {
        assert!(IntKind::U8.contains(255));
        assert!(!IntKind::U8.contains(256));
        assert!(IntKind::I8.contains(-128));
        assert!(!IntKind::U64.contains(-1));
        assert_eq!(IntKind::U64.max(), u64::MAX as i128);
    }

    #[test]
    fn enum_resolution_prefers_exact_match() {
        let schema = EnumSchema::new("Mode", ["On", "ON", "Off"]);
        assert_eq!(schema.resolve("ON"), Some("ON"));
        assert_eq!(schema.resolve("off"), Some("Off"));
        assert_eq!(schema.resolve("maybe"), None);
    }

    #[test]
    fn display_names_nest() {
        let ty = SemanticType::map(
            SemanticType::String,
            SemanticType::list(SemanticType::optional(SemanticType::Int(IntKind::I32))),
        );
        assert_eq!(ty.name(), "Map<String, List<Option<i32>>>");
    }
}
