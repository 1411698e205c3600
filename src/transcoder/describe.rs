//! Response-format descriptions

use super::Transcoder;
use crate::types::{FloatKind, SemanticType};

impl Transcoder {
    /// Natural-language description of how a value of `ty` must be written.
    pub fn describe(&self, ty: &SemanticType) -> String {
        self.describe_at(ty, 0)
    }

    fn describe_at(&self, ty: &SemanticType, depth: usize) -> String {
        match ty {
            SemanticType::Int(kind) => format!(
                "a number literal ranging from {} to {}, inclusive.",
                kind.min(),
                kind.max()
            ),
            SemanticType::Float(FloatKind::F32) => {
                "a single precision floating point number literal such as 3.14 or -0.5.".into()
            }
            SemanticType::Float(FloatKind::F64) => {
                "a double precision floating point number literal such as 3.14 or -0.5.".into()
            }
            SemanticType::Bool => "either true or false.".into(),
            SemanticType::Char => "a single character.".into(),
            SemanticType::String => "a string of text, written as a JSON string literal.".into(),
            SemanticType::Date => "a date formatted as yyyy-MM-dd.".into(),
            SemanticType::Time => "a time of day formatted as HH:mm:ss[.fraction].".into(),
            SemanticType::DateTime => {
                "a date and time formatted as yyyy-MM-dd HH:mm:ss[.fraction].".into()
            }
            SemanticType::Timestamp => {
                "a UTC timestamp in RFC 3339 format, for example 2024-03-01T10:15:00Z.".into()
            }
            SemanticType::Duration => {
                "an ISO-8601 duration such as PT90S, PT1.5S or PT1H30M.".into()
            }
            SemanticType::Enum(schema) => {
                format!("one of the following values: {}.", schema.variants.join(", "))
            }
            SemanticType::Optional(inner) => format!(
                "either NULL when there is no value, or {}",
                self.describe_at(inner, depth)
            ),
            SemanticType::List(inner) => format!(
                "a list enclosed in square brackets with comma separated elements, \
                 for example [e1, e2]. Each element is {}",
                self.describe_at(inner, depth)
            ),
            SemanticType::Set(inner) => format!(
                "a list of unique elements enclosed in square brackets with comma separated \
                 elements, for example [e1, e2]. Each element is {}",
                self.describe_at(inner, depth)
            ),
            SemanticType::Map(key, value) => format!(
                "a map enclosed in curly braces, written as {{key1=value1, key2=value2}}. \
                 Each key is {} Each value is {}",
                self.describe_at(key, depth),
                self.describe_at(value, depth)
            ),
            SemanticType::Object(schema) => {
                if schema.fields.is_empty() {
                    return "an empty object written as {}.".into();
                }
                let indent = "  ".repeat(depth);
                let mut out = String::from(
                    "an object enclosed in curly braces, written as \
                     {field1=value1, field2=value2}, with the following fields:",
                );
                for field in &schema.fields {
                    out.push_str(&format!(
                        "\n{indent}- {} ({}): {}",
                        field.name,
                        field.ty,
                        self.describe_at(&field.ty, depth + 1)
                    ));
                }
                out
            }
            SemanticType::Custom(name) => match self.rule(name) {
                Some(rule) => rule.describe(),
                None => format!("a value of type {name}."),
            },
        }
    }
}
