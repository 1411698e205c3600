//! Transcoder
//!
//! Bidirectional mapping between structured values and model text:
//! - `encode_parameter` renders an argument in labeled notation
//! - `decode_result` recovers a value of the declared type from a free-form answer
//! - `describe` produces the response-format description used in prompts
//! - `check_supported` validates a type before any call is made
//!
//! The transcoder is immutable once built. Custom rules are registered up front
//! and shared read-only, so one instance can serve concurrent calls.

mod decode;
mod describe;
mod encode;
pub(crate) mod extract;
mod notation;
pub mod rules;
pub mod transcodable;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::types::{SemanticType, Value};

pub use rules::TranscodingRule;
pub use transcodable::{ObjectFields, Transcodable};

/// A parameter rendered for a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    pub name: String,
    pub ty: SemanticType,
    pub text: String,
}

/// Encoder, decoder and describer for semantic types.
#[derive(Clone, Default)]
pub struct Transcoder {
    rules: HashMap<String, Arc<dyn TranscodingRule>>,
}

impl fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("Transcoder").field("rules", &names).finish()
    }
}

impl Transcoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom rule, builder style.
    pub fn with_rule<R: TranscodingRule + 'static>(mut self, rule: R) -> Self {
        self.register(Arc::new(rule));
        self
    }

    /// Register a custom rule. A rule with the same type name is replaced.
    pub fn register(&mut self, rule: Arc<dyn TranscodingRule>) {
        let name = rule.type_name().to_string();
        if self.rules.insert(name.clone(), rule).is_some() {
            tracing::debug!(type_name = %name, "replaced transcoding rule");
        }
    }

    pub fn rule(&self, type_name: &str) -> Option<&Arc<dyn TranscodingRule>> {
        self.rules.get(type_name)
    }

    /// Render one argument. Non-conforming values fail with `InvalidArgument`.
    pub fn encode_parameter(
        &self,
        name: &str,
        ty: &SemanticType,
        value: &Value,
    ) -> Result<EncodedValue, ProxyError> {
        let text = self
            .encode(ty, value)
            .map_err(|reason| ProxyError::invalid_argument(name, reason))?;
        Ok(EncodedValue {
            name: name.to_string(),
            ty: ty.clone(),
            text,
        })
    }

    /// Render a value in labeled notation. The error is a human readable reason.
    pub fn encode(&self, ty: &SemanticType, value: &Value) -> Result<String, String> {
        self.encode_value(ty, value, false)
    }

    /// Check that a type can be encoded, decoded and described.
    pub fn check_supported(&self, ty: &SemanticType) -> Result<(), String> {
        match ty {
            SemanticType::Custom(name) => {
                if self.rules.contains_key(name) {
                    Ok(())
                } else {
                    Err(format!(
                        "no transcoding rule registered for custom type `{name}`"
                    ))
                }
            }
            SemanticType::Enum(schema) => {
                if schema.variants.is_empty() {
                    return Err(format!("enum `{}` has no variants", schema.name));
                }
                let mut seen = HashSet::new();
                for variant in &schema.variants {
                    if !extract::is_identifier(variant) {
                        return Err(format!(
                            "enum `{}` has invalid variant name `{variant}`",
                            schema.name
                        ));
                    }
                    if !seen.insert(variant.as_str()) {
                        return Err(format!(
                            "enum `{}` declares variant `{variant}` twice",
                            schema.name
                        ));
                    }
                }
                Ok(())
            }
            SemanticType::Object(schema) => {
                let mut seen = HashSet::new();
                for field in &schema.fields {
                    if !extract::is_identifier(&field.name) {
                        return Err(format!(
                            "object `{}` has invalid field name `{}`",
                            schema.name, field.name
                        ));
                    }
                    if !seen.insert(field.name.as_str()) {
                        return Err(format!(
                            "object `{}` declares field `{}` twice",
                            schema.name, field.name
                        ));
                    }
                    self.check_supported(&field.ty)
                        .map_err(|e| format!("field `{}` of `{}`: {e}", field.name, schema.name))?;
                }
                Ok(())
            }
            SemanticType::Optional(inner) => {
                if matches!(inner.as_ref(), SemanticType::Optional(_)) {
                    return Err(format!("nested optional type `{ty}` is not supported"));
                }
                self.check_supported(inner)
            }
            SemanticType::List(inner) | SemanticType::Set(inner) => self.check_supported(inner),
            SemanticType::Map(key, value) => {
                if !key.is_scalar() {
                    return Err(format!("map key type `{key}` is not a scalar type"));
                }
                self.check_supported(key)?;
                self.check_supported(value)
            }
            SemanticType::Int(_)
            | SemanticType::Float(_)
            | SemanticType::Bool
            | SemanticType::Char
            | SemanticType::String
            | SemanticType::Date
            | SemanticType::Time
            | SemanticType::DateTime
            | SemanticType::Timestamp
            | SemanticType::Duration => Ok(()),
        }
    }
}
