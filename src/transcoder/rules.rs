//! Custom transcoding rules
//!
//! A rule teaches the transcoder how to handle a caller-named type that the
//! built-in semantic types cannot express.

use std::fmt;

use crate::error::DecodeError;
use crate::types::Value;

/// Encoding, decoding and prompt description for one `SemanticType::Custom`.
///
/// # Example
///
/// ```rust,ignore
/// struct Hex;
///
/// impl TranscodingRule for Hex {
///     fn type_name(&self) -> &str { "Hex" }
///     fn describe(&self) -> String { "a hexadecimal number such as 0x1f.".into() }
///     fn encode(&self, value: &Value) -> Result<String, String> {
///         match value {
///             Value::UInt(v) => Ok(format!("{v:#x}")),
///             other => Err(format!("expected an unsigned integer, got {}", other.kind_name())),
///         }
///     }
///     fn decode(&self, text: &str) -> Result<Value, DecodeError> {
///         let digits = text.trim().trim_start_matches("0x");
///         u64::from_str_radix(digits, 16)
///             .map(Value::UInt)
///             .map_err(|e| DecodeError::type_mismatch("Hex", e.to_string()))
///     }
/// }
/// ```
pub trait TranscodingRule: Send + Sync {
    /// Name matched against `SemanticType::Custom`.
    fn type_name(&self) -> &str;

    /// Response-format description embedded in prompts.
    fn describe(&self) -> String;

    /// Render a value. The error string becomes the `InvalidArgument` reason.
    fn encode(&self, value: &Value) -> Result<String, String>;

    /// Parse a candidate. Receives trimmed text with Markdown fences removed.
    fn decode(&self, text: &str) -> Result<Value, DecodeError>;
}

impl fmt::Debug for dyn TranscodingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscodingRule")
            .field("type_name", &self.type_name())
            .finish()
    }
}
