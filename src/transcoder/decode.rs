//! Response decoder
//!
//! Decoding never guesses: when no candidate for the declared type is found
//! the result is `NoMatch`, and a candidate that violates the type is a
//! `TypeMismatch`. There is no default value.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::Transcoder;
use super::extract::{self, strip_fences};
use super::notation::{self, Node};
use crate::error::DecodeError;
use crate::types::{EnumSchema, FloatKind, IntKind, ObjectSchema, SemanticType, Value};

impl Transcoder {
    /// Decode a raw backend answer into a value of `ty`.
    pub fn decode_result(&self, raw: &str, ty: &SemanticType) -> Result<Value, DecodeError> {
        let text = strip_fences(raw);
        if text.is_empty() {
            return Err(DecodeError::no_match(ty.name(), raw));
        }
        self.decode_text(text, ty)
    }

    fn decode_text(&self, text: &str, ty: &SemanticType) -> Result<Value, DecodeError> {
        match ty {
            SemanticType::Int(kind) => decode_int(text, *kind),
            SemanticType::Float(kind) => decode_float(text, *kind),
            SemanticType::Bool => extract::first_bool(text)
                .map(Value::Bool)
                .ok_or_else(|| DecodeError::no_match("bool", text)),
            SemanticType::Char => decode_char(&unquote(text)),
            SemanticType::String => Ok(Value::String(unquote(text))),
            SemanticType::Date => decode_date(text),
            SemanticType::Time => decode_time(text),
            SemanticType::DateTime => decode_date_time(text),
            SemanticType::Timestamp => decode_timestamp(text),
            SemanticType::Duration => decode_duration(text),
            SemanticType::Enum(schema) => decode_enum(text, schema),
            SemanticType::Optional(inner) => {
                if extract::is_null_token(text) {
                    Ok(Value::Null)
                } else {
                    self.decode_text(text, inner)
                }
            }
            SemanticType::List(_) | SemanticType::Set(_) => self.decode_structured(text, ty, b'['),
            SemanticType::Map(..) | SemanticType::Object(_) => {
                self.decode_structured(text, ty, b'{')
            }
            SemanticType::Custom(name) => match self.rule(name) {
                Some(rule) => rule.decode(text),
                None => Err(DecodeError::type_mismatch(
                    name.as_str(),
                    "no transcoding rule registered",
                )),
            },
        }
    }

    fn decode_structured(
        &self,
        text: &str,
        ty: &SemanticType,
        open: u8,
    ) -> Result<Value, DecodeError> {
        let slice = extract::extract_balanced_slice(text, open)
            .ok_or_else(|| DecodeError::no_match(ty.name(), text))?;
        let node = notation::parse(slice).map_err(|e| {
            tracing::debug!(error = %e, "structured candidate did not parse");
            DecodeError::no_match(ty.name(), text)
        })?;
        self.from_node(&node, ty)
    }

    /// Interpret a parsed node against the declared type.
    fn from_node(&self, node: &Node<'_>, ty: &SemanticType) -> Result<Value, DecodeError> {
        match ty {
            SemanticType::List(inner) => {
                let items = self.list_items(node, ty, inner)?;
                Ok(Value::List(items))
            }
            SemanticType::Set(inner) => {
                let items = self.list_items(node, ty, inner)?;
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::List(unique))
            }
            SemanticType::Map(key_ty, value_ty) => {
                let Node::Map(entries) = node else {
                    return Err(wrong_shape(ty, node));
                };
                let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
                for (key_node, value_node) in entries {
                    let key_text = key_node.scalar_text().unwrap_or_default();
                    let key = self
                        .from_node(key_node, key_ty)
                        .map_err(|e| nested(ty, format!("key `{key_text}`"), e))?;
                    if pairs.iter().any(|(k, _)| *k == key) {
                        continue;
                    }
                    let value = self
                        .from_node(value_node, value_ty)
                        .map_err(|e| nested(ty, format!("value of key `{key_text}`"), e))?;
                    pairs.push((key, value));
                }
                Ok(Value::Map(pairs))
            }
            SemanticType::Object(schema) => self.object_from_node(node, ty, schema),
            SemanticType::Optional(inner) => match node {
                Node::Atom(text) if extract::is_null_token(text) => Ok(Value::Null),
                _ => self.from_node(node, inner),
            },
            SemanticType::String => match node {
                Node::Atom(text) => Ok(Value::String((*text).to_string())),
                Node::Str(text) => Ok(Value::String(text.clone())),
                _ => Err(wrong_shape(ty, node)),
            },
            SemanticType::Char => match node.scalar_text() {
                Some(text) => decode_char(text).map_err(|e| as_mismatch(ty, e)),
                None => Err(wrong_shape(ty, node)),
            },
            _ => match node.scalar_text() {
                Some(text) if !text.trim().is_empty() => {
                    self.decode_text(text.trim(), ty).map_err(|e| as_mismatch(ty, e))
                }
                _ => Err(wrong_shape(ty, node)),
            },
        }
    }

    fn list_items(
        &self,
        node: &Node<'_>,
        ty: &SemanticType,
        inner: &SemanticType,
    ) -> Result<Vec<Value>, DecodeError> {
        let Node::List(items) = node else {
            return Err(wrong_shape(ty, node));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.from_node(item, inner)
                    .map_err(|e| nested(ty, format!("element {i}"), e))
            })
            .collect()
    }

    fn object_from_node(
        &self,
        node: &Node<'_>,
        ty: &SemanticType,
        schema: &ObjectSchema,
    ) -> Result<Value, DecodeError> {
        let Node::Map(entries) = node else {
            return Err(wrong_shape(ty, node));
        };
        let mut fields = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let found = entries
                .iter()
                .find(|(key, _)| key.scalar_text() == Some(field.name.as_str()));
            let value = match found {
                Some((_, value_node)) => self
                    .from_node(value_node, &field.ty)
                    .map_err(|e| nested(ty, format!("field `{}`", field.name), e))?,
                None if field.is_optional() => Value::Null,
                None => {
                    return Err(DecodeError::type_mismatch(
                        ty.name(),
                        format!("missing field `{}`", field.name),
                    ));
                }
            };
            fields.push((field.name.clone(), value));
        }
        Ok(Value::Object(fields))
    }
}

/// Wrap an error from a nested position into a mismatch of the outer type.
fn nested(outer: &SemanticType, position: String, err: DecodeError) -> DecodeError {
    let reason = match err {
        DecodeError::NoMatch { expected, .. } => format!("no {expected} found"),
        DecodeError::TypeMismatch { expected, reason } => format!("expected {expected}: {reason}"),
    };
    DecodeError::type_mismatch(outer.name(), format!("{position}: {reason}"))
}

/// Inside a structure a value was present, so a missing candidate is a mismatch.
fn as_mismatch(ty: &SemanticType, err: DecodeError) -> DecodeError {
    match err {
        DecodeError::NoMatch { response, .. } => {
            DecodeError::type_mismatch(ty.name(), format!("`{response}` is not a {ty}"))
        }
        mismatch => mismatch,
    }
}

fn wrong_shape(ty: &SemanticType, node: &Node<'_>) -> DecodeError {
    DecodeError::type_mismatch(ty.name(), format!("found a {}", node.kind()))
}

/// Unescape text that is entirely one JSON string literal.
fn unquote(text: &str) -> String {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        if let Ok(s) = serde_json::from_str::<String>(text) {
            return s;
        }
    }
    text.to_string()
}

fn decode_int(text: &str, kind: IntKind) -> Result<Value, DecodeError> {
    let token = extract::first_number(text).ok_or_else(|| DecodeError::no_match(kind.name(), text))?;
    if token.contains(['.', 'e', 'E']) {
        return Err(DecodeError::type_mismatch(
            kind.name(),
            format!("`{token}` is not an integer"),
        ));
    }
    let n: i128 = token.parse().map_err(|_| {
        DecodeError::type_mismatch(kind.name(), format!("`{token}` is out of range"))
    })?;
    if n < 0 && !kind.is_signed() {
        return Err(DecodeError::type_mismatch(
            kind.name(),
            format!("`{token}` is negative"),
        ));
    }
    if !kind.contains(n) {
        return Err(DecodeError::type_mismatch(
            kind.name(),
            format!("`{token}` is out of range {}..={}", kind.min(), kind.max()),
        ));
    }
    Ok(if kind.is_signed() {
        Value::Int(n as i64)
    } else {
        Value::UInt(n as u64)
    })
}

fn decode_float(text: &str, kind: FloatKind) -> Result<Value, DecodeError> {
    let token = extract::first_float(text).ok_or_else(|| DecodeError::no_match(kind.name(), text))?;
    let invalid = |e: std::num::ParseFloatError| DecodeError::type_mismatch(kind.name(), e.to_string());
    let wide: f64 = token.parse().map_err(invalid)?;
    let spelled_infinite = token.to_ascii_lowercase().contains("inf");
    let overflow = match kind {
        FloatKind::F64 => wide.is_infinite() && !spelled_infinite,
        FloatKind::F32 => {
            (wide.is_finite() && wide.abs() > f32::MAX as f64)
                || (wide.is_infinite() && !spelled_infinite)
        }
    };
    if overflow {
        return Err(DecodeError::type_mismatch(
            kind.name(),
            format!("`{token}` is out of range"),
        ));
    }
    match kind {
        FloatKind::F64 => Ok(Value::Float(wide)),
        FloatKind::F32 => {
            let narrow: f32 = token.parse().map_err(invalid)?;
            Ok(Value::Float(narrow as f64))
        }
    }
}

fn decode_char(text: &str) -> Result<Value, DecodeError> {
    let text = match text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(inner) if inner.chars().count() == 1 => inner,
        _ => text,
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Err(DecodeError::no_match("char", text)),
        (Some(c), None) => Ok(Value::Char(c)),
        (Some(_), Some(_)) => Err(DecodeError::type_mismatch(
            "char",
            format!("`{text}` has more than one character"),
        )),
    }
}

fn decode_date(text: &str) -> Result<Value, DecodeError> {
    let candidate = extract::first_date(text).ok_or_else(|| DecodeError::no_match("Date", text))?;
    NaiveDate::parse_from_str(candidate, "%Y-%m-%d")
        .map(Value::Date)
        .map_err(|e| DecodeError::type_mismatch("Date", format!("`{candidate}`: {e}")))
}

fn decode_time(text: &str) -> Result<Value, DecodeError> {
    let candidate = extract::first_time(text).ok_or_else(|| DecodeError::no_match("Time", text))?;
    NaiveTime::parse_from_str(candidate, "%H:%M:%S%.f")
        .map(Value::Time)
        .map_err(|e| DecodeError::type_mismatch("Time", format!("`{candidate}`: {e}")))
}

fn decode_date_time(text: &str) -> Result<Value, DecodeError> {
    let (date, time) =
        extract::first_date_time(text).ok_or_else(|| DecodeError::no_match("DateTime", text))?;
    let candidate = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&candidate, "%Y-%m-%d %H:%M:%S%.f")
        .map(Value::DateTime)
        .map_err(|e| DecodeError::type_mismatch("DateTime", format!("`{candidate}`: {e}")))
}

fn decode_timestamp(text: &str) -> Result<Value, DecodeError> {
    let (date, time, offset) =
        extract::first_timestamp(text).ok_or_else(|| DecodeError::no_match("Timestamp", text))?;
    let normalized = format!("{date}T{time}{}", offset.to_ascii_uppercase());
    DateTime::parse_from_rfc3339(&normalized)
        .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
        .map_err(|e| DecodeError::type_mismatch("Timestamp", format!("`{normalized}`: {e}")))
}

fn decode_duration(text: &str) -> Result<Value, DecodeError> {
    let parts =
        extract::first_duration(text).ok_or_else(|| DecodeError::no_match("Duration", text))?;
    let overflow = || DecodeError::type_mismatch("Duration", "duration is too large");
    let component = |part: Option<&str>, unit: u64| -> Result<u64, DecodeError> {
        match part {
            None => Ok(0),
            Some(digits) => digits
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_mul(unit))
                .ok_or_else(overflow),
        }
    };
    let (whole, frac) = match parts.seconds {
        Some(s) => match s.split_once('.') {
            Some((w, f)) => (Some(w), f),
            None => (Some(s), ""),
        },
        None => (None, ""),
    };
    let secs = [
        component(parts.days, 86_400)?,
        component(parts.hours, 3_600)?,
        component(parts.minutes, 60)?,
        component(whole, 1)?,
    ]
    .into_iter()
    .try_fold(0u64, |acc, n| acc.checked_add(n))
    .ok_or_else(overflow)?;

    let digits: String = frac.chars().take(9).collect();
    let nanos = if digits.is_empty() {
        0
    } else {
        format!("{digits:0<9}").parse::<u32>().map_err(|_| overflow())?
    };
    Ok(Value::Duration(Duration::new(secs, nanos)))
}

fn decode_enum(text: &str, schema: &EnumSchema) -> Result<Value, DecodeError> {
    let words: Vec<&str> = extract::words(text).collect();
    let exact = words
        .iter()
        .find_map(|w| schema.variants.iter().find(|v| v.as_str() == *w));
    let matched = exact.or_else(|| {
        words.iter().find_map(|w| {
            schema
                .variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(w))
        })
    });
    matched
        .map(|v| Value::Enum(v.clone()))
        .ok_or_else(|| DecodeError::no_match(schema.name.as_str(), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn decode(raw: &str, ty: &SemanticType) -> Result<Value, DecodeError> {
        Transcoder::new().decode_result(raw, ty)
    }

    const I64: SemanticType = SemanticType::Int(IntKind::I64);

    #[test]
    fn integers_from_prose() {
        assert_eq!(decode("The answer is 3.", &I64).unwrap(), Value::Int(3));
        assert_eq!(decode("```\n-42\n```", &I64).unwrap(), Value::Int(-42));
        assert!(decode("I cannot compute this", &I64).unwrap_err().is_no_match());
        assert!(decode("three", &I64).unwrap_err().is_no_match());
        assert!(decode("", &I64).unwrap_err().is_no_match());
    }

    #[test]
    fn integer_violations_are_mismatches() {
        assert!(decode("3.5", &I64).unwrap_err().is_type_mismatch());
        assert!(decode("1e3", &I64).unwrap_err().is_type_mismatch());
        let u8_ty = SemanticType::Int(IntKind::U8);
        assert!(decode("-1", &u8_ty).unwrap_err().is_type_mismatch());
        assert!(decode("256", &u8_ty).unwrap_err().is_type_mismatch());
        assert_eq!(decode("255", &u8_ty).unwrap(), Value::UInt(255));
        assert!(
            decode("123456789012345678901234567890123456789012", &I64)
                .unwrap_err()
                .is_type_mismatch()
        );
    }

    #[test]
    fn floats() {
        let f64_ty = SemanticType::Float(FloatKind::F64);
        let f32_ty = SemanticType::Float(FloatKind::F32);
        assert_eq!(decode("about 2.5 units", &f64_ty).unwrap(), Value::Float(2.5));
        assert_eq!(decode("-inf", &f64_ty).unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(decode("NaN", &f64_ty).unwrap(), Value::Float(v) if v.is_nan()));
        assert!(decode("1e39", &f32_ty).unwrap_err().is_type_mismatch());
        assert!(decode("1e400", &f64_ty).unwrap_err().is_type_mismatch());
        assert_eq!(decode("0.1", &f32_ty).unwrap(), Value::Float(0.1f32 as f64));
        assert!(decode("none", &f64_ty).unwrap_err().is_no_match());
    }

    #[test]
    fn bools_chars_and_strings() {
        assert_eq!(decode("Yes, that is True.", &SemanticType::Bool).unwrap(), Value::Bool(true));
        assert!(decode("maybe", &SemanticType::Bool).unwrap_err().is_no_match());
        assert_eq!(decode(r#""x""#, &SemanticType::Char).unwrap(), Value::Char('x'));
        assert_eq!(decode("'y'", &SemanticType::Char).unwrap(), Value::Char('y'));
        assert!(decode("xy", &SemanticType::Char).unwrap_err().is_type_mismatch());
        assert_eq!(
            decode(r#""line\nbreak""#, &SemanticType::String).unwrap(),
            Value::from("line\nbreak")
        );
        assert_eq!(
            decode("  plain text  ", &SemanticType::String).unwrap(),
            Value::from("plain text")
        );
        assert!(decode("   ", &SemanticType::String).unwrap_err().is_no_match());
    }

    #[test]
    fn temporal_values() {
        assert_eq!(
            decode("It was 2024-03-01.", &SemanticType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(decode("2024-13-01", &SemanticType::Date).unwrap_err().is_type_mismatch());
        assert!(decode("tomorrow", &SemanticType::Date).unwrap_err().is_no_match());
        assert_eq!(
            decode("at 2024-03-01T12:00:00+02:00", &SemanticType::Timestamp).unwrap(),
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            decode("PT1H30M", &SemanticType::Duration).unwrap(),
            Value::Duration(Duration::from_secs(5400))
        );
        assert_eq!(
            decode("PT0.25S", &SemanticType::Duration).unwrap(),
            Value::Duration(Duration::from_millis(250))
        );
        assert_eq!(
            decode("2024-03-01 10:15:00.5", &SemanticType::DateTime).unwrap(),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_milli_opt(10, 15, 0, 500)
                    .unwrap()
            )
        );
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        for ty in [
            SemanticType::Date,
            SemanticType::Time,
            SemanticType::DateTime,
            SemanticType::Timestamp,
        ] {
            let err = decode("٢٠٢٤-٠٣-٠١T١٠:١٥:٠٠Z", &ty).unwrap_err();
            assert!(err.is_no_match(), "{ty}: {err}");
        }
        assert!(decode("٣", &I64).unwrap_err().is_no_match());
        assert!(decode("٣", &SemanticType::Float(FloatKind::F64)).unwrap_err().is_no_match());
        assert!(decode("P٣D", &SemanticType::Duration).unwrap_err().is_no_match());
    }

    #[test]
    fn signed_or_long_years_are_not_read_as_dates() {
        assert!(decode("-0005-01-01", &SemanticType::Date).unwrap_err().is_no_match());
        assert!(decode("+12345-01-01", &SemanticType::Date).unwrap_err().is_no_match());
        assert!(
            decode("-0005-01-01T00:00:00Z", &SemanticType::Timestamp)
                .unwrap_err()
                .is_no_match()
        );
        assert!(
            decode("12024-03-01 10:00:00", &SemanticType::DateTime)
                .unwrap_err()
                .is_no_match()
        );
        assert_eq!(
            decode("year 0000-01-01", &SemanticType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(0, 1, 1).unwrap())
        );
        assert_eq!(
            decode("at 2024-03-01t10:00:00z", &SemanticType::Timestamp).unwrap(),
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn enums_prefer_exact_variant() {
        let ty = SemanticType::Enum(EnumSchema::new("Level", ["Low", "LOW", "High"]));
        assert_eq!(decode("LOW", &ty).unwrap(), Value::Enum("LOW".into()));
        assert_eq!(decode("the level is high", &ty).unwrap(), Value::Enum("High".into()));
        assert!(decode("medium", &ty).unwrap_err().is_no_match());
    }

    #[test]
    fn optionals_do_not_fall_back_to_null() {
        let ty = SemanticType::optional(I64);
        assert_eq!(decode("NULL", &ty).unwrap(), Value::Null);
        assert_eq!(decode("None", &ty).unwrap(), Value::Null);
        assert_eq!(decode("7", &ty).unwrap(), Value::Int(7));
        assert!(decode("unknown", &ty).unwrap_err().is_no_match());
    }

    #[test]
    fn structured_values_from_prose_and_json() {
        let point = SemanticType::Object(
            ObjectSchema::new("Point")
                .field("x", I64)
                .field("y", I64)
                .field("label", SemanticType::optional(SemanticType::String)),
        );
        let expected = Value::Object(vec![
            ("x".into(), Value::Int(1)),
            ("y".into(), Value::Int(-2)),
            ("label".into(), Value::Null),
        ]);
        assert_eq!(decode("Here you go: {x=1, y=-2}", &point).unwrap(), expected);
        assert_eq!(
            decode("```json\n{\"x\": 1, \"y\": -2, \"extra\": true,}\n```", &point).unwrap(),
            expected
        );

        let missing = decode("{x=1}", &point).unwrap_err();
        assert!(missing.is_type_mismatch());
        assert!(missing.to_string().contains("missing field `y`"), "{missing}");

        assert!(decode("{x=one, y=2}", &point).unwrap_err().is_type_mismatch());
        assert!(decode("no object here", &point).unwrap_err().is_no_match());
        assert!(decode("{x=1, y=2, =3}", &point).unwrap_err().is_no_match());
        assert!(decode("{x=1, y=2", &point).unwrap_err().is_no_match());
    }

    #[test]
    fn sets_drop_duplicates_and_maps_keep_order() {
        let set = SemanticType::set(I64);
        assert_eq!(
            decode("[3, 1, 3, 2, 1]", &set).unwrap(),
            Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)])
        );

        let map = SemanticType::map(SemanticType::String, SemanticType::list(I64));
        assert_eq!(
            decode(r#"{b=[1], "a c"=[]}"#, &map).unwrap(),
            Value::Map(vec![
                (Value::from("b"), Value::List(vec![Value::Int(1)])),
                (Value::from("a c"), Value::List(vec![])),
            ])
        );
    }

    #[test]
    fn nested_errors_name_their_position() {
        let ty = SemanticType::list(SemanticType::Int(IntKind::U8));
        let err = decode("[1, 2, 300]", &ty).unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(err.to_string().contains("element 2"), "{err}");
    }
}
