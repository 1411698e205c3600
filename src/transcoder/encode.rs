//! Labeled notation encoder

use std::time::Duration;

use chrono::{Datelike, SecondsFormat};

use super::Transcoder;
use super::extract::is_plain_token;
use crate::types::{FloatKind, IntKind, SemanticType, Value};

impl Transcoder {
    /// Encode `value` as `ty`. `nested` is set inside lists, maps and objects,
    /// where custom encodings that are not plain tokens get quoted.
    pub(crate) fn encode_value(
        &self,
        ty: &SemanticType,
        value: &Value,
        nested: bool,
    ) -> Result<String, String> {
        match ty {
            SemanticType::Int(kind) => encode_int(*kind, value),
            SemanticType::Float(kind) => encode_float(*kind, value),
            SemanticType::Bool => match value {
                Value::Bool(b) => Ok(b.to_string()),
                other => Err(unexpected("bool", other)),
            },
            SemanticType::Char => match value {
                Value::Char(c) => quote(&c.to_string()),
                other => Err(unexpected("char", other)),
            },
            SemanticType::String => match value {
                Value::String(s) => quote(s),
                other => Err(unexpected("string", other)),
            },
            SemanticType::Date => match value {
                Value::Date(d) => {
                    four_digit_year(d.year())?;
                    Ok(d.format("%Y-%m-%d").to_string())
                }
                other => Err(unexpected("date", other)),
            },
            SemanticType::Time => match value {
                Value::Time(t) => Ok(t.format("%H:%M:%S%.f").to_string()),
                other => Err(unexpected("time", other)),
            },
            SemanticType::DateTime => match value {
                Value::DateTime(dt) => {
                    four_digit_year(dt.year())?;
                    Ok(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
                }
                other => Err(unexpected("date-time", other)),
            },
            SemanticType::Timestamp => match value {
                Value::Timestamp(ts) => {
                    four_digit_year(ts.year())?;
                    Ok(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                }
                other => Err(unexpected("timestamp", other)),
            },
            SemanticType::Duration => match value {
                Value::Duration(d) => Ok(format_duration(*d)),
                other => Err(unexpected("duration", other)),
            },
            SemanticType::Enum(schema) => {
                let name = match value {
                    Value::Enum(name) | Value::String(name) => name,
                    other => return Err(unexpected("enum variant", other)),
                };
                if schema.variants.iter().any(|v| v == name) {
                    Ok(name.clone())
                } else {
                    Err(format!("`{name}` is not a variant of {}", schema.name))
                }
            }
            SemanticType::Optional(inner) => match value {
                Value::Null => Ok("NULL".to_string()),
                v => self.encode_value(inner, v, nested),
            },
            SemanticType::List(inner) => {
                let Value::List(items) = value else {
                    return Err(unexpected("list", value));
                };
                self.encode_items(inner, items)
            }
            SemanticType::Set(inner) => {
                let Value::List(items) = value else {
                    return Err(unexpected("set", value));
                };
                for (i, item) in items.iter().enumerate() {
                    if items[..i].contains(item) {
                        return Err(format!("set contains element {i} twice"));
                    }
                }
                self.encode_items(inner, items)
            }
            SemanticType::Map(key_ty, value_ty) => {
                let Value::Map(entries) = value else {
                    return Err(unexpected("map", value));
                };
                let mut parts = Vec::with_capacity(entries.len());
                for (i, (k, v)) in entries.iter().enumerate() {
                    if entries[..i].iter().any(|(prev, _)| prev == k) {
                        return Err(format!("map contains key {i} twice"));
                    }
                    let key = self
                        .encode_key(key_ty, k)
                        .map_err(|e| format!("key {i}: {e}"))?;
                    let val = self
                        .encode_value(value_ty, v, true)
                        .map_err(|e| format!("value of key {key}: {e}"))?;
                    parts.push(format!("{key}={val}"));
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            SemanticType::Object(schema) => {
                let Value::Object(fields) = value else {
                    return Err(unexpected(&schema.name, value));
                };
                if let Some((unknown, _)) = fields.iter().find(|(k, _)| schema.get(k).is_none()) {
                    return Err(format!("{} has no field `{unknown}`", schema.name));
                }
                let mut parts = Vec::with_capacity(schema.fields.len());
                for field in &schema.fields {
                    let text = match fields.iter().find(|(k, _)| *k == field.name) {
                        Some((_, v)) => self.encode_value(&field.ty, v, true),
                        None if field.is_optional() => Ok("NULL".to_string()),
                        None => Err("missing required field".to_string()),
                    }
                    .map_err(|e| format!("field `{}`: {e}", field.name))?;
                    parts.push(format!("{}={text}", field.name));
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            SemanticType::Custom(name) => {
                let rule = self
                    .rule(name)
                    .ok_or_else(|| format!("no transcoding rule registered for `{name}`"))?;
                let text = rule.encode(value)?;
                if nested && !is_plain_token(&text) {
                    quote(&text)
                } else {
                    Ok(text)
                }
            }
        }
    }

    fn encode_items(&self, inner: &SemanticType, items: &[Value]) -> Result<String, String> {
        let parts = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.encode_value(inner, item, true)
                    .map_err(|e| format!("element {i}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("[{}]", parts.join(", ")))
    }

    /// Map keys are bare when they are plain tokens and quoted otherwise.
    fn encode_key(&self, ty: &SemanticType, value: &Value) -> Result<String, String> {
        let raw = match (ty, value) {
            (SemanticType::String, Value::String(s)) => s.clone(),
            (SemanticType::Char, Value::Char(c)) => c.to_string(),
            (SemanticType::Custom(name), v) => self
                .rule(name)
                .ok_or_else(|| format!("no transcoding rule registered for `{name}`"))?
                .encode(v)?,
            _ => self.encode_value(ty, value, false)?,
        };
        if is_plain_token(&raw) {
            Ok(raw)
        } else {
            quote(&raw)
        }
    }
}

fn unexpected(expected: &str, found: &Value) -> String {
    format!("expected {expected}, got {}", found.kind_name())
}

fn quote(text: &str) -> Result<String, String> {
    serde_json::to_string(text).map_err(|e| e.to_string())
}

fn encode_int(kind: IntKind, value: &Value) -> Result<String, String> {
    let v = value
        .as_i128()
        .ok_or_else(|| unexpected("integer", value))?;
    if kind.contains(v) {
        Ok(v.to_string())
    } else {
        Err(format!("{v} is out of range for {}", kind.name()))
    }
}

fn encode_float(kind: FloatKind, value: &Value) -> Result<String, String> {
    let v = value.as_f64().ok_or_else(|| unexpected("float", value))?;
    match kind {
        FloatKind::F64 => Ok(v.to_string()),
        FloatKind::F32 => {
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                Err(format!("{v} is out of range for f32"))
            } else {
                Ok((v as f32).to_string())
            }
        }
    }
}

/// Dates are written as `YYYY-MM-DD`, which has no room for a sign or a fifth digit.
fn four_digit_year(year: i32) -> Result<(), String> {
    if (0..=9999).contains(&year) {
        Ok(())
    } else {
        Err(format!("year {year} is outside 0000..=9999"))
    }
}

/// ISO-8601 duration in seconds, e.g. `PT90S` or `PT1.5S`.
pub(crate) fn format_duration(d: Duration) -> String {
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        format!("PT{}S", d.as_secs())
    } else {
        let frac = format!("{nanos:09}");
        format!("PT{}.{}S", d.as_secs(), frac.trim_end_matches('0'))
    }
}
