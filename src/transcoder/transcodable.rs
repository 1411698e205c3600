//! Typed bridge between Rust values and `Value`
//!
//! `Transcodable` gives a Rust type its semantic type and conversions in both
//! directions. Structs and enums get it through `ai_object!` and `ai_enum!`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::DecodeError;
use crate::types::{FloatKind, IntKind, SemanticType, Value};

/// A Rust type that can cross the model boundary.
pub trait Transcodable: Sized {
    /// The semantic type describing values of `Self`.
    fn semantic_type() -> SemanticType;

    fn into_value(self) -> Value;

    /// Convert a decoded value. Fails with `TypeMismatch` when the value has
    /// the wrong shape.
    fn from_value(value: Value) -> Result<Self, DecodeError>;
}

/// Mismatch error for `T` given an unexpected value.
pub fn mismatch<T: Transcodable>(value: &Value) -> DecodeError {
    DecodeError::type_mismatch(
        T::semantic_type().name(),
        format!("cannot convert {}", value.kind_name()),
    )
}

macro_rules! impl_int {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(impl Transcodable for $t {
            fn semantic_type() -> SemanticType {
                SemanticType::Int(IntKind::$kind)
            }

            fn into_value(self) -> Value {
                Value::from(self)
            }

            fn from_value(value: Value) -> Result<Self, DecodeError> {
                value
                    .as_i128()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or_else(|| mismatch::<Self>(&value))
            }
        })*
    };
}

impl_int!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

impl Transcodable for f64 {
    fn semantic_type() -> SemanticType {
        SemanticType::Float(FloatKind::F64)
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        value.as_f64().ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl Transcodable for f32 {
    fn semantic_type() -> SemanticType {
        SemanticType::Float(FloatKind::F32)
    }

    fn into_value(self) -> Value {
        Value::Float(self as f64)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch::<Self>(&value))
    }
}

macro_rules! impl_simple {
    ($($t:ty => $sem:ident, $variant:ident),* $(,)?) => {
        $(impl Transcodable for $t {
            fn semantic_type() -> SemanticType {
                SemanticType::$sem
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Result<Self, DecodeError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        })*
    };
}

impl_simple!(
    bool => Bool, Bool,
    char => Char, Char,
    String => String, String,
    NaiveDate => Date, Date,
    NaiveTime => Time, Time,
    NaiveDateTime => DateTime, DateTime,
    DateTime<Utc> => Timestamp, Timestamp,
    Duration => Duration, Duration,
);

impl<T: Transcodable> Transcodable for Option<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::optional(T::semantic_type())
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

fn list_items<C: Transcodable>(value: Value) -> Result<Vec<Value>, DecodeError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(mismatch::<C>(&other)),
    }
}

fn map_entries<C: Transcodable>(value: Value) -> Result<Vec<(Value, Value)>, DecodeError> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(mismatch::<C>(&other)),
    }
}

/// Hash-ordered collections are emitted in a stable order so that identical
/// arguments produce identical prompts.
fn stable_order(mut items: Vec<Value>) -> Vec<Value> {
    items.sort_by_cached_key(|v| format!("{v:?}"));
    items
}

impl<T: Transcodable> Transcodable for Vec<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::list(T::semantic_type())
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        list_items::<Self>(value)?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: Transcodable + Eq + Hash> Transcodable for HashSet<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::set(T::semantic_type())
    }

    fn into_value(self) -> Value {
        Value::List(stable_order(self.into_iter().map(T::into_value).collect()))
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        list_items::<Self>(value)?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: Transcodable + Ord> Transcodable for BTreeSet<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::set(T::semantic_type())
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        list_items::<Self>(value)?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<K, V> Transcodable for HashMap<K, V>
where
    K: Transcodable + Eq + Hash,
    V: Transcodable,
{
    fn semantic_type() -> SemanticType {
        SemanticType::map(K::semantic_type(), V::semantic_type())
    }

    fn into_value(self) -> Value {
        let mut entries: Vec<(Value, Value)> = self
            .into_iter()
            .map(|(k, v)| (k.into_value(), v.into_value()))
            .collect();
        entries.sort_by_cached_key(|(k, _)| format!("{k:?}"));
        Value::Map(entries)
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        map_entries::<Self>(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K, V> Transcodable for BTreeMap<K, V>
where
    K: Transcodable + Ord,
    V: Transcodable,
{
    fn semantic_type() -> SemanticType {
        SemanticType::map(K::semantic_type(), V::semantic_type())
    }

    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        map_entries::<Self>(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

/// Field accessor used by `ai_object!` to rebuild a struct from a decoded
/// object.
#[derive(Debug)]
pub struct ObjectFields {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl ObjectFields {
    pub fn from_value(value: Value, type_name: &str) -> Result<Self, DecodeError> {
        match value {
            Value::Object(fields) => Ok(Self {
                type_name: type_name.to_string(),
                fields,
            }),
            other => Err(DecodeError::type_mismatch(
                type_name,
                format!("cannot convert {}", other.kind_name()),
            )),
        }
    }

    /// Remove and convert a field. An absent field reads as `Null`, which
    /// only optional fields accept.
    pub fn take<T: Transcodable>(&mut self, name: &str) -> Result<T, DecodeError> {
        let value = match self.fields.iter().position(|(k, _)| k == name) {
            Some(idx) => self.fields.swap_remove(idx).1,
            None => Value::Null,
        };
        let missing = value.is_null();
        T::from_value(value).map_err(|e| {
            let reason = if missing {
                format!("missing field `{name}`")
            } else {
                format!("field `{name}`: {e}")
            };
            DecodeError::type_mismatch(self.type_name.as_str(), reason)
        })
    }
}
