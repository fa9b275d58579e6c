//! Literal values that can appear as predicate operands.
//!
//! Values cross the engine boundary in a single canonical external form, a
//! tagged JSON document (`{"type": "int", "value": 42}`), which round-trips
//! every kind without loss.

use crate::{
    error::{Result, ValueParseError},
    geo::{GeoBox, GeoCircle, GeoPolygon, GeoShape},
    ClassName, Error,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

/// The canonical external representation of a [`Value`].
pub type AnyValue = serde_json::Value;

/// Opaque reference to a managed object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    /// Object type the referenced object belongs to
    pub class_name: ClassName,
    /// Primary key, opaque to the engine
    pub key: String,
}

impl ObjectRef {
    pub fn new(class_name: impl Into<ClassName>, key: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            key: key.into(),
        }
    }
}

/// A comparable literal.
///
/// `Null` is the NaN-like sentinel: it is unequal to every value, itself
/// included, and unordered. Use [`Value::is_null`] or
/// [`Value::is_same_sentinel`] to test for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Decimal(Decimal),
    Uuid(Uuid),
    Object(ObjectRef),
    Geo(GeoShape),
    List(Vec<Value>),
}

impl Value {
    /// Build a list value from anything convertible.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True when both values are the null sentinel.
    pub fn is_same_sentinel(&self, other: &Value) -> bool {
        self.is_null() && other.is_null()
    }

    /// Name of this value's kind, as used in the external representation.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Timestamp(_) => "timestamp",
            Value::Decimal(_) => "decimal",
            Value::Uuid(_) => "uuid",
            Value::Object(_) => "object",
            Value::Geo(_) => "geo",
            Value::List(_) => "list",
        }
    }

    /// Parse a high-precision decimal.
    pub fn parse_decimal(input: &str) -> std::result::Result<Self, ValueParseError> {
        Decimal::from_str(input.trim())
            .or_else(|_| Decimal::from_scientific(input.trim()))
            .map(Value::Decimal)
            .map_err(|e| ValueParseError::new("decimal", input, e))
    }

    /// Parse an integer, falling back to a float.
    pub fn parse_number(input: &str) -> std::result::Result<Self, ValueParseError> {
        let trimmed = input.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ValueParseError::new("number", input, e))
    }

    pub fn parse_uuid(input: &str) -> std::result::Result<Self, ValueParseError> {
        Uuid::parse_str(input.trim())
            .map(Value::Uuid)
            .map_err(|e| ValueParseError::new("uuid", input, e))
    }

    /// Parse an RFC 3339 timestamp.
    pub fn parse_timestamp(input: &str) -> std::result::Result<Self, ValueParseError> {
        DateTime::parse_from_rfc3339(input.trim())
            .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
            .map_err(|e| ValueParseError::new("timestamp", input, e))
    }

    /// Convert to the external representation.
    pub fn to_any(&self) -> Result<AnyValue> {
        serde_json::to_value(self).map_err(|e| Error::InvalidExternalValue(e.to_string()))
    }

    /// Convert from the external representation.
    pub fn from_any(any: AnyValue) -> Result<Self> {
        serde_json::from_value(any).map_err(|e| Error::InvalidExternalValue(e.to_string()))
    }
}

mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() && *value > 0.0 {
            serializer.serialize_str("inf")
        } else if value.is_infinite() {
            serializer.serialize_str("-inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!(
                    "invalid float literal '{other}'"
                ))),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Geo(a), Value::Geo(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Null never matches, not even itself
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.partial_cmp(b),
            (Value::Object(a), Value::Object(b)) => a.partial_cmp(b),
            (Value::Geo(a), Value::Geo(b)) if a == b => Some(Ordering::Equal),
            (Value::List(a), Value::List(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            // -0.0 == 0.0, so both must hash alike
            Value::Float(f) if *f == 0.0 => 0u64.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Binary(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Object(o) => o.hash(state),
            Value::Geo(g) => g.hash(state),
            Value::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    /// Render as a predicate literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Binary(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Timestamp(t) => write!(f, "T{}:{}", t.timestamp(), t.timestamp_subsec_nanos()),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Uuid(u) => write!(f, "uuid({u})"),
            Value::Object(o) => write!(f, "obj({:?}, {:?})", o.class_name, o.key),
            Value::Geo(g) => write!(f, "{g}"),
            Value::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Binary(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<GeoShape> for Value {
    fn from(v: GeoShape) -> Self {
        Value::Geo(v)
    }
}

impl From<GeoBox> for Value {
    fn from(v: GeoBox) -> Self {
        Value::Geo(v.into())
    }
}

impl From<GeoCircle> for Value {
    fn from(v: GeoCircle) -> Self {
        Value::Geo(v.into())
    }
}

impl From<GeoPolygon> for Value {
    fn from(v: GeoPolygon) -> Self {
        Value::Geo(v.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
