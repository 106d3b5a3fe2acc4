//! Loosely-typed wire values.
//!
//! Every wire format (JSON, XML, protobuf `Struct`, …) decodes field values
//! into the same small closed set of shapes. The coercion engine dispatches on
//! these shapes with an exhaustive `match` instead of open-ended type probing.

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder written in place of a sensitive field's real content.
///
/// A decoded value equal to this marker is never coerced into a typed field.
pub const REDACTED: &str = "[REDACTED]";

/// Largest integer magnitude an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A decoded wire value before it has been matched to a declared field type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    /// All wire numbers are carried as double precision.
    Number(f64),
    String(String),
    /// Nested mapping; keeps wire order.
    Map(IndexMap<String, RawValue>),
    /// Nested sequence.
    Seq(Vec<RawValue>),
}

/// The primitive kind of a non-composite raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPrimitive {
    Bool,
    Number,
    String,
}

impl RawValue {
    /// Returns `true` if this value is exactly the [`REDACTED`] marker.
    pub fn is_redacted(&self) -> bool {
        matches!(self, Self::String(s) if s == REDACTED)
    }

    /// The redaction marker as a raw value.
    pub fn redacted() -> Self {
        Self::String(REDACTED.to_string())
    }

    /// Returns `true` for nested mappings and sequences.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Seq(_))
    }

    /// Primitive kind for scalars; `None` for null and composites.
    pub fn primitive(&self) -> Option<RawPrimitive> {
        match self {
            Self::Bool(_) => Some(RawPrimitive::Bool),
            Self::Number(_) => Some(RawPrimitive::Number),
            Self::String(_) => Some(RawPrimitive::String),
            Self::Null | Self::Map(_) | Self::Seq(_) => None,
        }
    }

    /// Short shape name used in diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Map(_) => "map",
            Self::Seq(_) => "sequence",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, RawValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[RawValue]> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a member of a map value.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_map()?.get(key)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            // Every JSON number is representable (possibly lossily) as f64.
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Seq(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "<{}>", self.shape_name()),
        }
    }
}

// ─── Serde ────────────────────────────────────────────────────────────────────

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                // Integral values go back out as integers: `10` decodes to
                // 10.0 and must re-encode as `10`, not `10.0`. Negative zero
                // keeps its sign.
                let negative_zero = *n == 0.0 && n.is_sign_negative();
                if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER && !negative_zero {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any wire value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
        Ok(RawValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
        Ok(RawValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<RawValue, D::Error> {
        RawValue::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(RawValue::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawValue, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, RawValue>()? {
            map.insert(k, v);
        }
        Ok(RawValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}
