//! The value model: a closed description of every storable shape.
//!
//! Reads and writes both pass through [`StoreValue`]: the probe serializer
//! turns a Rust value into one, the routers inspect its shape, and the
//! merge deserializer turns one back into a Rust value. Struct and Map are
//! separate variants because they route differently, and serde reports
//! which one a type is without any runtime sniffing.

mod de;
mod ser;

pub use de::from_store_value;
pub use ser::to_store_value;

pub(crate) use de::accepts_empty_seq;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Every shape the typed layer can store.
///
/// `Seq`, `Struct`, and `Map` preserve source order; struct fields carry
/// their serde-reported names. Enums follow the externally tagged
/// convention: unit variants are `Str(name)`, data-carrying variants a
/// one-entry `Map`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<StoreValue>),
    Struct(Vec<(String, StoreValue)>),
    Map(Vec<(StoreValue, StoreValue)>),
}

impl Default for StoreValue {
    fn default() -> Self {
        Self::Null
    }
}

impl StoreValue {
    /// Human name of the shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            StoreValue::Null => "null",
            StoreValue::Bool(_) => "boolean",
            StoreValue::Int(_) | StoreValue::UInt(_) => "integer",
            StoreValue::Float(_) => "float",
            StoreValue::Str(_) => "string",
            StoreValue::Bytes(_) => "bytes",
            StoreValue::Seq(_) => "sequence",
            StoreValue::Struct(_) => "struct",
            StoreValue::Map(_) => "map",
        }
    }

    /// Whether this is a leaf that stores as a single payload.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            StoreValue::Seq(_) | StoreValue::Struct(_) | StoreValue::Map(_)
        )
    }
}

// The JSON bridge: composites that fall back to JSON text serialize the
// model itself, structs and maps both becoming objects.
impl Serialize for StoreValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StoreValue::Null => serializer.serialize_unit(),
            StoreValue::Bool(v) => serializer.serialize_bool(*v),
            StoreValue::Int(v) => serializer.serialize_i64(*v),
            StoreValue::UInt(v) => serializer.serialize_u64(*v),
            StoreValue::Float(v) => serializer.serialize_f64(*v),
            StoreValue::Str(v) => serializer.serialize_str(v),
            StoreValue::Bytes(v) => serializer.serialize_bytes(v),
            StoreValue::Seq(items) => items.serialize(serializer),
            StoreValue::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            StoreValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for StoreValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = StoreValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any storable value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<StoreValue, E> {
                Ok(StoreValue::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<StoreValue, E> {
                Ok(StoreValue::Int(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<StoreValue, E> {
                Ok(StoreValue::UInt(v))
            }

            fn visit_f64<E>(self, v: f64) -> Result<StoreValue, E> {
                Ok(StoreValue::Float(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<StoreValue, E> {
                Ok(StoreValue::Str(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> Result<StoreValue, E> {
                Ok(StoreValue::Str(v))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<StoreValue, E> {
                Ok(StoreValue::Bytes(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<StoreValue, E> {
                Ok(StoreValue::Bytes(v))
            }

            fn visit_none<E>(self) -> Result<StoreValue, E> {
                Ok(StoreValue::Null)
            }

            fn visit_unit<E>(self) -> Result<StoreValue, E> {
                Ok(StoreValue::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<StoreValue, D::Error> {
                StoreValue::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StoreValue, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(StoreValue::Seq(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<StoreValue, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(StoreValue::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> serde::de::IntoDeserializer<'de, crate::error::Error> for StoreValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}
