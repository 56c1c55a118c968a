//! The merge deserializer: a [`StoreValue`] tree back into any
//! `T: Deserialize`.
//!
//! Coercion is deliberately weak on string leaves, because everything the
//! store returns is text: numbers and booleans parse, the empty string
//! decodes to the target's zero value, and a string leaf offered to a
//! composite destination is parsed as JSON first and decoded recursively.

use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use tracing::trace;

use super::StoreValue;
use crate::error::{Error, Result};

/// Decode a value-model tree into a concrete type.
pub fn from_store_value<T>(value: StoreValue) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
}

/// Whether `T` accepts a sequence of any length.
///
/// Vectors and sets take an empty sequence; arrays and tuples insist on
/// their exact arity. The answer decides fresh-rebuild vs positional-merge
/// semantics for ranged reads.
pub(crate) fn accepts_empty_seq<T>() -> bool
where
    T: DeserializeOwned,
{
    T::deserialize(StoreValue::Seq(Vec::new())).is_ok()
}

fn int_from(value: StoreValue, target: &'static str) -> Result<i64> {
    match value {
        StoreValue::Int(v) => Ok(v),
        StoreValue::UInt(v) => i64::try_from(v).map_err(|_| Error::parse(v.to_string(), target)),
        StoreValue::Str(text) => {
            if text.is_empty() {
                return Ok(0);
            }
            text.parse().map_err(|_| Error::parse(text, target))
        }
        other => Err(Error::shape(target, other.shape())),
    }
}

fn uint_from(value: StoreValue, target: &'static str) -> Result<u64> {
    match value {
        StoreValue::UInt(v) => Ok(v),
        StoreValue::Int(v) => u64::try_from(v).map_err(|_| Error::parse(v.to_string(), target)),
        StoreValue::Str(text) => {
            if text.is_empty() {
                return Ok(0);
            }
            text.parse().map_err(|_| Error::parse(text, target))
        }
        other => Err(Error::shape(target, other.shape())),
    }
}

fn float_from(value: StoreValue, target: &'static str) -> Result<f64> {
    match value {
        StoreValue::Float(v) => Ok(v),
        StoreValue::Int(v) => Ok(v as f64),
        StoreValue::UInt(v) => Ok(v as f64),
        StoreValue::Str(text) => {
            if text.is_empty() {
                return Ok(0.0);
            }
            text.parse().map_err(|_| Error::parse(text, target))
        }
        other => Err(Error::shape(target, other.shape())),
    }
}

fn bool_from(value: StoreValue) -> Result<bool> {
    match value {
        StoreValue::Bool(v) => Ok(v),
        StoreValue::Str(text) => match text.as_str() {
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            _ => Err(Error::parse(text, "boolean")),
        },
        other => Err(Error::shape("boolean", other.shape())),
    }
}

fn string_from(value: StoreValue) -> Result<String> {
    match value {
        StoreValue::Str(text) => Ok(text),
        StoreValue::Bytes(raw) => {
            String::from_utf8(raw).map_err(|e| {
                Error::parse(String::from_utf8_lossy(e.as_bytes()).into_owned(), "string")
            })
        }
        other => Err(Error::shape("string", other.shape())),
    }
}

// A string leaf offered where a composite is expected: parse it as JSON
// and decode the parsed tree instead.
fn json_leaf(text: String, target: &'static str) -> Result<StoreValue> {
    trace!("Parsing {} byte leaf as JSON for a {} target", text.len(), target);
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(_) => Err(Error::parse(text, target)),
    }
}

fn struct_pairs(fields: Vec<(String, StoreValue)>) -> Vec<(StoreValue, StoreValue)> {
    fields
        .into_iter()
        .map(|(name, value)| (StoreValue::Str(name), value))
        .collect()
}

fn drive_seq<'de, V>(items: Vec<StoreValue>, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let total = items.len();
    let mut walker = SeqWalker {
        iter: items.into_iter(),
    };
    let value = visitor.visit_seq(&mut walker)?;
    let leftover = walker.iter.len();
    if leftover > 0 {
        return Err(Error::Arity {
            requested: total - leftover,
            returned: total,
        });
    }
    Ok(value)
}

fn drive_map<'de, V>(entries: Vec<(StoreValue, StoreValue)>, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let mut walker = MapWalker {
        iter: entries.into_iter(),
        pending: None,
    };
    visitor.visit_map(&mut walker)
}

impl<'de> Deserializer<'de> for StoreValue {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            StoreValue::Null => visitor.visit_unit(),
            StoreValue::Bool(v) => visitor.visit_bool(v),
            StoreValue::Int(v) => visitor.visit_i64(v),
            StoreValue::UInt(v) => visitor.visit_u64(v),
            StoreValue::Float(v) => visitor.visit_f64(v),
            StoreValue::Str(text) => visitor.visit_string(text),
            StoreValue::Bytes(raw) => visitor.visit_byte_buf(raw),
            StoreValue::Seq(items) => drive_seq(items, visitor),
            StoreValue::Struct(fields) => drive_map(struct_pairs(fields), visitor),
            StoreValue::Map(entries) => drive_map(entries, visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(bool_from(self)?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let wide = int_from(self, "i8")?;
        let narrow = i8::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "i8"))?;
        visitor.visit_i8(narrow)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let wide = int_from(self, "i16")?;
        let narrow = i16::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "i16"))?;
        visitor.visit_i16(narrow)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let wide = int_from(self, "i32")?;
        let narrow = i32::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "i32"))?;
        visitor.visit_i32(narrow)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(int_from(self, "i64")?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let wide = uint_from(self, "u8")?;
        let narrow = u8::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "u8"))?;
        visitor.visit_u8(narrow)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let wide = uint_from(self, "u16")?;
        let narrow = u16::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "u16"))?;
        visitor.visit_u16(narrow)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let wide = uint_from(self, "u32")?;
        let narrow = u32::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "u32"))?;
        visitor.visit_u32(narrow)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(uint_from(self, "u64")?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(float_from(self, "f32")? as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(float_from(self, "f64")?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let text = string_from(self)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::parse(text, "char")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(string_from(self)?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(string_from(self)?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            StoreValue::Bytes(raw) => visitor.visit_byte_buf(raw),
            StoreValue::Str(text) => visitor.visit_byte_buf(text.into_bytes()),
            StoreValue::Seq(items) => {
                let mut raw = Vec::with_capacity(items.len());
                for item in items {
                    let wide = uint_from(item, "u8")?;
                    let byte =
                        u8::try_from(wide).map_err(|_| Error::parse(wide.to_string(), "u8"))?;
                    raw.push(byte);
                }
                visitor.visit_byte_buf(raw)
            }
            other => Err(Error::shape("bytes", other.shape())),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            StoreValue::Null => visitor.visit_none(),
            // The write path stores `None` as an empty payload.
            StoreValue::Str(text) if text.is_empty() => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            StoreValue::Null => visitor.visit_unit(),
            other => Err(Error::shape("null", other.shape())),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            StoreValue::Seq(items) => drive_seq(items, visitor),
            StoreValue::Str(text) => {
                let parsed = json_leaf(text, "sequence")?;
                parsed.deserialize_seq(visitor)
            }
            StoreValue::Bytes(raw) => drive_seq(
                raw.into_iter().map(|b| StoreValue::UInt(u64::from(b))).collect(),
                visitor,
            ),
            other => Err(Error::shape("sequence", other.shape())),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            StoreValue::Map(entries) => drive_map(entries, visitor),
            StoreValue::Struct(fields) => drive_map(struct_pairs(fields), visitor),
            StoreValue::Str(text) => {
                let parsed = json_leaf(text, "map")?;
                parsed.deserialize_map(visitor)
            }
            other => Err(Error::shape("map", other.shape())),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            StoreValue::Struct(f) => drive_map(struct_pairs(f), visitor),
            StoreValue::Map(entries) => drive_map(entries, visitor),
            StoreValue::Str(text) => {
                let parsed = json_leaf(text, "struct")?;
                parsed.deserialize_struct(name, fields, visitor)
            }
            other => Err(Error::shape("struct", other.shape())),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            StoreValue::Str(text) => {
                // A JSON object means a data-carrying variant round-tripped
                // through a payload; anything else is a unit variant name.
                if text.trim_start().starts_with('{') {
                    let parsed = json_leaf(text, "enum")?;
                    parsed.deserialize_enum(name, variants, visitor)
                } else {
                    visitor.visit_enum(text.into_deserializer())
                }
            }
            StoreValue::Map(mut entries) => {
                if entries.len() != 1 {
                    return Err(Error::shape("single-entry map", "map"));
                }
                let (variant, value) = entries.remove(0);
                visitor.visit_enum(EnumWalker { variant, value })
            }
            StoreValue::Struct(mut fields) => {
                if fields.len() != 1 {
                    return Err(Error::shape("single-entry map", "struct"));
                }
                let (variant, value) = fields.remove(0);
                visitor.visit_enum(EnumWalker {
                    variant: StoreValue::Str(variant),
                    value,
                })
            }
            other => Err(Error::shape("enum", other.shape())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(string_from(self)?)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

struct SeqWalker {
    iter: std::vec::IntoIter<StoreValue>,
}

impl<'de> de::SeqAccess<'de> for SeqWalker {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapWalker {
    iter: std::vec::IntoIter<(StoreValue, StoreValue)>,
    pending: Option<StoreValue>,
}

impl<'de> de::MapAccess<'de> for MapWalker {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some(value) => seed.deserialize(value),
            None => Err(Error::Message(
                "map value requested before its key".to_owned(),
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumWalker {
    variant: StoreValue,
    value: StoreValue,
}

impl<'de> de::EnumAccess<'de> for EnumWalker {
    type Error = Error;
    type Variant = VariantWalker;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantWalker)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(self.variant)?;
        Ok((variant, VariantWalker { value: self.value }))
    }
}

struct VariantWalker {
    value: StoreValue,
}

impl<'de> de::VariantAccess<'de> for VariantWalker {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            StoreValue::Null => Ok(()),
            other => Err(Error::shape("unit variant", other.shape())),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self.value, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_map(self.value, visitor)
    }
}
