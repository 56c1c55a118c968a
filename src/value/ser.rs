//! The probe serializer: any `T: Serialize` into a [`StoreValue`] tree.

use serde::ser::{self, Serialize};

use super::StoreValue;
use crate::error::{Error, Result};

/// Serialize a value into the crate's value model.
///
/// Writes call this to learn what to submit; reads call it on the
/// destination to learn its shape and current contents before routing.
pub fn to_store_value<T>(value: &T) -> Result<StoreValue>
where
    T: Serialize + ?Sized,
{
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = StoreValue;
    type Error = Error;

    type SerializeSeq = SeqCollector;
    type SerializeTuple = SeqCollector;
    type SerializeTupleStruct = SeqCollector;
    type SerializeTupleVariant = TupleVariantCollector;
    type SerializeMap = MapCollector;
    type SerializeStruct = StructCollector;
    type SerializeStructVariant = StructVariantCollector;

    fn serialize_bool(self, v: bool) -> Result<StoreValue> {
        Ok(StoreValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<StoreValue> {
        Ok(StoreValue::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<StoreValue> {
        Ok(StoreValue::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<StoreValue> {
        Ok(StoreValue::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<StoreValue> {
        Ok(StoreValue::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<StoreValue> {
        Ok(StoreValue::UInt(u64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<StoreValue> {
        Ok(StoreValue::UInt(u64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<StoreValue> {
        Ok(StoreValue::UInt(u64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<StoreValue> {
        Ok(StoreValue::UInt(v))
    }

    fn serialize_f32(self, v: f32) -> Result<StoreValue> {
        Ok(StoreValue::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<StoreValue> {
        Ok(StoreValue::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<StoreValue> {
        Ok(StoreValue::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<StoreValue> {
        Ok(StoreValue::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<StoreValue> {
        Ok(StoreValue::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<StoreValue> {
        Ok(StoreValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<StoreValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<StoreValue> {
        Ok(StoreValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<StoreValue> {
        Ok(StoreValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<StoreValue> {
        Ok(StoreValue::Str(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<StoreValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<StoreValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(StoreValue::Map(vec![(
            StoreValue::Str(variant.to_owned()),
            value.serialize(ValueSerializer)?,
        )]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqCollector {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(TupleVariantCollector {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapCollector {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        Ok(StructCollector {
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(StructVariantCollector {
            variant,
            fields: Vec::with_capacity(len),
        })
    }
}

struct SeqCollector {
    items: Vec<StoreValue>,
}

impl ser::SerializeSeq for SeqCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<StoreValue> {
        Ok(StoreValue::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<StoreValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<StoreValue> {
        ser::SerializeSeq::end(self)
    }
}

struct TupleVariantCollector {
    variant: &'static str,
    items: Vec<StoreValue>,
}

impl ser::SerializeTupleVariant for TupleVariantCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<StoreValue> {
        Ok(StoreValue::Map(vec![(
            StoreValue::Str(self.variant.to_owned()),
            StoreValue::Seq(self.items),
        )]))
    }
}

struct MapCollector {
    entries: Vec<(StoreValue, StoreValue)>,
    pending: Option<StoreValue>,
}

impl ser::SerializeMap for MapCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending
            .take()
            .ok_or_else(|| Error::Message("map value serialized before its key".to_owned()))?;
        self.entries.push((key, value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<StoreValue> {
        Ok(StoreValue::Map(self.entries))
    }
}

struct StructCollector {
    fields: Vec<(String, StoreValue)>,
}

impl ser::SerializeStruct for StructCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields
            .push((key.to_owned(), value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<StoreValue> {
        Ok(StoreValue::Struct(self.fields))
    }
}

struct StructVariantCollector {
    variant: &'static str,
    fields: Vec<(String, StoreValue)>,
}

impl ser::SerializeStructVariant for StructVariantCollector {
    type Ok = StoreValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields
            .push((key.to_owned(), value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<StoreValue> {
        Ok(StoreValue::Map(vec![(
            StoreValue::Str(self.variant.to_owned()),
            StoreValue::Struct(self.fields),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Plain {
        x: i32,
        y: String,
    }

    #[derive(Serialize)]
    struct Tagged {
        #[serde(rename = "k")]
        keep: String,
        #[serde(skip)]
        _local: u8,
        plain: bool,
    }

    #[derive(Serialize)]
    enum Mode {
        Fast,
        Custom(u32),
        Tuned { level: i32 },
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_store_value(&true).unwrap(), StoreValue::Bool(true));
        assert_eq!(to_store_value(&-7i16).unwrap(), StoreValue::Int(-7));
        assert_eq!(to_store_value(&7u8).unwrap(), StoreValue::UInt(7));
        assert_eq!(to_store_value(&1.5f64).unwrap(), StoreValue::Float(1.5));
        assert_eq!(
            to_store_value("hi").unwrap(),
            StoreValue::Str("hi".to_owned())
        );
        assert_eq!(to_store_value(&'x').unwrap(), StoreValue::Str("x".to_owned()));
    }

    #[test]
    fn test_options_and_unit() {
        assert_eq!(to_store_value(&()).unwrap(), StoreValue::Null);
        assert_eq!(to_store_value(&None::<i32>).unwrap(), StoreValue::Null);
        assert_eq!(to_store_value(&Some(3i64)).unwrap(), StoreValue::Int(3));
    }

    #[test]
    fn test_struct_keeps_declaration_order() {
        let value = to_store_value(&Plain {
            x: 1,
            y: "two".to_owned(),
        })
        .unwrap();
        assert_eq!(
            value,
            StoreValue::Struct(vec![
                ("x".to_owned(), StoreValue::Int(1)),
                ("y".to_owned(), StoreValue::Str("two".to_owned())),
            ])
        );
    }

    #[test]
    fn test_struct_rename_and_skip() {
        let value = to_store_value(&Tagged {
            keep: "v".to_owned(),
            _local: 9,
            plain: true,
        })
        .unwrap();
        assert_eq!(
            value,
            StoreValue::Struct(vec![
                ("k".to_owned(), StoreValue::Str("v".to_owned())),
                ("plain".to_owned(), StoreValue::Bool(true)),
            ])
        );
    }

    #[test]
    fn test_sequences_and_tuples() {
        assert_eq!(
            to_store_value(&vec![1i64, 2]).unwrap(),
            StoreValue::Seq(vec![StoreValue::Int(1), StoreValue::Int(2)])
        );
        assert_eq!(
            to_store_value(&(4i32, "x")).unwrap(),
            StoreValue::Seq(vec![StoreValue::Int(4), StoreValue::Str("x".to_owned())])
        );
        assert_eq!(
            to_store_value(&[true, false]).unwrap(),
            StoreValue::Seq(vec![StoreValue::Bool(true), StoreValue::Bool(false)])
        );
    }

    #[test]
    fn test_map_keeps_entry_kinds() {
        let mut map = BTreeMap::new();
        map.insert(2i32, "b".to_owned());
        map.insert(1i32, "a".to_owned());
        assert_eq!(
            to_store_value(&map).unwrap(),
            StoreValue::Map(vec![
                (StoreValue::Int(1), StoreValue::Str("a".to_owned())),
                (StoreValue::Int(2), StoreValue::Str("b".to_owned())),
            ])
        );
    }

    #[test]
    fn test_enum_conventions() {
        assert_eq!(
            to_store_value(&Mode::Fast).unwrap(),
            StoreValue::Str("Fast".to_owned())
        );
        assert_eq!(
            to_store_value(&Mode::Custom(3)).unwrap(),
            StoreValue::Map(vec![(
                StoreValue::Str("Custom".to_owned()),
                StoreValue::UInt(3)
            )])
        );
        assert_eq!(
            to_store_value(&Mode::Tuned { level: -1 }).unwrap(),
            StoreValue::Map(vec![(
                StoreValue::Str("Tuned".to_owned()),
                StoreValue::Struct(vec![("level".to_owned(), StoreValue::Int(-1))])
            )])
        );
    }

    #[test]
    fn test_raw_bytes() {
        let raw = bytes::Bytes::from_static(b"\x00\x01binary");
        assert_eq!(
            to_store_value(&raw).unwrap(),
            StoreValue::Bytes(b"\x00\x01binary".to_vec())
        );
    }

    #[test]
    fn test_nested_composite() {
        #[derive(Serialize)]
        struct Outer {
            inner: Plain,
            tags: Vec<String>,
        }
        let value = to_store_value(&Outer {
            inner: Plain {
                x: 5,
                y: "n".to_owned(),
            },
            tags: vec!["a".to_owned()],
        })
        .unwrap();
        assert_eq!(
            value,
            StoreValue::Struct(vec![
                (
                    "inner".to_owned(),
                    StoreValue::Struct(vec![
                        ("x".to_owned(), StoreValue::Int(5)),
                        ("y".to_owned(), StoreValue::Str("n".to_owned())),
                    ])
                ),
                (
                    "tags".to_owned(),
                    StoreValue::Seq(vec![StoreValue::Str("a".to_owned())])
                ),
            ])
        );
    }
}
