//! Encoding between value-model nodes and store payloads.
//!
//! Scalars travel as their text form, raw bytes verbatim, and every other
//! composite as JSON text. Fetched payloads come back as string leaves when
//! they are UTF-8 and byte leaves otherwise; the merge deserializer takes
//! it from there.

use bytes::Bytes;

use crate::error::Result;
use crate::value::StoreValue;

/// Text form of a scalar leaf: booleans as true/false, integers base-10,
/// floats in shortest round-trippable form, strings verbatim, null empty.
/// Composites and raw bytes have no text form.
pub(crate) fn scalar_text(value: &StoreValue) -> Option<String> {
    match value {
        StoreValue::Null => Some(String::new()),
        StoreValue::Bool(v) => Some(v.to_string()),
        StoreValue::Int(v) => Some(v.to_string()),
        StoreValue::UInt(v) => Some(v.to_string()),
        StoreValue::Float(v) => Some(v.to_string()),
        StoreValue::Str(v) => Some(v.clone()),
        _ => None,
    }
}

/// Byte payload submitted for a node.
pub(crate) fn payload(value: &StoreValue) -> Result<Bytes> {
    if let StoreValue::Bytes(raw) = value {
        return Ok(Bytes::copy_from_slice(raw));
    }
    match scalar_text(value) {
        Some(text) => Ok(Bytes::from(text)),
        None => Ok(Bytes::from(serde_json::to_string(value)?)),
    }
}

/// Hash field name submitted for a map key. Scalar keys use their text
/// form, composite keys their JSON text, byte keys must be UTF-8.
pub(crate) fn key_text(value: &StoreValue) -> Result<String> {
    if let Some(text) = scalar_text(value) {
        return Ok(text);
    }
    if let StoreValue::Bytes(raw) = value {
        return String::from_utf8(raw.clone()).map_err(|_| {
            crate::error::Error::parse(String::from_utf8_lossy(raw).into_owned(), "utf-8 key")
        });
    }
    Ok(serde_json::to_string(value)?)
}

/// Turn a fetched payload into a leaf the deserializer understands.
pub(crate) fn leaf(payload: Bytes) -> StoreValue {
    match String::from_utf8(Vec::from(payload)) {
        Ok(text) => StoreValue::Str(text),
        Err(err) => StoreValue::Bytes(err.into_bytes()),
    }
}
