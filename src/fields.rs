//! Field-to-storage-key binding for struct values.
//!
//! Struct fields reach the store under their serde-visible names, so
//! `#[serde(rename = "...")]` picks the storage key. A field renamed to
//! exactly `"-"` stays in memory but never travels. Any other name keeps
//! only the part before the first comma, dropping inline metadata; an
//! empty leading part suppresses the field. `"-,"` therefore binds the
//! literal key `"-"`.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::value::StoreValue;

/// A struct field paired with the storage key it binds to, if any.
#[derive(Debug)]
pub(crate) struct BoundField {
    /// The field's serde name, as the merged value tree spells it.
    pub name: String,
    /// Key used on the remote side. `None` keeps the field local.
    pub key: Option<String>,
    pub value: StoreValue,
}

/// Resolve the storage key for a serde field name. `None` means the field
/// does not travel.
pub(crate) fn storage_key(name: &str) -> Option<&str> {
    // The suppress marker is the whole name, checked before comma handling.
    if name == "-" {
        return None;
    }
    let stem = match name.split_once(',') {
        Some((stem, _)) => stem,
        None => name,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// Bind every field of a struct tree to its storage key, rejecting
/// key collisions up front.
pub(crate) fn bind(fields: Vec<(String, StoreValue)>) -> Result<Vec<BoundField>> {
    let mut seen = HashSet::new();
    let mut bound = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let key = match storage_key(&name) {
            Some(stem) => {
                if !seen.insert(stem.to_owned()) {
                    return Err(Error::DuplicateKey {
                        key: stem.to_owned(),
                    });
                }
                Some(stem.to_owned())
            }
            None => None,
        };
        bound.push(BoundField { name, key, value });
    }
    Ok(bound)
}
