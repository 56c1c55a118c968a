//! Typed read and write operations over a [`StoreCommands`] backend.
//!
//! [`Client`] inspects values through serde and routes them to the command
//! shape they fit: scalars become single keys, structs and maps become
//! hashes, sequences become lists or sets. Reads probe the destination the
//! same way, fetch, and merge the reply over the destination's current
//! contents before decoding.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::codec;
use crate::error::{Error, Result};
use crate::fields;
use crate::options::{CollectionKind, Options, Overrides};
use crate::store::StoreCommands;
use crate::value::{accepts_empty_seq, from_store_value, to_store_value, StoreValue};

/// Typed convenience layer over a store client.
///
/// Every operation comes in a plain form using the client's baseline
/// [`Options`] and a `_with` form layering call-scoped [`Overrides`] on top.
/// Reads take `&mut T` and merge fetched data over the destination's current
/// contents; writes take `&T`.
#[derive(Debug, Clone)]
pub struct Client<S> {
    store: S,
    options: Options,
}

impl<S> Client<S> {
    /// Wrap a store with default options.
    pub fn new(store: S) -> Self {
        Self::with_options(store, Options::default())
    }

    /// Wrap a store with an explicit baseline.
    pub fn with_options(store: S, options: Options) -> Self {
        Self { store, options }
    }

    /// The baseline options applied to every call.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl<S: StoreCommands> Client<S> {
    /// Read the value at `key` into `dest`, routing on the destination's
    /// shape: struct destinations read hash fields, maps read the whole
    /// hash, sequences read a list range or set members, everything else
    /// reads a single key.
    pub async fn get_value<T>(&self, key: &str, dest: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.get_value_with(key, dest, Overrides::new()).await
    }

    /// [`get_value`](Self::get_value) with call-scoped overrides.
    pub async fn get_value_with<T>(
        &self,
        key: &str,
        dest: &mut T,
        overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let options = self.options.apply(&overrides);
        match to_store_value(dest)? {
            StoreValue::Struct(members) => self.read_struct(key, dest, members).await,
            StoreValue::Map(entries) => self.read_map(key, dest, entries).await,
            StoreValue::Seq(items) => self.read_seq(key, dest, items, &options).await,
            _ => self.read_single(key, dest).await,
        }
    }

    /// Write `value` under `key`, routing on its shape: maps and structs
    /// become hashes, sequences become a list or set, everything else a
    /// single key.
    pub async fn set_value<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set_value_with(key, value, Overrides::new()).await
    }

    /// [`set_value`](Self::set_value) with call-scoped overrides.
    pub async fn set_value_with<T>(&self, key: &str, value: &T, overrides: Overrides) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let options = self.options.apply(&overrides);
        match to_store_value(value)? {
            StoreValue::Map(entries) => self.write_map(key, entries, &options).await,
            StoreValue::Struct(members) => self.write_struct(key, members, &options).await,
            StoreValue::Seq(items) => self.write_seq(key, items, &options).await,
            node => self.write_single(key, &node, &options).await,
        }
    }

    /// Read a single key into `dest`, whatever its shape. Composite
    /// destinations decode from the stored JSON payload.
    pub async fn get_single_value<T>(&self, key: &str, dest: &mut T) -> Result<()>
    where
        T: DeserializeOwned,
    {
        self.get_single_value_with(key, dest, Overrides::new()).await
    }

    /// [`get_single_value`](Self::get_single_value) with call-scoped
    /// overrides. No option affects a single read; the form exists for
    /// call-site symmetry.
    pub async fn get_single_value_with<T>(
        &self,
        key: &str,
        dest: &mut T,
        _overrides: Overrides,
    ) -> Result<()>
    where
        T: DeserializeOwned,
    {
        self.read_single(key, dest).await
    }

    /// Write any value as a single key. Composites are stored as their JSON
    /// payload.
    pub async fn set_single_value<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set_single_value_with(key, value, Overrides::new()).await
    }

    /// [`set_single_value`](Self::set_single_value) with call-scoped
    /// overrides.
    pub async fn set_single_value_with<T>(
        &self,
        key: &str,
        value: &T,
        overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let options = self.options.apply(&overrides);
        let node = to_store_value(value)?;
        self.write_single(key, &node, &options).await
    }

    /// Read a stored list range or set members into a sequence destination.
    /// Fails before any command if `dest` is not sequence-shaped.
    pub async fn get_slice_value<T>(&self, key: &str, dest: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.get_slice_value_with(key, dest, Overrides::new()).await
    }

    /// [`get_slice_value`](Self::get_slice_value) with call-scoped overrides.
    pub async fn get_slice_value_with<T>(
        &self,
        key: &str,
        dest: &mut T,
        overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let options = self.options.apply(&overrides);
        match to_store_value(dest)? {
            StoreValue::Seq(items) => self.read_seq(key, dest, items, &options).await,
            other => Err(Error::shape("sequence", other.shape())),
        }
    }

    /// Write a sequence as a list or set. Fails before any command if
    /// `value` is not sequence-shaped.
    pub async fn set_slice_value<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set_slice_value_with(key, value, Overrides::new()).await
    }

    /// [`set_slice_value`](Self::set_slice_value) with call-scoped overrides.
    pub async fn set_slice_value_with<T>(
        &self,
        key: &str,
        value: &T,
        overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let options = self.options.apply(&overrides);
        match to_store_value(value)? {
            StoreValue::Seq(items) => self.write_seq(key, items, &options).await,
            other => Err(Error::shape("sequence", other.shape())),
        }
    }

    /// Read hash fields into a struct destination. Fails before any command
    /// if `dest` is not struct-shaped.
    pub async fn get_struct_value<T>(&self, key: &str, dest: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.get_struct_value_with(key, dest, Overrides::new()).await
    }

    /// [`get_struct_value`](Self::get_struct_value) with call-scoped
    /// overrides.
    pub async fn get_struct_value_with<T>(
        &self,
        key: &str,
        dest: &mut T,
        _overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        match to_store_value(dest)? {
            StoreValue::Struct(members) => self.read_struct(key, dest, members).await,
            other => Err(Error::shape("struct", other.shape())),
        }
    }

    /// Write a struct's bound fields as a hash. Fails before any command if
    /// `value` is not struct-shaped.
    pub async fn set_struct_value<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set_struct_value_with(key, value, Overrides::new()).await
    }

    /// [`set_struct_value`](Self::set_struct_value) with call-scoped
    /// overrides.
    pub async fn set_struct_value_with<T>(
        &self,
        key: &str,
        value: &T,
        overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let options = self.options.apply(&overrides);
        match to_store_value(value)? {
            StoreValue::Struct(members) => self.write_struct(key, members, &options).await,
            other => Err(Error::shape("struct", other.shape())),
        }
    }

    /// Read a whole hash into a map destination, merging fetched entries
    /// over the destination's current ones. Fails before any command if
    /// `dest` is not map-shaped.
    pub async fn get_map_value<T>(&self, key: &str, dest: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.get_map_value_with(key, dest, Overrides::new()).await
    }

    /// [`get_map_value`](Self::get_map_value) with call-scoped overrides.
    pub async fn get_map_value_with<T>(
        &self,
        key: &str,
        dest: &mut T,
        _overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        match to_store_value(dest)? {
            StoreValue::Map(entries) => self.read_map(key, dest, entries).await,
            other => Err(Error::shape("map", other.shape())),
        }
    }

    /// Write a map as a hash. Fails before any command if `value` is not
    /// map-shaped.
    pub async fn set_map_value<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set_map_value_with(key, value, Overrides::new()).await
    }

    /// [`set_map_value`](Self::set_map_value) with call-scoped overrides.
    pub async fn set_map_value_with<T>(
        &self,
        key: &str,
        value: &T,
        overrides: Overrides,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let options = self.options.apply(&overrides);
        match to_store_value(value)? {
            StoreValue::Map(entries) => self.write_map(key, entries, &options).await,
            other => Err(Error::shape("map", other.shape())),
        }
    }

    async fn read_single<T>(&self, key: &str, dest: &mut T) -> Result<()>
    where
        T: DeserializeOwned,
    {
        debug!("GET {}", key);
        let payload = match self.store.get(key).await? {
            Some(payload) => payload,
            None => return Err(Error::Missing { key: key.to_owned() }),
        };
        *dest = from_store_value(codec::leaf(payload))?;
        Ok(())
    }

    async fn read_struct<T>(
        &self,
        key: &str,
        dest: &mut T,
        members: Vec<(String, StoreValue)>,
    ) -> Result<()>
    where
        T: DeserializeOwned,
    {
        let bound = fields::bind(members)?;
        let keys: Vec<String> = bound.iter().filter_map(|field| field.key.clone()).collect();
        if keys.is_empty() {
            return Ok(());
        }

        debug!("HMGET {} for {} fields", key, keys.len());
        let reply = self.store.hmget(key, &keys).await?;
        if reply.len() != keys.len() {
            return Err(Error::Arity {
                requested: keys.len(),
                returned: reply.len(),
            });
        }

        // Merge the reply over the probe: fetched slots replace field
        // values, nil slots and suppressed fields keep what was there.
        let mut slots = reply.into_iter();
        let mut merged = Vec::with_capacity(bound.len());
        for field in bound {
            let value = if field.key.is_some() {
                match slots.next().flatten() {
                    Some(payload) => codec::leaf(payload),
                    None => field.value,
                }
            } else {
                field.value
            };
            merged.push((field.name, value));
        }
        *dest = from_store_value(StoreValue::Struct(merged))?;
        Ok(())
    }

    async fn read_map<T>(
        &self,
        key: &str,
        dest: &mut T,
        entries: Vec<(StoreValue, StoreValue)>,
    ) -> Result<()>
    where
        T: DeserializeOwned,
    {
        debug!("HGETALL {}", key);
        let reply = self.store.hgetall(key).await?;
        if reply.is_empty() {
            return Ok(());
        }

        let mut merged = entries;
        for (field, payload) in reply {
            let value = codec::leaf(payload);
            let slot = merged.iter_mut().find(|(existing, _)| {
                codec::key_text(existing).map_or(false, |text| text == field)
            });
            match slot {
                Some((_, existing_value)) => *existing_value = value,
                None => merged.push((StoreValue::Str(field), value)),
            }
        }
        *dest = from_store_value(StoreValue::Map(merged))?;
        Ok(())
    }

    async fn read_seq<T>(
        &self,
        key: &str,
        dest: &mut T,
        items: Vec<StoreValue>,
        options: &Options,
    ) -> Result<()>
    where
        T: DeserializeOwned,
    {
        let fetched = match options.collection {
            CollectionKind::Set => {
                debug!("SMEMBERS {}", key);
                self.store.smembers(key).await?
            }
            CollectionKind::List => {
                let (start, stop) = match options.range {
                    Some(range) => (range.start, range.stop),
                    None => (0, items.len() as i64 - 1),
                };
                debug!("LRANGE {} [{}, {}]", key, start, stop);
                self.store.lrange(key, start, stop).await?
            }
        };
        let mut leaves: Vec<StoreValue> = fetched.into_iter().map(codec::leaf).collect();

        if accepts_empty_seq::<T>() {
            // Resizable destination: rebuild from exactly the fetched
            // elements.
            *dest = from_store_value(StoreValue::Seq(leaves))?;
            return Ok(());
        }

        // Fixed-size destination: fetched elements overwrite the leading
        // positions, the prior tail stays.
        if leaves.len() > items.len() {
            return Err(Error::Arity {
                requested: items.len(),
                returned: leaves.len(),
            });
        }
        let fetched_len = leaves.len();
        leaves.extend(items.into_iter().skip(fetched_len));
        *dest = from_store_value(StoreValue::Seq(leaves))?;
        Ok(())
    }

    async fn write_single(&self, key: &str, node: &StoreValue, options: &Options) -> Result<()> {
        let payload = codec::payload(node)?;
        debug!("SET {} ({} bytes)", key, payload.len());
        self.store.set(key, payload, options.expiry.ttl()).await?;
        Ok(())
    }

    async fn write_struct(
        &self,
        key: &str,
        members: Vec<(String, StoreValue)>,
        options: &Options,
    ) -> Result<()> {
        let bound = fields::bind(members)?;
        let mut pairs = Vec::with_capacity(bound.len());
        for field in bound {
            if let Some(field_key) = field.key {
                pairs.push((field_key, codec::payload(&field.value)?));
            }
        }
        if pairs.is_empty() {
            return Ok(());
        }
        debug!("HSET {} with {} fields", key, pairs.len());
        self.store.hset(key, pairs).await?;
        self.arm_expiry(key, options).await
    }

    async fn write_map(
        &self,
        key: &str,
        entries: Vec<(StoreValue, StoreValue)>,
        options: &Options,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut pairs = Vec::with_capacity(entries.len());
        for (entry_key, value) in &entries {
            pairs.push((codec::key_text(entry_key)?, codec::payload(value)?));
        }
        debug!("HSET {} with {} entries", key, pairs.len());
        self.store.hset(key, pairs).await?;
        self.arm_expiry(key, options).await
    }

    async fn write_seq(
        &self,
        key: &str,
        items: Vec<StoreValue>,
        options: &Options,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut payloads = Vec::with_capacity(items.len());
        for item in &items {
            payloads.push(codec::payload(item)?);
        }
        match options.collection {
            CollectionKind::List => {
                debug!("RPUSH {} with {} values", key, payloads.len());
                self.store.rpush(key, payloads).await?;
            }
            CollectionKind::Set => {
                debug!("SADD {} with {} members", key, payloads.len());
                self.store.sadd(key, payloads).await?;
            }
        }
        self.arm_expiry(key, options).await
    }

    /// Arm the TTL after a collection write. An expire failure fails the
    /// whole write even though the data already landed.
    async fn arm_expiry(&self, key: &str, options: &Options) -> Result<()> {
        if let Some(ttl) = options.expiry.ttl() {
            debug!("EXPIRE {} in {:?}", key, ttl);
            self.store.expire(key, ttl).await?;
        }
        Ok(())
    }
}
