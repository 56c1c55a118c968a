use super::{StoreCommands, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry payload, tagged by kind the way Redis types its keys.
#[derive(Debug, Clone)]
enum Payload {
    Text(Bytes),
    Hash(HashMap<String, Bytes>),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
}

#[derive(Debug, Clone)]
struct Entry {
    payload: Payload,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(payload: Payload) -> Self {
        Self {
            payload,
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Instant::now() > expires_at
        } else {
            false
        }
    }
}

/// In-memory store with Redis keyspace semantics.
///
/// Kind-tagged entries, per-key TTL with lazy expiry cleanup (expired keys
/// removed on access), WRONGTYPE on kind mismatch. Cloning shares the
/// keyspace, so a clone can be handed to a `Client` while the original
/// stays available for direct inspection in tests.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Count of live keys, removing expired ones on the way.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut expired = Vec::new();
        for entry in self.entries.iter() {
            if entry.value().is_expired() {
                expired.push(entry.key().clone());
            } else {
                count += 1;
            }
        }
        for key in expired {
            self.entries.remove(&key);
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all keys.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remaining TTL of a key, if one is armed.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entry = self.entries.get(key)?;
        let expires_at = entry.expires_at?;
        expires_at.checked_duration_since(Instant::now())
    }

    /// Fetch a live entry, removing it first if it expired.
    fn read(&self, key: &str) -> Option<Ref<'_, String, Entry>> {
        let entry = self.entries.get(key)?;
        if entry.is_expired() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry)
    }
}

#[async_trait]
impl StoreCommands for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.read(key) {
            Some(entry) => match &entry.payload {
                Payload::Text(data) => Ok(Some(data.clone())),
                _ => Err(StoreError::WrongType),
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            payload: Payload::Text(value),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(key.to_owned(), entry);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(false);
            }
            entry.expires_at = Some(Instant::now() + ttl);
            return Ok(true);
        }
        Ok(false)
    }

    async fn hset(&self, key: &str, fields: Vec<(String, Bytes)>) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::new(Payload::Hash(HashMap::new())));
        if entry.is_expired() {
            *entry = Entry::new(Payload::Hash(HashMap::new()));
        }
        match &mut entry.payload {
            Payload::Hash(map) => {
                for (field, value) in fields {
                    map.insert(field, value);
                }
                Ok(())
            }
            _ => Err(StoreError::WrongType),
        }
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<Bytes>>, StoreError> {
        match self.read(key) {
            Some(entry) => match &entry.payload {
                Payload::Hash(map) => Ok(fields.iter().map(|f| map.get(f).cloned()).collect()),
                _ => Err(StoreError::WrongType),
            },
            None => Ok(vec![None; fields.len()]),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>, StoreError> {
        match self.read(key) {
            Some(entry) => match &entry.payload {
                Payload::Hash(map) => {
                    Ok(map.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
                }
                _ => Err(StoreError::WrongType),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn rpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::new(Payload::List(VecDeque::new())));
        if entry.is_expired() {
            *entry = Entry::new(Payload::List(VecDeque::new()));
        }
        match &mut entry.payload {
            Payload::List(list) => {
                for value in values {
                    list.push_back(value);
                }
                Ok(list.len())
            }
            _ => Err(StoreError::WrongType),
        }
    }

    async fn lpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::new(Payload::List(VecDeque::new())));
        if entry.is_expired() {
            *entry = Entry::new(Payload::List(VecDeque::new()));
        }
        match &mut entry.payload {
            Payload::List(list) => {
                for value in values {
                    list.push_front(value);
                }
                Ok(list.len())
            }
            _ => Err(StoreError::WrongType),
        }
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError> {
        match self.read(key) {
            Some(entry) => match &entry.payload {
                Payload::List(list) => {
                    let len = list.len() as i64;
                    let start = if start < 0 { (len + start).max(0) } else { start };
                    let stop = if stop < 0 { len + stop } else { stop };
                    let stop = stop.min(len - 1);
                    if len == 0 || start > stop {
                        return Ok(Vec::new());
                    }
                    Ok(list
                        .iter()
                        .skip(start as usize)
                        .take((stop - start + 1) as usize)
                        .cloned()
                        .collect())
                }
                _ => Err(StoreError::WrongType),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn sadd(&self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::new(Payload::Set(HashSet::new())));
        if entry.is_expired() {
            *entry = Entry::new(Payload::Set(HashSet::new()));
        }
        match &mut entry.payload {
            Payload::Set(set) => {
                let mut added = 0;
                for member in members {
                    if set.insert(member) {
                        added += 1;
                    }
                }
                Ok(added)
            }
            _ => Err(StoreError::WrongType),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        match self.read(key) {
            Some(entry) => match &entry.payload {
                Payload::Set(set) => Ok(set.iter().cloned().collect()),
                _ => Err(StoreError::WrongType),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read(key).is_some())
    }
}
