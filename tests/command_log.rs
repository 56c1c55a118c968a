//! Command-level discipline: which commands each operation issues, in what
//! order, and when none are issued at all.

use async_trait::async_trait;
use brine::{
    Client, CollectionKind, Error, Expiry, MemoryStore, Overrides, Range, StoreCommands,
    StoreError,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Store double that forwards to a [`MemoryStore`] and records every
/// command it receives.
#[derive(Clone)]
struct RecordingStore {
    inner: MemoryStore,
    log: Arc<Mutex<Vec<String>>>,
    drop_last_hmget_slot: bool,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            log: Arc::new(Mutex::new(Vec::new())),
            drop_last_hmget_slot: false,
        }
    }

    /// A store whose HMGET replies are one slot short.
    fn short_hmget() -> Self {
        Self {
            drop_last_hmget_slot: true,
            ..Self::new()
        }
    }

    fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn note(&self, command: String) {
        self.log.lock().unwrap().push(command);
    }
}

#[async_trait]
impl StoreCommands for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.note(format!("GET {key}"));
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        match ttl {
            Some(_) => self.note(format!("SET {key} ttl")),
            None => self.note(format!("SET {key}")),
        }
        self.inner.set(key, value, ttl).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.note(format!("EXPIRE {key}"));
        self.inner.expire(key, ttl).await
    }

    async fn hset(&self, key: &str, fields: Vec<(String, Bytes)>) -> Result<(), StoreError> {
        self.note(format!("HSET {key} {}", fields.len()));
        self.inner.hset(key, fields).await
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<Bytes>>, StoreError> {
        self.note(format!("HMGET {key} {}", fields.len()));
        let mut reply = self.inner.hmget(key, fields).await?;
        if self.drop_last_hmget_slot {
            reply.pop();
        }
        Ok(reply)
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>, StoreError> {
        self.note(format!("HGETALL {key}"));
        self.inner.hgetall(key).await
    }

    async fn rpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        self.note(format!("RPUSH {key} {}", values.len()));
        self.inner.rpush(key, values).await
    }

    async fn lpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        self.note(format!("LPUSH {key} {}", values.len()));
        self.inner.lpush(key, values).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError> {
        self.note(format!("LRANGE {key} {start} {stop}"));
        self.inner.lrange(key, start, stop).await
    }

    async fn sadd(&self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        self.note(format!("SADD {key} {}", members.len()));
        self.inner.sadd(key, members).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        self.note(format!("SMEMBERS {key}"));
        self.inner.smembers(key).await
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.note(format!("DEL {key}"));
        self.inner.del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.note(format!("EXISTS {key}"));
        self.inner.exists(key).await
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Job {
    name: String,
    retries: i64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Opaque {
    #[serde(rename = "-")]
    local: i64,
}

#[tokio::test]
async fn test_single_write_embeds_ttl_in_set() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());

    client.set_value("plain", &1i64).await.unwrap();
    client
        .set_value_with(
            "short",
            &2i64,
            Overrides::new().expiry(Expiry::After(Duration::from_secs(60))),
        )
        .await
        .unwrap();

    assert_eq!(store.commands(), ["SET plain", "SET short ttl"]);
}

#[tokio::test]
async fn test_collection_writes_expire_after_the_primary_command() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());
    let expiring = Overrides::new().expiry(Expiry::After(Duration::from_secs(60)));

    client
        .set_slice_value_with("nums", &vec![1i64, 2, 3], expiring)
        .await
        .unwrap();
    client
        .set_struct_value_with(
            "job",
            &Job {
                name: "a".to_owned(),
                retries: 2,
            },
            expiring,
        )
        .await
        .unwrap();

    let mut counts = HashMap::new();
    counts.insert("a".to_owned(), 1i64);
    client.set_map_value_with("counts", &counts, expiring).await.unwrap();

    client
        .set_slice_value_with(
            "tags",
            &vec!["x", "y"],
            expiring.collection(CollectionKind::Set),
        )
        .await
        .unwrap();

    assert_eq!(
        store.commands(),
        [
            "RPUSH nums 3",
            "EXPIRE nums",
            "HSET job 2",
            "EXPIRE job",
            "HSET counts 1",
            "EXPIRE counts",
            "SADD tags 2",
            "EXPIRE tags",
        ]
    );
}

#[tokio::test]
async fn test_never_and_zero_expiries_issue_no_expire() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());

    client.set_slice_value("a", &vec![1i64]).await.unwrap();
    client
        .set_slice_value_with(
            "b",
            &vec![1i64],
            Overrides::new().expiry(Expiry::After(Duration::ZERO)),
        )
        .await
        .unwrap();
    client
        .set_slice_value_with("c", &vec![1i64], Overrides::new().expiry(Expiry::Never))
        .await
        .unwrap();

    assert_eq!(store.commands(), ["RPUSH a 1", "RPUSH b 1", "RPUSH c 1"]);
}

#[tokio::test]
async fn test_empty_writes_issue_no_commands() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());
    let expiring = Overrides::new().expiry(Expiry::After(Duration::from_secs(60)));

    let none: Vec<i64> = Vec::new();
    client.set_slice_value_with("a", &none, expiring).await.unwrap();

    let empty: HashMap<String, i64> = HashMap::new();
    client.set_map_value_with("b", &empty, expiring).await.unwrap();

    client
        .set_value_with("c", &Opaque { local: 3 }, expiring)
        .await
        .unwrap();

    assert!(store.commands().is_empty());
}

#[tokio::test]
async fn test_fully_suppressed_struct_read_is_a_noop() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());

    let mut dest = Opaque { local: 42 };
    client.get_value("nothing", &mut dest).await.unwrap();

    assert!(store.commands().is_empty());
    assert_eq!(dest.local, 42);
}

#[tokio::test]
async fn test_default_range_tracks_destination_length() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());

    let mut empty: Vec<i64> = Vec::new();
    client.get_slice_value("letters", &mut empty).await.unwrap();

    client.set_slice_value("nums", &vec![7i64, 8, 9]).await.unwrap();
    let mut fixed = [0i64; 3];
    client.get_slice_value("nums", &mut fixed).await.unwrap();

    let mut ranged: Vec<i64> = Vec::new();
    client
        .get_slice_value_with("nums", &mut ranged, Overrides::new().range(Range::new(1, 2)))
        .await
        .unwrap();

    assert_eq!(
        store.commands(),
        [
            "LRANGE letters 0 -1",
            "RPUSH nums 3",
            "LRANGE nums 0 2",
            "LRANGE nums 1 2",
        ]
    );
    assert_eq!(fixed, [7, 8, 9]);
    assert_eq!(ranged, [8, 9]);
}

#[tokio::test]
async fn test_set_mode_read_uses_smembers() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());

    let mut tags: Vec<String> = Vec::new();
    client
        .get_slice_value_with(
            "tags",
            &mut tags,
            Overrides::new().collection(CollectionKind::Set),
        )
        .await
        .unwrap();

    assert_eq!(store.commands(), ["SMEMBERS tags"]);
}

#[tokio::test]
async fn test_shape_mismatches_issue_no_commands() {
    let store = RecordingStore::new();
    let client = Client::new(store.clone());

    assert!(client.set_slice_value("k", &7i64).await.is_err());
    assert!(client.set_map_value("k", &7i64).await.is_err());
    let mut number = 0i64;
    assert!(client.get_struct_value("k", &mut number).await.is_err());

    assert!(store.commands().is_empty());
}

#[tokio::test]
async fn test_short_hmget_reply_is_an_arity_error() {
    let store = RecordingStore::short_hmget();
    let client = Client::new(store.clone());

    client
        .set_struct_value(
            "job",
            &Job {
                name: "a".to_owned(),
                retries: 1,
            },
        )
        .await
        .unwrap();

    let mut dest = Job {
        name: String::new(),
        retries: 0,
    };
    let err = client.get_struct_value("job", &mut dest).await.unwrap_err();
    match err {
        Error::Arity {
            requested,
            returned,
        } => {
            assert_eq!(requested, 2);
            assert_eq!(returned, 1);
        }
        other => panic!("expected arity error, got {other:?}"),
    }
}
