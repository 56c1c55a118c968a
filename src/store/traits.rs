use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Command vocabulary the typed layer issues against a store.
///
/// This is the integration point for real client libraries: implement it by
/// forwarding each method to the corresponding command. All operations are
/// async and thread-safe; implementations handle their own concurrency and
/// expiry cleanup. `MemoryStore` is the in-process reference implementation.
#[async_trait]
pub trait StoreCommands: Send + Sync {
    /// Fetch the payload at a string key. Returns None if the key doesn't
    /// exist or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Store a payload at a string key, replacing any previous value of any
    /// kind. A TTL arms expiry in the same command.
    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Arm a TTL on an existing key. Returns false if the key doesn't exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Set hash fields, creating the hash as needed.
    async fn hset(&self, key: &str, fields: Vec<(String, Bytes)>) -> Result<(), StoreError>;

    /// Fetch the named hash fields. Absent fields yield None in place, so
    /// the reply always has one slot per requested field.
    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<Bytes>>, StoreError>;

    /// Fetch every field of a hash. An absent key yields an empty reply.
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>, StoreError>;

    /// Append values to the tail of a list. Returns the new length.
    async fn rpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError>;

    /// Prepend values to the head of a list, one by one. Returns the new
    /// length.
    async fn lpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError>;

    /// Fetch list elements from start to stop, inclusive. Negative indices
    /// count back from the tail.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError>;

    /// Add members to a set. Returns how many were newly added.
    async fn sadd(&self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError>;

    /// Fetch every member of a set, in arbitrary order.
    async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, StoreError>;

    /// Delete a key of any kind. Returns true if it existed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;

    /// Check whether a key exists and is not expired.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Store operation failed: {0}")]
    Operation(String),
}

#[async_trait]
impl<S: StoreCommands + ?Sized> StoreCommands for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).expire(key, ttl).await
    }

    async fn hset(&self, key: &str, fields: Vec<(String, Bytes)>) -> Result<(), StoreError> {
        (**self).hset(key, fields).await
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<Bytes>>, StoreError> {
        (**self).hmget(key, fields).await
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>, StoreError> {
        (**self).hgetall(key).await
    }

    async fn rpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        (**self).rpush(key, values).await
    }

    async fn lpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        (**self).lpush(key, values).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError> {
        (**self).lrange(key, start, stop).await
    }

    async fn sadd(&self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        (**self).sadd(key, members).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        (**self).smembers(key).await
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        (**self).del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists(key).await
    }
}

#[async_trait]
impl<S: StoreCommands + ?Sized> StoreCommands for Box<S> {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).expire(key, ttl).await
    }

    async fn hset(&self, key: &str, fields: Vec<(String, Bytes)>) -> Result<(), StoreError> {
        (**self).hset(key, fields).await
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<Bytes>>, StoreError> {
        (**self).hmget(key, fields).await
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>, StoreError> {
        (**self).hgetall(key).await
    }

    async fn rpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        (**self).rpush(key, values).await
    }

    async fn lpush(&self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        (**self).lpush(key, values).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError> {
        (**self).lrange(key, start, stop).await
    }

    async fn sadd(&self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        (**self).sadd(key, members).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        (**self).smembers(key).await
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        (**self).del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists(key).await
    }
}
