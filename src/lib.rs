//! Typed values over a Redis-shaped key-value store.
//!
//! `brine` maps in-memory values to string-oriented storage commands:
//! scalars become single keys, structs and maps become hashes, sequences
//! become lists or sets. Values opt in through serde, so renames and
//! skips control the storage field names, and read destinations keep
//! their current contents wherever the store has nothing newer.
//!
//! ```ignore
//! use brine::{Client, MemoryStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Session {
//!     user: String,
//!     #[serde(rename = "hits")]
//!     visit_count: u64,
//! }
//!
//! let client = Client::new(MemoryStore::new());
//! let session = Session { user: "ada".into(), visit_count: 1 };
//! client.set_value("session:17", &session).await?; // HSET user, hits
//!
//! let mut fetched = Session { user: String::new(), visit_count: 0 };
//! client.get_value("session:17", &mut fetched).await?; // HMGET user, hits
//! ```
//!
//! Any backend plugs in by implementing [`StoreCommands`]; [`MemoryStore`]
//! is the in-process reference implementation.

pub mod client;
mod codec;
pub mod error;
mod fields;
pub mod options;
pub mod stamp;
pub mod store;
pub mod value;

pub use client::Client;
pub use error::{Error, Result};
pub use options::{CollectionKind, Expiry, Options, Overrides, Range};
pub use stamp::{Period, Timestamp};
pub use store::{MemoryStore, StoreCommands, StoreError};
pub use value::StoreValue;
