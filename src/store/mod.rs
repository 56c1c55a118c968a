//! Store seam: the command vocabulary trait and the in-memory
//! implementation.
//!
//! Real client libraries plug in by implementing [`StoreCommands`]; the
//! typed layer never issues anything outside this vocabulary.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::{StoreCommands, StoreError};
