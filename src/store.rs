//! Persistent key-value storage for cached assets: the store trait, the entry
//! record, and the SQLite and in-memory backends.

pub mod adapter;
pub mod entry;
pub mod memory;
pub mod sqlite;

pub use adapter::{AssetStore, StoreBackend, StoreError, StoreFuture, StoreOpenFuture};
pub use entry::CacheEntry;
pub use memory::{MemoryBackend, MemoryStore};
pub use sqlite::SqliteBackend;
