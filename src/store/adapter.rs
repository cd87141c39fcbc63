use crate::store::entry::CacheEntry;
use anyhow::Error as AnyError;
use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;
pub type StoreOpenFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Arc<dyn AssetStore>, StoreError>> + Send + 'a>>;

#[derive(Debug)]
pub enum StoreError {
    /// The platform has no usable persistent store.
    Unavailable,
    /// A backend operation failed after the store was opened.
    Backend(AnyError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "persistent store is unavailable"),
            StoreError::Backend(err) => write!(f, "store backend error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Unavailable => None,
            StoreError::Backend(err) => Some(err.as_ref()),
        }
    }
}

/// Async key-value collaborator holding cached assets.
///
/// Each operation is independently atomic; the engine issues concurrent
/// operations against a shared handle without any external locking. Absence of
/// a key is never an error: `get` yields `Ok(None)` and `delete` succeeds.
pub trait AssetStore: Send + Sync + 'static {
    /// Looks up the entry stored under `key`.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CacheEntry>>;

    /// Inserts the entry, replacing any previous entry under the same key.
    fn put(&self, entry: CacheEntry) -> StoreFuture<'_, ()>;

    /// Removes the entry under `key`, if present.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    /// Removes every entry in the collection.
    fn clear(&self) -> StoreFuture<'_, ()>;

    /// Returns every key currently present in the collection.
    ///
    /// Backends without native bulk listing emulate it internally so callers
    /// can always rely on this method.
    fn list_keys(&self) -> StoreFuture<'_, Vec<String>>;
}

impl std::fmt::Debug for dyn AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStore").finish_non_exhaustive()
    }
}

/// Opens a named store and hands back a shared handle to one of its
/// collections. Opening is the only store step the engine runs under a
/// deadline.
pub trait StoreBackend: Send + Sync {
    fn open<'a>(&'a self, store_name: &'a str, collection_name: &'a str) -> StoreOpenFuture<'a>;
}
