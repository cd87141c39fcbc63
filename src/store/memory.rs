//! In-memory store backend. Useful for embedders without durable storage and
//! for exercising cache behaviour in tests.

use crate::store::adapter::{AssetStore, StoreBackend, StoreError, StoreFuture, StoreOpenFuture};
use crate::store::entry::CacheEntry;
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Store handle over a shared in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("memory store lock poisoned")))
    }
}

impl AssetStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CacheEntry>> {
        Box::pin(async move { Ok(self.lock()?.get(key).cloned()) })
    }

    fn put(&self, entry: CacheEntry) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.lock()?.insert(entry.key().to_owned(), entry);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.lock()?.remove(key);
            Ok(())
        })
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.lock()?.clear();
            Ok(())
        })
    }

    fn list_keys(&self) -> StoreFuture<'_, Vec<String>> {
        Box::pin(async move { Ok(self.lock()?.keys().cloned().collect()) })
    }
}

/// Backend that hands out shared [`MemoryStore`] handles, keyed by store and
/// collection name, so repeated opens observe the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    stores: Arc<Mutex<HashMap<(String, String), MemoryStore>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn open<'a>(&'a self, store_name: &'a str, collection_name: &'a str) -> StoreOpenFuture<'a> {
        Box::pin(async move {
            let mut stores = self
                .stores
                .lock()
                .map_err(|_| StoreError::Backend(anyhow!("memory backend lock poisoned")))?;
            let store = stores
                .entry((store_name.to_owned(), collection_name.to_owned()))
                .or_default()
                .clone();
            Ok(Arc::new(store) as Arc<dyn AssetStore>)
        })
    }
}
