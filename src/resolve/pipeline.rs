use crate::fetch::client::AssetFetch;
use crate::resolve::lookup::{lookup, LookupOutcome};
use crate::runtime::telemetry::Telemetry;
use crate::scan::element::ApplyTarget;
use crate::scan::task::AssetTask;
use crate::store::adapter::AssetStore;
use crate::store::entry::CacheEntry;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Where a task's payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOrigin {
    /// Served from the store.
    Hit,
    /// Fetched from the source locator.
    Fallback,
    /// No payload; the element loads natively.
    Degraded,
}

/// Outcome of resolving one task through the cache-or-fetch pipeline.
#[derive(Debug, Clone)]
pub struct CacheResult {
    payload: Option<Bytes>,
    origin: ResolveOrigin,
}

impl CacheResult {
    fn hit(payload: Bytes) -> Self {
        Self {
            payload: Some(payload),
            origin: ResolveOrigin::Hit,
        }
    }

    fn fallback(payload: Bytes) -> Self {
        Self {
            payload: Some(payload),
            origin: ResolveOrigin::Fallback,
        }
    }

    fn degraded() -> Self {
        Self {
            payload: None,
            origin: ResolveOrigin::Degraded,
        }
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    pub fn origin(&self) -> ResolveOrigin {
        self.origin
    }

    pub fn into_apply_target(self) -> ApplyTarget {
        match self.payload {
            Some(payload) => ApplyTarget::Cached(payload),
            None => ApplyTarget::Native,
        }
    }
}

/// Resolves one task: validated lookup first, then a single fetch attempt,
/// then best-effort store population.
///
/// Every failure downgrades the task instead of propagating: a failed fetch
/// degrades to native loading, and a failed store write still yields the
/// fetched payload. With no store handle the session is degraded and the
/// pipeline issues no store operations and no fetches at all.
pub async fn resolve(
    store: Option<&Arc<dyn AssetStore>>,
    fetcher: &Arc<dyn AssetFetch>,
    telemetry: &Telemetry,
    task: &AssetTask,
    now: DateTime<Utc>,
) -> CacheResult {
    let Some(store) = store else {
        return CacheResult::degraded();
    };

    match lookup(store, task, now).await {
        LookupOutcome::Hit(payload) => {
            telemetry.record_cache_hit();
            tracing::debug!(key = %task.key(), "cache hit");
            CacheResult::hit(payload)
        }
        LookupOutcome::Miss => {
            telemetry.record_cache_miss();
            fetch_and_populate(store, fetcher, telemetry, task).await
        }
    }
}

async fn fetch_and_populate(
    store: &Arc<dyn AssetStore>,
    fetcher: &Arc<dyn AssetFetch>,
    telemetry: &Telemetry,
    task: &AssetTask,
) -> CacheResult {
    telemetry.record_fetch();
    tracing::debug!(key = %task.key(), source = %task.source(), "cache miss; fetching from source");

    let payload = match fetcher.fetch(task.source()).await {
        Ok(payload) => payload,
        Err(err) => {
            telemetry.record_fetch_failure();
            tracing::warn!(
                key = %task.key(),
                error = %err,
                "fetch failed; element falls back to native loading"
            );
            return CacheResult::degraded();
        }
    };

    let entry = CacheEntry::new(
        task.key(),
        task.integrity(),
        task.expires_at(),
        payload.clone(),
    );
    if let Err(err) = store.put(entry).await {
        telemetry.record_store_write_failure();
        tracing::warn!(
            key = %task.key(),
            error = %err,
            "failed to cache fetched payload; applying it anyway"
        );
    }

    CacheResult::fallback(payload)
}
