use crate::scan::task::AssetTask;
use crate::store::adapter::AssetStore;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Verdict of a validated store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// A fresh entry matched the task; its payload is ready to apply.
    Hit(Bytes),
    /// No usable entry. Absence, staleness, and store read errors all land
    /// here; a miss is expected control flow, never a failure.
    Miss,
}

/// Looks up the task's key and validates the stored entry against the task.
///
/// A mismatched integrity token leaves the entry in place: the follow-up
/// fetch overwrites it under the same key. Expired entries are evicted best
/// effort before reporting the miss.
pub async fn lookup(
    store: &Arc<dyn AssetStore>,
    task: &AssetTask,
    now: DateTime<Utc>,
) -> LookupOutcome {
    let entry = match store.get(task.key()).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return LookupOutcome::Miss,
        Err(err) => {
            tracing::debug!(key = %task.key(), error = %err, "store read failed; treating as miss");
            return LookupOutcome::Miss;
        }
    };

    if !entry.matches_integrity(task.integrity()) {
        tracing::debug!(
            key = %task.key(),
            stored = %entry.integrity(),
            wanted = %task.integrity(),
            "integrity token changed; treating as miss"
        );
        return LookupOutcome::Miss;
    }

    if entry.is_expired_at(now) {
        if let Err(err) = store.delete(task.key()).await {
            tracing::debug!(key = %task.key(), error = %err, "failed to evict expired entry");
        }
        return LookupOutcome::Miss;
    }

    LookupOutcome::Hit(entry.into_payload())
}
