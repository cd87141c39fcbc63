use crate::scan::element::ResourceElement;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One unit of work for the resolution pipeline, built from a scanned element
/// and consumed exactly once.
#[derive(Clone)]
pub struct AssetTask {
    key: String,
    source: String,
    integrity: String,
    synchronous: bool,
    expires_at: Option<DateTime<Utc>>,
    element: Arc<dyn ResourceElement>,
}

impl AssetTask {
    pub fn new(
        key: impl Into<String>,
        source: impl Into<String>,
        integrity: impl Into<String>,
        synchronous: bool,
        expires_at: Option<DateTime<Utc>>,
        element: Arc<dyn ResourceElement>,
    ) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            integrity: integrity.into(),
            synchronous,
            expires_at,
            element,
        }
    }

    /// Cache identity of the asset.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Locator used for the fallback fetch.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Token a stored entry must match to count as fresh.
    pub fn integrity(&self) -> &str {
        &self.integrity
    }

    /// Whether the task belongs to the strictly ordered subset.
    pub fn synchronous(&self) -> bool {
        self.synchronous
    }

    /// Absolute instant after which a stored entry is stale.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Element the resolved payload is applied to.
    pub fn element(&self) -> &Arc<dyn ResourceElement> {
        &self.element
    }
}

impl std::fmt::Debug for AssetTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetTask")
            .field("key", &self.key)
            .field("source", &self.source)
            .field("integrity", &self.integrity)
            .field("synchronous", &self.synchronous)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
