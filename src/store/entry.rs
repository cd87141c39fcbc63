use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A single cached asset: cache identity, validation token, optional expiry,
/// and the raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    key: String,
    integrity: String,
    expires_at: Option<DateTime<Utc>>,
    payload: Bytes,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        integrity: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        payload: Bytes,
    ) -> Self {
        Self {
            key: key.into(),
            integrity: integrity.into(),
            expires_at,
            payload,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn integrity(&self) -> &str {
        &self.integrity
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// An entry is expired once its expiry instant is at or before `now`.
    /// Entries without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn matches_integrity(&self, token: &str) -> bool {
        self.integrity == token
    }
}
