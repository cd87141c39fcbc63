use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters used to derive per-session cache metrics.
#[derive(Default, Debug)]
pub struct Telemetry {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    store_write_failures: AtomicU64,
    degraded_applies: AtomicU64,
    applied_elements: AtomicU64,
    pruned_keys: AtomicU64,
}

impl Telemetry {
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_write_failure(&self) {
        self.store_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded_apply(&self) {
        self.degraded_applies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied_elements(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.applied_elements.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_pruned_keys(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.pruned_keys.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            store_write_failures: self.store_write_failures.load(Ordering::Relaxed),
            degraded_applies: self.degraded_applies.load(Ordering::Relaxed),
            applied_elements: self.applied_elements.load(Ordering::Relaxed),
            pruned_keys: self.pruned_keys.load(Ordering::Relaxed),
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    pub fn store_write_failures(&self) -> u64 {
        self.store_write_failures.load(Ordering::Relaxed)
    }

    pub fn degraded_applies(&self) -> u64 {
        self.degraded_applies.load(Ordering::Relaxed)
    }

    pub fn applied_elements(&self) -> u64 {
        self.applied_elements.load(Ordering::Relaxed)
    }

    pub fn pruned_keys(&self) -> u64 {
        self.pruned_keys.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TelemetrySnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub store_write_failures: u64,
    pub degraded_applies: u64,
    pub applied_elements: u64,
    pub pruned_keys: u64,
}
