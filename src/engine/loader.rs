use crate::apply::applier::Applier;
use crate::engine::guard::InstanceGuard;
use crate::fetch::client::{AssetFetch, HttpFetcher};
use crate::fetch::options::FetchOptions;
use crate::runtime::config::LoaderConfig;
use crate::runtime::telemetry::Telemetry;
use crate::scan::element::{ElementProvider, ResourceElement};
use crate::scan::scanner::build_tasks;
use crate::store::adapter::{AssetStore, StoreBackend};
use crate::store::sqlite::SqliteBackend;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Summary of one load cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Elements inspected by the scan.
    pub scanned: usize,
    /// Elements skipped as already processed or sourceless.
    pub skipped: usize,
    /// Elements applied this cycle.
    pub applied: usize,
    /// Elements served from the store.
    pub cache_hits: usize,
    /// Elements served by the fallback fetch.
    pub fetched: usize,
    /// Elements applied with their native locator.
    pub native: usize,
    /// Elements whose completion signal reported a load error.
    pub load_failures: usize,
    /// Store entries removed by the post-cycle prune.
    pub pruned: usize,
}

/// The public orchestrator: scans a page surface, resolves each element
/// through the cache-or-fetch pipeline, and applies the results under the
/// ordering contract.
///
/// Exactly one loader may be alive per process; a second
/// [`AssetLoader::initialize`] fails with
/// [`AlreadyInitialized`](crate::engine::guard::AlreadyInitialized) until the
/// first is dropped. A session whose store cannot be opened runs degraded:
/// every element loads natively and maintenance operations are no-ops.
///
/// Overlapping [`AssetLoader::load`] calls are not serialized here; callers
/// that may start a new cycle before the previous one settles must provide
/// their own serialization.
pub struct AssetLoader {
    config: LoaderConfig,
    provider: Arc<dyn ElementProvider>,
    store: Option<Arc<dyn AssetStore>>,
    applier: Applier,
    telemetry: Arc<Telemetry>,
    _guard: InstanceGuard,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AssetLoader {
    /// Builds a loader with the default collaborators: a SQLite store under
    /// the configured data directory and an HTTP fetcher.
    pub async fn initialize(
        config: LoaderConfig,
        provider: Arc<dyn ElementProvider>,
    ) -> Result<Self> {
        let backend = Arc::new(SqliteBackend::new(config.data_dir()));
        let fetcher = Arc::new(
            HttpFetcher::with_options(FetchOptions {
                timeout: config.fetch_timeout(),
                ..FetchOptions::default()
            })
            .context("failed to build asset fetcher")?,
        );
        Self::with_collaborators(config, provider, backend, fetcher).await
    }

    /// Builds a loader with injected store and fetch collaborators.
    pub async fn with_collaborators(
        config: LoaderConfig,
        provider: Arc<dyn ElementProvider>,
        backend: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn AssetFetch>,
    ) -> Result<Self> {
        let guard = InstanceGuard::acquire()?;
        let telemetry = Arc::new(Telemetry::default());

        let store = open_store(&config, backend.as_ref()).await;
        tracing::info!(
            store = %config.store_name(),
            collection = %config.collection_name(),
            degraded = store.is_none(),
            "asset loader initialized"
        );

        let applier = Applier::new(store.clone(), fetcher, Arc::clone(&telemetry));
        Ok(Self {
            config,
            provider,
            store,
            applier,
            telemetry,
            _guard: guard,
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// True when the session runs without a persistent store.
    pub fn degraded(&self) -> bool {
        self.store.is_none()
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        Arc::clone(&self.telemetry)
    }

    /// Runs one load cycle over the given elements, or over everything the
    /// provider discovers for the configured tags when `None`.
    ///
    /// Resolves once every element has reached a terminal state and reported
    /// its completion signal. When pruning is enabled, entries whose keys are
    /// absent from this scan's live set are removed afterwards.
    pub async fn load(
        &self,
        elements: Option<Vec<Arc<dyn ResourceElement>>>,
    ) -> LoadReport {
        let elements =
            elements.unwrap_or_else(|| self.provider.discover(self.config.tags()));
        let now = Utc::now();

        // The live key set covers every element with a source, including ones
        // already processed in an earlier cycle: their entries must survive a
        // prune.
        let live_keys: Vec<String> = elements
            .iter()
            .map(|element| element.descriptor())
            .filter(|descriptor| !descriptor.source.trim().is_empty())
            .map(|descriptor| descriptor.key.unwrap_or(descriptor.source))
            .collect();

        let scanned = elements.len();
        let outcome = build_tasks(&elements, &self.config, now);
        let skipped = outcome.skipped;
        let apply = self.applier.apply_all(outcome.tasks, now).await;

        let mut pruned = 0;
        if self.config.prune() {
            match self.prune(&live_keys).await {
                Ok(count) => pruned = count,
                Err(err) => {
                    tracing::warn!(error = %err, "post-cycle prune failed");
                }
            }
        }

        let report = LoadReport {
            scanned,
            skipped,
            applied: apply.applied,
            cache_hits: apply.cache_hits,
            fetched: apply.fetched,
            native: apply.native,
            load_failures: apply.load_failures,
            pruned,
        };
        tracing::info!(
            target: "restash::metrics",
            scanned = report.scanned,
            skipped = report.skipped,
            applied = report.applied,
            cache_hits = report.cache_hits,
            fetched = report.fetched,
            native = report.native,
            load_failures = report.load_failures,
            pruned = report.pruned,
            "load cycle complete"
        );
        report
    }

    /// Removes the entry stored under `key`. A no-op in degraded mode.
    pub async fn delete_by_key(&self, key: &str) -> Result<()> {
        let Some(store) = &self.store else {
            tracing::debug!(key, "delete skipped; session is degraded");
            return Ok(());
        };
        store
            .delete(key)
            .await
            .with_context(|| format!("failed to delete entry {key}"))
    }

    /// Deletes every stored key absent from `live_keys` and returns the
    /// number removed. A no-op in degraded mode.
    pub async fn prune(&self, live_keys: &[String]) -> Result<usize> {
        let Some(store) = &self.store else {
            tracing::debug!("prune skipped; session is degraded");
            return Ok(0);
        };

        let live: HashSet<&str> = live_keys.iter().map(String::as_str).collect();
        let mut pruned = 0usize;
        for key in store.list_keys().await.context("failed to list store keys")? {
            if live.contains(key.as_str()) {
                continue;
            }
            store
                .delete(&key)
                .await
                .with_context(|| format!("failed to prune entry {key}"))?;
            tracing::debug!(key = %key, "pruned entry absent from live set");
            pruned += 1;
        }

        self.telemetry.record_pruned_keys(pruned as u64);
        if pruned > 0 {
            tracing::info!(pruned, "pruned store entries");
        }
        Ok(pruned)
    }

    /// Removes every entry in the collection. A no-op in degraded mode.
    pub async fn clear(&self) -> Result<()> {
        let Some(store) = &self.store else {
            tracing::debug!("clear skipped; session is degraded");
            return Ok(());
        };
        store.clear().await.context("failed to clear store")
    }
}

async fn open_store(
    config: &LoaderConfig,
    backend: &dyn StoreBackend,
) -> Option<Arc<dyn AssetStore>> {
    let open = backend.open(config.store_name(), config.collection_name());
    match tokio::time::timeout(config.open_timeout(), open).await {
        Ok(Ok(store)) => Some(store),
        Ok(Err(err)) => {
            tracing::warn!(
                error = %err,
                "persistent store unavailable; session degrades to network-native loading"
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = config.open_timeout().as_millis() as u64,
                "store open did not answer in time; session degrades to network-native loading"
            );
            None
        }
    }
}
