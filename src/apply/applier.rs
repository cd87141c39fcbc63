use crate::apply::queue::ApplyQueue;
use crate::fetch::client::AssetFetch;
use crate::resolve::pipeline::{resolve, CacheResult, ResolveOrigin};
use crate::runtime::telemetry::Telemetry;
use crate::scan::element::ApplyOutcome;
use crate::scan::task::AssetTask;
use crate::store::adapter::AssetStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;

/// Per-cycle application totals, broken down by payload origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Elements that reached a terminal applied state.
    pub applied: usize,
    /// Elements served from the store.
    pub cache_hits: usize,
    /// Elements served by the fallback fetch.
    pub fetched: usize,
    /// Elements applied with their native locator.
    pub native: usize,
    /// Elements whose completion signal reported a load error.
    pub load_failures: usize,
}

impl ApplyReport {
    fn record(&mut self, origin: ResolveOrigin, outcome: ApplyOutcome) {
        self.applied += 1;
        match origin {
            ResolveOrigin::Hit => self.cache_hits += 1,
            ResolveOrigin::Fallback => self.fetched += 1,
            ResolveOrigin::Degraded => self.native += 1,
        }
        if outcome == ApplyOutcome::Failed {
            self.load_failures += 1;
        }
    }
}

/// Resolves a scan's tasks concurrently and commits the results to their
/// elements under the ordering contract.
///
/// Synchronous tasks are applied strictly in scan order: applying task `i+1`
/// waits for task `i`'s element to signal completion, not merely for its
/// resolution to finish. Asynchronous tasks apply independently as soon as
/// their own resolution lands. A task whose resolution failed is applied with
/// its native locator and never stalls either subset.
pub struct Applier {
    store: Option<Arc<dyn AssetStore>>,
    fetcher: Arc<dyn AssetFetch>,
    telemetry: Arc<Telemetry>,
}

impl Applier {
    pub fn new(
        store: Option<Arc<dyn AssetStore>>,
        fetcher: Arc<dyn AssetFetch>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            store,
            fetcher,
            telemetry,
        }
    }

    /// Resolves and applies every task, returning once each element has
    /// reached a terminal state and reported its completion signal.
    ///
    /// All resolutions, ordered and unordered alike, are launched immediately
    /// so network and store latency overlap across the whole set.
    pub async fn apply_all(&self, tasks: Vec<AssetTask>, now: DateTime<Utc>) -> ApplyReport {
        let (ordered, unordered): (Vec<_>, Vec<_>) =
            tasks.into_iter().partition(|task| task.synchronous());

        let unordered_handles: Vec<_> = unordered
            .into_iter()
            .map(|task| {
                let store = self.store.clone();
                let fetcher = Arc::clone(&self.fetcher);
                let telemetry = Arc::clone(&self.telemetry);
                tokio::spawn(async move {
                    let result = resolve(store.as_ref(), &fetcher, &telemetry, &task, now).await;
                    apply_one(&telemetry, &task, result).await
                })
            })
            .collect();

        let (mut report, unordered_results) = tokio::join!(
            self.apply_ordered(ordered, now),
            join_all(unordered_handles)
        );

        for result in unordered_results {
            match result {
                Ok((origin, outcome)) => report.record(origin, outcome),
                Err(err) => {
                    tracing::error!(error = %err, "unordered apply task aborted");
                }
            }
        }

        self.telemetry.record_applied_elements(report.applied as u64);
        report
    }

    async fn apply_ordered(&self, tasks: Vec<AssetTask>, now: DateTime<Utc>) -> ApplyReport {
        let mut report = ApplyReport::default();
        if tasks.is_empty() {
            return report;
        }

        let queue: Arc<ApplyQueue<(AssetTask, CacheResult)>> = Arc::new(ApplyQueue::new());
        let count = tasks.len();
        for (position, task) in tasks.into_iter().enumerate() {
            let queue = Arc::clone(&queue);
            let store = self.store.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let telemetry = Arc::clone(&self.telemetry);
            tokio::spawn(async move {
                let result = resolve(store.as_ref(), &fetcher, &telemetry, &task, now).await;
                queue.push(position, (task, result)).await;
            });
        }

        // Single consumer. The queue releases results strictly by scan
        // position, and each iteration awaits the element's completion signal
        // before the next position is applied.
        for _ in 0..count {
            let (task, result) = queue.pop_next().await;
            let (origin, outcome) = apply_one(&self.telemetry, &task, result).await;
            report.record(origin, outcome);
        }
        report
    }
}

async fn apply_one(
    telemetry: &Telemetry,
    task: &AssetTask,
    result: CacheResult,
) -> (ResolveOrigin, ApplyOutcome) {
    let origin = result.origin();
    if origin == ResolveOrigin::Degraded {
        telemetry.record_degraded_apply();
        tracing::debug!(key = %task.key(), "applying native locator");
    }

    let outcome = task.element().apply(result.into_apply_target()).await;
    if outcome == ApplyOutcome::Failed {
        tracing::warn!(
            key = %task.key(),
            source = %task.source(),
            "element reported a load error after application"
        );
    }
    (origin, outcome)
}
