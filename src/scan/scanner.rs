use crate::runtime::config::LoaderConfig;
use crate::scan::element::{ElementKind, ResourceElement};
use crate::scan::task::AssetTask;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Result of turning scanned elements into resolution work.
#[derive(Debug)]
pub struct ScanOutcome {
    pub tasks: Vec<AssetTask>,
    /// Elements skipped because they were already processed or carry no
    /// source locator.
    pub skipped: usize,
}

/// Builds one [`AssetTask`] per eligible element, preserving surface order.
///
/// Skipped elements never reach the pipeline: re-running a scan after a
/// completed cycle produces no further work. `now` anchors the TTL-derived
/// expiry instants for this cycle.
pub fn build_tasks(
    elements: &[Arc<dyn ResourceElement>],
    config: &LoaderConfig,
    now: DateTime<Utc>,
) -> ScanOutcome {
    let mut tasks = Vec::with_capacity(elements.len());
    let mut skipped = 0usize;

    for element in elements {
        let descriptor = element.descriptor();
        if descriptor.processed {
            tracing::debug!(source = %descriptor.source, "skipping element already processed");
            skipped += 1;
            continue;
        }
        if descriptor.source.trim().is_empty() {
            tracing::debug!(kind = %descriptor.kind, "skipping element without source locator");
            skipped += 1;
            continue;
        }

        let source = descriptor.source;
        let key = descriptor.key.unwrap_or_else(|| source.clone());
        let integrity = descriptor.integrity.unwrap_or_else(|| source.clone());
        let expires_at = descriptor
            .expires_at
            .or_else(|| config.default_expiry_from(now));
        let synchronous = descriptor.kind == ElementKind::Script && !descriptor.deferred;

        tasks.push(AssetTask::new(
            key,
            source,
            integrity,
            synchronous,
            expires_at,
            Arc::clone(element),
        ));
    }

    ScanOutcome { tasks, skipped }
}
