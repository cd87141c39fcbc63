use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::support::{
    helpers::{
        events, handles, image, init_tracing, new_log, sync_script, StaticProvider, LOADER_GUARD,
    },
    mock_http::{AssetCatalog, MockAssetServer},
};
use anyhow::Result;
use bytes::Bytes;
use restash::{AssetLoader, AssetStore, CacheEntry, LoaderConfig, SqliteBackend, StoreBackend};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

fn config(dir: &Path) -> LoaderConfig {
    // A generous open deadline keeps slow CI disks from degrading the session.
    LoaderConfig::builder()
        .data_dir(dir)
        .open_timeout(Duration::from_secs(2))
        .build()
        .expect("config should build")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_middle_fetch_does_not_reorder_sync_scripts() -> Result<()> {
    let _serial = LOADER_GUARD.lock().await;
    init_tracing();
    let catalog = AssetCatalog::new();
    catalog.serve("/a.js", "a");
    catalog.serve_delayed("/b.js", "b", Duration::from_millis(120));
    let server = MockAssetServer::start(catalog.clone()).await?;
    let dir = tempfile::tempdir()?;

    // The third script hits the cache instantly while the second is still in
    // flight; applied order must stay 1, 2, 3 regardless.
    let c_locator = server.locator("/c.js");
    {
        let store = SqliteBackend::new(dir.path())
            .open("restash", "assets")
            .await?;
        store
            .put(CacheEntry::new(
                &c_locator,
                &c_locator,
                None,
                Bytes::from_static(b"c"),
            ))
            .await?;
    }

    let log = new_log();
    let elements = handles(&[
        sync_script(&server.locator("/a.js"), &log).shared(),
        sync_script(&server.locator("/b.js"), &log).shared(),
        sync_script(&c_locator, &log).shared(),
    ]);
    let loader = AssetLoader::initialize(
        config(dir.path()),
        StaticProvider::shared(elements),
    )
    .await?;

    let report = loader.load(None).await;
    assert_eq!(report.applied, 3);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.fetched, 2);
    assert_eq!(
        events(&log),
        [
            format!("apply {} cached", server.locator("/a.js")),
            format!("complete {}", server.locator("/a.js")),
            format!("apply {} cached", server.locator("/b.js")),
            format!("complete {}", server.locator("/b.js")),
            format!("apply {c_locator} cached"),
            format!("complete {c_locator}"),
        ]
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn next_sync_apply_waits_for_the_completion_signal() -> Result<()> {
    let _serial = LOADER_GUARD.lock().await;
    init_tracing();
    let catalog = AssetCatalog::new();
    catalog.serve("/a.js", "a");
    catalog.serve("/b.js", "b");
    let server = MockAssetServer::start(catalog.clone()).await?;
    let dir = tempfile::tempdir()?;

    let log = new_log();
    let gate = Arc::new(Notify::new());
    let elements = handles(&[
        sync_script(&server.locator("/a.js"), &log)
            .gated(&gate)
            .shared(),
        sync_script(&server.locator("/b.js"), &log).shared(),
    ]);
    let loader = Arc::new(
        AssetLoader::initialize(config(dir.path()), StaticProvider::shared(elements)).await?,
    );

    let runner = {
        let loader = Arc::clone(&loader);
        tokio::spawn(async move { loader.load(None).await })
    };

    // Both fetches resolve quickly, but the second script must not be applied
    // while the first has not signalled completion.
    sleep(Duration::from_millis(150)).await;
    assert_eq!(
        events(&log),
        [format!("apply {} cached", server.locator("/a.js"))]
    );

    gate.notify_one();
    let report = timeout(Duration::from_secs(2), runner)
        .await
        .expect("load should settle once the gate opens")
        .expect("load task should not fail");

    assert_eq!(report.applied, 2);
    assert_eq!(
        events(&log),
        [
            format!("apply {} cached", server.locator("/a.js")),
            format!("complete {}", server.locator("/a.js")),
            format!("apply {} cached", server.locator("/b.js")),
            format!("complete {}", server.locator("/b.js")),
        ]
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn broken_resource_never_stalls_the_chain() -> Result<()> {
    let _serial = LOADER_GUARD.lock().await;
    init_tracing();
    let catalog = AssetCatalog::new();
    catalog.serve("/a.js", "a");
    catalog.fail("/b.js", 500);
    catalog.serve("/c.js", "c");
    let server = MockAssetServer::start(catalog.clone()).await?;
    let dir = tempfile::tempdir()?;

    let log = new_log();
    let elements = handles(&[
        sync_script(&server.locator("/a.js"), &log).shared(),
        sync_script(&server.locator("/b.js"), &log).shared(),
        sync_script(&server.locator("/c.js"), &log).shared(),
    ]);
    let loader = AssetLoader::initialize(
        config(dir.path()),
        StaticProvider::shared(elements),
    )
    .await?;

    let report = timeout(Duration::from_secs(2), loader.load(None))
        .await
        .expect("a failing resource must not stall the chain");
    assert_eq!(report.applied, 3);
    assert_eq!(report.native, 1);
    assert_eq!(
        events(&log),
        [
            format!("apply {} cached", server.locator("/a.js")),
            format!("complete {}", server.locator("/a.js")),
            format!("apply {} native", server.locator("/b.js")),
            format!("complete {}", server.locator("/b.js")),
            format!("apply {} cached", server.locator("/c.js")),
            format!("complete {}", server.locator("/c.js")),
        ]
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unordered_elements_are_not_gated_by_the_chain() -> Result<()> {
    let _serial = LOADER_GUARD.lock().await;
    init_tracing();
    let catalog = AssetCatalog::new();
    catalog.serve("/a.js", "a");
    catalog.serve("/logo.png", "pixels");
    let server = MockAssetServer::start(catalog.clone()).await?;
    let dir = tempfile::tempdir()?;

    let log = new_log();
    let gate = Arc::new(Notify::new());
    let elements = handles(&[
        sync_script(&server.locator("/a.js"), &log)
            .gated(&gate)
            .shared(),
        image(&server.locator("/logo.png"), &log).shared(),
    ]);
    let loader = Arc::new(
        AssetLoader::initialize(config(dir.path()), StaticProvider::shared(elements)).await?,
    );

    let runner = {
        let loader = Arc::clone(&loader);
        tokio::spawn(async move { loader.load(None).await })
    };

    sleep(Duration::from_millis(150)).await;
    assert!(
        events(&log).contains(&format!("complete {}", server.locator("/logo.png"))),
        "the image should finish while the chain head is still gated"
    );

    gate.notify_one();
    let report = timeout(Duration::from_secs(2), runner)
        .await
        .expect("load should settle once the gate opens")
        .expect("load task should not fail");
    assert_eq!(report.applied, 2);

    server.shutdown().await;
    Ok(())
}
