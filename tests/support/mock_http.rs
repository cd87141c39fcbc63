use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, RwLock},
    time::Duration,
};

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Clone)]
struct AssetSpec {
    body: Vec<u8>,
    status: StatusCode,
    delay: Option<Duration>,
}

/// Mutable catalog of assets the mock server answers with, plus per-path hit
/// counters so tests can assert how often the network was consulted.
#[derive(Clone, Default)]
pub struct AssetCatalog {
    assets: Arc<RwLock<HashMap<String, AssetSpec>>>,
    hits: Arc<RwLock<HashMap<String, u64>>>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.insert(path, body.into(), StatusCode::OK, None);
    }

    /// Serves the body after the given delay, for racing resolutions.
    pub fn serve_delayed(&self, path: &str, body: impl Into<Vec<u8>>, delay: Duration) {
        self.insert(path, body.into(), StatusCode::OK, Some(delay));
    }

    /// Answers the path with a non-success status.
    pub fn fail(&self, path: &str, status: u16) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.insert(path, Vec::new(), status, None);
    }

    pub fn hits(&self, path: &str) -> u64 {
        self.hits
            .read()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_hits(&self) -> u64 {
        self.hits.read().unwrap().values().sum()
    }

    fn insert(&self, path: &str, body: Vec<u8>, status: StatusCode, delay: Option<Duration>) {
        self.assets
            .write()
            .unwrap()
            .insert(path.to_owned(), AssetSpec { body, status, delay });
    }

    fn lookup(&self, path: &str) -> Option<AssetSpec> {
        *self.hits.write().unwrap().entry(path.to_owned()).or_default() += 1;
        self.assets.read().unwrap().get(path).cloned()
    }
}

/// Static-asset HTTP server backing the fallback-fetch path in tests.
pub struct MockAssetServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockAssetServer {
    pub async fn start(catalog: AssetCatalog) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock asset listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read mock listener address")?;
        let std_listener = listener
            .into_std()
            .context("failed to convert mock listener")?;
        std_listener
            .set_nonblocking(true)
            .context("failed to set mock listener non-blocking")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let make_service = make_service_fn(move |_| {
            let catalog = catalog.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    serve_request(catalog.clone(), req)
                }))
            }
        });

        let server = Server::from_tcp(std_listener)
            .context("failed to build mock HTTP server")?
            .serve(make_service);
        let graceful = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let handle = tokio::spawn(async move {
            if let Err(err) = graceful.await {
                eprintln!("mock asset server stopped: {err}");
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Absolute locator for a served path.
    pub fn locator(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn serve_request(
    catalog: AssetCatalog,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path().to_owned();
    let Some(spec) = catalog.lookup(&path) else {
        let mut response = Response::new(Body::from("no such asset"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        return Ok(response);
    };

    if let Some(delay) = spec.delay {
        sleep(delay).await;
    }

    let mut response = Response::new(Body::from(spec.body));
    *response.status_mut() = spec.status;
    Ok(response)
}
