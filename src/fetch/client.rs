//! HTTP retrieval of asset payloads. Houses the `HttpFetcher`, its error
//! type, and the `AssetFetch` trait consumed by the resolution pipeline.

use crate::fetch::options::FetchOptions;
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::future::BoxFuture;

pub type FetchFuture<'a> = BoxFuture<'a, Result<Bytes, FetchError>>;

#[derive(Debug)]
pub enum FetchError {
    /// The server answered with a non-success status.
    Status { locator: String, status: u16 },
    /// The request failed before a usable response arrived.
    Transport {
        locator: String,
        source: reqwest::Error,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status { locator, status } => {
                write!(f, "fetch of {locator} returned status {status}")
            }
            FetchError::Transport { locator, source } => {
                write!(f, "fetch of {locator} failed: {source}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Status { .. } => None,
            FetchError::Transport { source, .. } => Some(source),
        }
    }
}

/// Single-attempt retrieval of the payload behind a source locator.
///
/// The pipeline issues exactly one fetch per miss; retry policy belongs to
/// the caller's surface, not here.
pub trait AssetFetch: Send + Sync + 'static {
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl AssetFetch for HttpFetcher {
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a> {
        Box::pin(self.fetch_bytes(locator))
    }
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(FetchOptions::default())
    }

    pub fn with_options(options: FetchOptions) -> Result<Self> {
        options.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(options.user_agent.clone());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build fetch client")?;

        Ok(Self { client })
    }

    async fn fetch_bytes(&self, locator: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                locator: locator.to_owned(),
                source: err,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                locator: locator.to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport {
                locator: locator.to_owned(),
                source: err,
            })
    }
}
