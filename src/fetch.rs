//! Network fallback: the fetch trait, the HTTP client behind it, and its
//! options.

pub mod client;
pub mod options;

pub use client::{AssetFetch, FetchError, FetchFuture, HttpFetcher};
pub use options::FetchOptions;
