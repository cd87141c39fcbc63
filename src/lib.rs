pub mod apply;
pub mod engine;
pub mod fetch;
pub mod resolve;
pub mod runtime;
pub mod scan;
pub mod store;

pub use apply::applier::{Applier, ApplyReport};
pub use apply::queue::ApplyQueue;
pub use engine::guard::{AlreadyInitialized, InstanceGuard};
pub use engine::loader::{AssetLoader, LoadReport};
pub use fetch::client::{AssetFetch, FetchError, FetchFuture, HttpFetcher};
pub use fetch::options::FetchOptions;
pub use resolve::lookup::LookupOutcome;
pub use resolve::pipeline::{resolve, CacheResult, ResolveOrigin};
pub use runtime::config::{LoaderConfig, LoaderConfigBuilder, LoaderConfigParams};
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use scan::element::{
    ApplyOutcome, ApplyTarget, CompletionFuture, ElementDescriptor, ElementKind, ElementProvider,
    ResourceElement,
};
pub use scan::scanner::{build_tasks, ScanOutcome};
pub use scan::task::AssetTask;
pub use store::adapter::{AssetStore, StoreBackend, StoreError, StoreFuture, StoreOpenFuture};
pub use store::entry::CacheEntry;
pub use store::memory::{MemoryBackend, MemoryStore};
pub use store::sqlite::SqliteBackend;
