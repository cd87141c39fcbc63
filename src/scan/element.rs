use bytes::Bytes;
use chrono::{DateTime, Utc};
use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

/// Resolves once the element has signalled that its content finished loading
/// or failed.
pub type CompletionFuture = Pin<Box<dyn Future<Output = ApplyOutcome> + Send + 'static>>;

/// Kinds of page resources the loader knows how to intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Script,
    Stylesheet,
    Image,
}

impl ElementKind {
    /// Every kind, in the order scanned by default.
    pub fn all() -> Vec<ElementKind> {
        vec![
            ElementKind::Script,
            ElementKind::Stylesheet,
            ElementKind::Image,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Script => "script",
            ElementKind::Stylesheet => "stylesheet",
            ElementKind::Image => "image",
        }
    }

    pub fn parse(value: &str) -> Option<ElementKind> {
        match value {
            "script" => Some(ElementKind::Script),
            "stylesheet" => Some(ElementKind::Stylesheet),
            "image" => Some(ElementKind::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the applier hands to an element: a cached payload to adopt, or the
/// instruction to load natively from its source locator.
#[derive(Debug, Clone)]
pub enum ApplyTarget {
    Cached(Bytes),
    Native,
}

/// Terminal signal emitted by an element after application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Loaded,
    Failed,
}

/// Snapshot of an element's cache-relevant attributes, read at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub kind: ElementKind,
    /// Locator the element would load natively.
    pub source: String,
    /// Explicit cache identity; falls back to `source` when absent.
    pub key: Option<String>,
    /// Explicit validation token; falls back to `source` when absent.
    pub integrity: Option<String>,
    /// Per-element expiry override, an absolute instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// True for script-like elements marked async or deferred.
    pub deferred: bool,
    /// True once the element has been applied by a previous cycle.
    pub processed: bool,
}

impl ElementDescriptor {
    pub fn new(kind: ElementKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            key: None,
            integrity: None,
            expires_at: None,
            deferred: false,
            processed: false,
        }
    }
}

/// Handle to one resource-bearing element on the page surface.
///
/// `apply` swaps the element onto the given target and returns its completion
/// future. Implementations must mark the element processed once applied so
/// later scans skip it.
pub trait ResourceElement: Send + Sync {
    fn descriptor(&self) -> ElementDescriptor;

    fn apply(&self, target: ApplyTarget) -> CompletionFuture;
}

/// Supplies the elements of a page surface, in surface order.
pub trait ElementProvider: Send + Sync + 'static {
    fn discover(&self, kinds: &[ElementKind]) -> Vec<Arc<dyn ResourceElement>>;
}
