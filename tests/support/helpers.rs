use std::sync::{Arc, Mutex};

use bytes::Bytes;
use once_cell::sync::Lazy;
use restash::{
    ApplyOutcome, ApplyTarget, CompletionFuture, ElementDescriptor, ElementKind, ElementProvider,
    ResourceElement,
};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// The loader enforces a process-wide single-instance invariant, so every
/// test that constructs one must hold this lock.
pub static LOADER_GUARD: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

/// Shared, ordered record of apply and completion events across elements.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Page element double. Records each application into the shared log, keeps
/// the payload it was applied with, marks itself processed, and optionally
/// holds its completion signal until a gate opens.
pub struct TestElement {
    descriptor: Mutex<ElementDescriptor>,
    log: EventLog,
    gate: Option<Arc<Notify>>,
    outcome: ApplyOutcome,
    cached_payload: Mutex<Option<Bytes>>,
}

impl TestElement {
    pub fn new(descriptor: ElementDescriptor, log: &EventLog) -> Self {
        Self {
            descriptor: Mutex::new(descriptor),
            log: Arc::clone(log),
            gate: None,
            outcome: ApplyOutcome::Loaded,
            cached_payload: Mutex::new(None),
        }
    }

    /// Completion is withheld until the gate is notified.
    pub fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }

    /// The completion signal reports a load error.
    pub fn failing(mut self) -> Self {
        self.outcome = ApplyOutcome::Failed;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn is_processed(&self) -> bool {
        self.descriptor.lock().unwrap().processed
    }

    /// Payload of the last cached application, if any.
    pub fn cached_payload(&self) -> Option<Bytes> {
        self.cached_payload.lock().unwrap().clone()
    }
}

impl ResourceElement for TestElement {
    fn descriptor(&self) -> ElementDescriptor {
        self.descriptor.lock().unwrap().clone()
    }

    fn apply(&self, target: ApplyTarget) -> CompletionFuture {
        let source = self.descriptor.lock().unwrap().source.clone();
        let label = match &target {
            ApplyTarget::Cached(payload) => {
                *self.cached_payload.lock().unwrap() = Some(payload.clone());
                "cached"
            }
            ApplyTarget::Native => "native",
        };
        self.log
            .lock()
            .unwrap()
            .push(format!("apply {source} {label}"));
        self.descriptor.lock().unwrap().processed = true;

        let log = Arc::clone(&self.log);
        let gate = self.gate.clone();
        let outcome = self.outcome;
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            log.lock().unwrap().push(format!("complete {source}"));
            outcome
        })
    }
}

/// A plain ordered script element for the given locator.
pub fn sync_script(source: &str, log: &EventLog) -> TestElement {
    TestElement::new(ElementDescriptor::new(ElementKind::Script, source), log)
}

/// An unordered image element for the given locator.
pub fn image(source: &str, log: &EventLog) -> TestElement {
    TestElement::new(ElementDescriptor::new(ElementKind::Image, source), log)
}

/// Provider that hands out a fixed element set, in surface order.
pub struct StaticProvider {
    elements: Vec<Arc<dyn ResourceElement>>,
}

impl StaticProvider {
    pub fn shared(elements: Vec<Arc<dyn ResourceElement>>) -> Arc<dyn ElementProvider> {
        Arc::new(Self { elements })
    }
}

impl ElementProvider for StaticProvider {
    fn discover(&self, _kinds: &[ElementKind]) -> Vec<Arc<dyn ResourceElement>> {
        self.elements.clone()
    }
}

/// Coerces concrete test elements into the provider's handle type.
pub fn handles(elements: &[Arc<TestElement>]) -> Vec<Arc<dyn ResourceElement>> {
    elements
        .iter()
        .map(|element| Arc::clone(element) as Arc<dyn ResourceElement>)
        .collect()
}
