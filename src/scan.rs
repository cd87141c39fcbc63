//! Page-surface scanning: element capability traits, the per-element task
//! record, and the scanner that turns elements into resolution work.

pub mod element;
pub mod scanner;
pub mod task;

pub use element::{
    ApplyOutcome, ApplyTarget, CompletionFuture, ElementDescriptor, ElementKind, ElementProvider,
    ResourceElement,
};
pub use scanner::{build_tasks, ScanOutcome};
pub use task::AssetTask;
