//! The public orchestrator: single-instance guard and the asset loader that
//! wires scanning, resolution, application, and pruning together.

pub mod guard;
pub mod loader;

pub use guard::{AlreadyInitialized, InstanceGuard};
pub use loader::{AssetLoader, LoadReport};
