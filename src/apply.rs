//! Ordered application: the position-keyed release queue and the applier that
//! commits resolved payloads to elements under the ordering contract.

pub mod applier;
pub mod queue;

pub use applier::{Applier, ApplyReport};
pub use queue::ApplyQueue;
