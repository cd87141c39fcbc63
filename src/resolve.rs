//! Cache-or-fetch resolution: validated store lookup composed with the
//! single-attempt network fallback and best-effort population.

pub mod lookup;
pub mod pipeline;

pub use lookup::{lookup, LookupOutcome};
pub use pipeline::{resolve, CacheResult, ResolveOrigin};
