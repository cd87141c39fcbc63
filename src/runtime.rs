//! Runtime glue: validated configuration and session telemetry.

pub mod config;
pub mod telemetry;
