//! Configurable knobs for the fallback fetch client along with validation
//! helpers.

use anyhow::{bail, Result};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("restash/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request deadline; `None` lets a fetch run until the transport
    /// gives up on its own.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl FetchOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            bail!("timeout must be greater than 0 when set");
        }
        if self.user_agent.trim().is_empty() {
            bail!("user_agent cannot be empty");
        }
        Ok(())
    }
}
