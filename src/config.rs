//! Coordinator configuration
//!
//! Tunables for the retry/collection layer. Defaults match the production
//! policy: a budget of 3 retrieval attempts per member, bounding the added
//! latency from a single flaky member to 3x the per-attempt timeout.

use anyhow::Result;
use std::time::Duration;

/// Default number of retrieval attempts per pending result
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Default per-attempt blocking timeout
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Coordinator tunables
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Retrieval attempts per member before the collector gives up (>= 1)
    pub retry_budget: u32,

    /// Blocking timeout for a single retrieval attempt
    pub attempt_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl CoordinatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry_budget == 0 {
            anyhow::bail!("retry_budget must be at least 1, got 0");
        }
        if self.attempt_timeout.is_zero() {
            anyhow::bail!("attempt_timeout must be non-zero");
        }
        Ok(())
    }
}
