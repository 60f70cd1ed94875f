//! Retrying collector
//!
//! Wraps a single pending result with a fixed retry budget against transient
//! timeouts. This is the unit every strategy reuses: collect-all and both
//! first-match variants all drain members through one collector call each.

use crate::config::CoordinatorConfig;
use crate::error::WaitError;
use crate::interrupt::Interrupt;
use crate::member::Member;
use crate::pending::Pending;

/// Collects one pending result under the configured retry budget
///
/// The attempt counter is local to each [`RetryingCollector::collect`] call;
/// nothing about the budget is shared between members or invocations.
pub struct RetryingCollector<'a> {
    config: &'a CoordinatorConfig,
}

impl<'a> RetryingCollector<'a> {
    pub fn new(config: &'a CoordinatorConfig) -> Self {
        Self { config }
    }

    /// Attempt to retrieve the value, retrying transient timeouts.
    ///
    /// - `Ok(Some(value))`: retrieval succeeded within the budget.
    /// - `Ok(None)`: no value: budget exhausted (after one best-effort
    ///   cancellation), computation cancelled, or the wait was interrupted.
    /// - `Err(cause)`: any other failure; this is the only path that turns a
    ///   member's failure into an operation-level fault.
    pub fn collect<R>(
        &self,
        member: &Member,
        pending: &dyn Pending<R>,
        interrupt: &Interrupt,
    ) -> crate::Result<Option<R>> {
        let budget = self.config.retry_budget;
        for attempt in 1..=budget {
            match pending.wait(self.config.attempt_timeout, interrupt) {
                Ok(value) => return Ok(Some(value)),
                Err(WaitError::Timeout) => {
                    log::trace!("attempt {attempt}/{budget} timed out for member {member}");
                    if attempt == budget {
                        log::debug!("retry budget exhausted for member {member}, cancelling");
                        pending.cancel();
                        return Ok(None);
                    }
                }
                Err(WaitError::Cancelled) => {
                    log::debug!("pending result for member {member} was cancelled");
                    return Ok(None);
                }
                Err(WaitError::Interrupted) => {
                    interrupt.reassert();
                    log::debug!("wait for member {member} interrupted");
                    return Ok(None);
                }
                Err(WaitError::Failed(cause)) => return Err(cause),
            }
        }
        // Only reachable with a zero budget, which validation rejects.
        Ok(None)
    }
}
