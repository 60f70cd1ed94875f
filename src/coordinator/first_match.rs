//! Sequential first-match strategy
//!
//! Same traversal as collect-all, but each retrieved value is passed through
//! the caller's filter. The first accepted value short-circuits: every
//! not-yet-visited pending is cancelled in iteration order and the value is
//! returned immediately. Used when no worker pool is available or when at
//! most one member participates.

use super::collect_all::cancel_rest;
use super::retry::RetryingCollector;
use crate::config::CoordinatorConfig;
use crate::error::OperationError;
use crate::interrupt::Interrupt;
use crate::member::Member;
use crate::pending::SharedPending;

/// Drain pendings in order until the filter accepts a value.
///
/// Fail-fast and the cancel-remainder behavior on abort are identical to the
/// collect-all strategy.
pub(super) fn run<R, V>(
    pendings: &[(Member, SharedPending<R>)],
    filter: &(dyn Fn(R) -> Option<V> + Send + Sync),
    config: &CoordinatorConfig,
    interrupt: &Interrupt,
) -> Result<Option<V>, OperationError> {
    let collector = RetryingCollector::new(config);

    for (index, (member, pending)) in pendings.iter().enumerate() {
        match collector.collect(member, pending.as_ref(), interrupt) {
            Ok(Some(value)) => {
                if let Some(accepted) = filter(value) {
                    log::debug!("member {member} produced the first accepted value");
                    cancel_rest(&pendings[index + 1..]);
                    return Ok(Some(accepted));
                }
            }
            Ok(None) => {}
            Err(cause) => {
                cancel_rest(&pendings[index + 1..]);
                return Err(OperationError::from_member_fault(member.clone(), cause));
            }
        }
    }
    Ok(None)
}
