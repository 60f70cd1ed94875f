//! Collect-all strategy
//!
//! Sequentially drains every member's pending result into an ordered result
//! set. Fail-fast: the first member whose collector raises a fault aborts the
//! whole operation. Members whose retrieval timed out past budget or was
//! cancelled are simply absent from the result.

use super::ResultSet;
use crate::config::CoordinatorConfig;
use crate::error::OperationError;
use crate::interrupt::Interrupt;
use crate::member::Member;
use crate::pending::SharedPending;

use super::retry::RetryingCollector;

/// Drain all pendings in iteration order, fail-fast on the first fault.
///
/// On abort the not-yet-visited pendings are cancelled before the fault is
/// raised; the remote computations themselves may still run to completion
/// (cancellation stays advisory).
pub(super) fn run<R>(
    pendings: &[(Member, SharedPending<R>)],
    config: &CoordinatorConfig,
    interrupt: &Interrupt,
) -> Result<ResultSet<R>, OperationError> {
    let collector = RetryingCollector::new(config);
    let mut results = ResultSet::default();

    for (index, (member, pending)) in pendings.iter().enumerate() {
        match collector.collect(member, pending.as_ref(), interrupt) {
            Ok(Some(value)) => results.insert(member.clone(), value),
            Ok(None) => {}
            Err(cause) => {
                cancel_rest(&pendings[index + 1..]);
                return Err(OperationError::from_member_fault(member.clone(), cause));
            }
        }
    }
    Ok(results)
}

/// Best-effort cancellation of members never visited before an abort
pub(super) fn cancel_rest<R>(rest: &[(Member, SharedPending<R>)]) {
    for (member, pending) in rest {
        log::debug!("cancelling unvisited member {member}");
        pending.cancel();
    }
}
