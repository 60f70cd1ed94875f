//! Fault taxonomy
//!
//! Two error boundaries exist in the coordinator:
//!
//! - [`WaitError`] at the pending-result boundary. `Timeout` is the only
//!   transient kind (retryable within the collector's budget); `Cancelled` and
//!   `Interrupted` are terminal non-errors that yield no value; `Failed`
//!   carries the remote cause and is the single path that becomes an
//!   operation-level fault.
//! - [`OperationError`] at the operation boundary, surfaced to callers of
//!   `collect_all` / `race_for_first_match`. Faults are never logged and
//!   swallowed inside the coordinator.

use crate::member::Member;
use thiserror::Error;

/// Outcome of one blocking retrieval attempt that did not produce a value
#[derive(Debug, Error)]
pub enum WaitError {
    /// The remote side is slow, not broken; retryable within the budget
    #[error("timed out waiting for remote result")]
    Timeout,

    /// The computation was cancelled; terminal, no value, not a fault
    #[error("remote computation was cancelled")]
    Cancelled,

    /// The waiting thread was interrupted; terminal for this wait, not a fault
    #[error("wait was interrupted")]
    Interrupted,

    /// The remote task failed; always propagated to the caller
    #[error("remote task failed")]
    Failed(#[source] anyhow::Error),
}

/// Operation-level fault raised to callers
#[derive(Debug, Error)]
pub enum OperationError {
    /// A member's task failed with a non-timeout cause
    #[error("task failed on member {member}")]
    MemberFailed {
        member: Member,
        #[source]
        source: anyhow::Error,
    },

    /// The fan-out primitive itself failed before any result was pending
    #[error("task dispatch failed")]
    Dispatch(#[source] anyhow::Error),
}

impl OperationError {
    /// Classify a fault raised by one member's collector.
    ///
    /// A cause that already is an `OperationError` is rethrown as-is; any
    /// other cause is wrapped with the member it came from.
    pub fn from_member_fault(member: Member, cause: anyhow::Error) -> Self {
        match cause.downcast::<OperationError>() {
            Ok(op) => op,
            Err(other) => OperationError::MemberFailed {
                member,
                source: other,
            },
        }
    }

    /// The member this fault is attributed to, if any
    pub fn member(&self) -> Option<&Member> {
        match self {
            OperationError::MemberFailed { member, .. } => Some(member),
            OperationError::Dispatch(_) => None,
        }
    }
}
