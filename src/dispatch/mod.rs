//! Membership and dispatch collaborators
//!
//! The coordinator does not own membership discovery or transport. It
//! consumes two traits at that boundary:
//!
//! - [`MemberResolver`]: the membership source; an empty member set is a
//!   valid, non-error answer.
//! - [`Dispatcher`]: the already-connected fan-out primitive that, given a
//!   task and a member set, returns one pending-result handle per member.
//!   It is invoked exactly once per operation, and the returned order is the
//!   member iteration order.
//!
//! [`LoopbackDispatcher`] is the in-process implementation: one OS thread per
//! member runs a [`LocalTask`] body after a configurable simulated network
//! delay. It backs the demo binary and the end-to-end tests.

use crate::member::Member;
use crate::pending::{self, SharedPending};
use crate::task::{ClusterTask, LocalTask};
use anyhow::Context;
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Membership source for scatter/gather calls
pub trait MemberResolver: Send + Sync {
    /// Current cluster members, in iteration order
    fn resolve(&self) -> Vec<Member>;
}

/// Fixed member list
#[derive(Debug, Clone, Default)]
pub struct StaticMembers {
    members: Vec<Member>,
}

impl StaticMembers {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }
}

impl MemberResolver for StaticMembers {
    fn resolve(&self) -> Vec<Member> {
        self.members.clone()
    }
}

/// Fan-out primitive: dispatch one task to a set of members
pub trait Dispatcher<T: ClusterTask>: Send + Sync {
    /// Dispatch `task` to every member, yielding one pending result per
    /// member in the given order. Called exactly once per operation.
    fn dispatch(
        &self,
        task: &T,
        members: &[Member],
    ) -> crate::Result<Vec<(Member, SharedPending<T::Output>)>>;
}

/// In-process cluster that executes [`LocalTask`]s on one thread per member
///
/// Each member thread sleeps for `latency` plus a uniform jitter before
/// running the task body, then settles the member's pending handle. Threads
/// are detached: cancellation on the handle is advisory, exactly like a real
/// remote computation.
#[derive(Debug, Clone)]
pub struct LoopbackDispatcher {
    latency: Duration,
    jitter: Duration,
}

impl Default for LoopbackDispatcher {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

impl LoopbackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated per-member delay: `latency` plus up to `jitter` extra
    pub fn with_latency(latency: Duration, jitter: Duration) -> Self {
        Self { latency, jitter }
    }

    fn sample_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.latency;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.latency + Duration::from_millis(extra)
    }
}

impl<T> Dispatcher<T> for LoopbackDispatcher
where
    T: LocalTask + Clone + 'static,
{
    fn dispatch(
        &self,
        task: &T,
        members: &[Member],
    ) -> crate::Result<Vec<(Member, SharedPending<T::Output>)>> {
        log::debug!(
            "dispatching task '{}' to {} member(s)",
            task.name(),
            members.len()
        );
        members
            .iter()
            .map(|member| {
                let (handle, completer) = pending::handle();
                let task = task.clone();
                let member_id = member.clone();
                let delay = self.sample_delay();
                thread::Builder::new()
                    .name(format!("loopback-{member_id}"))
                    .spawn(move || {
                        if !delay.is_zero() {
                            thread::sleep(delay);
                        }
                        match task.run(&member_id) {
                            Ok(value) => {
                                completer.complete(value);
                            }
                            Err(cause) => {
                                completer.fail(cause);
                            }
                        }
                    })
                    .with_context(|| format!("failed to spawn loopback thread for {member}"))?;
                Ok((member.clone(), Arc::new(handle) as SharedPending<T::Output>))
            })
            .collect()
    }
}
