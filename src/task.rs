//! Task traits
//!
//! A [`ClusterTask`] is an immutable, transport-serializable unit of work with
//! a declared result type. The coordinator never executes or mutates tasks
//! itself; it hands them to a [`Dispatcher`](crate::dispatch::Dispatcher) and
//! coordinates the pending results that come back.
//!
//! [`LocalTask`] additionally carries an in-process body so the loopback
//! dispatcher can run the task on a thread per member.

use crate::member::Member;
use serde::Serialize;

/// A unit of work dispatched to every member of a scatter/gather call
///
/// Tasks are owned by the caller and must be serializable for transport.
/// `Output` is the per-member result type collected by the coordinator.
pub trait ClusterTask: Serialize + Send + Sync {
    /// Per-member result type
    type Output: Send + 'static;

    /// Short task name used in logs and thread names
    fn name(&self) -> &str;
}

/// A cluster task that can also run in-process
///
/// Implemented by tasks that the [`LoopbackDispatcher`](crate::dispatch::LoopbackDispatcher)
/// executes directly; a real transport would ship the serialized task instead.
pub trait LocalTask: ClusterTask {
    /// Execute the task on behalf of one member
    fn run(&self, member: &Member) -> crate::Result<Self::Output>;
}
