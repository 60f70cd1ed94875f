//! Scatter/gather coordination strategies
//!
//! Entry points live on [`ScatterGather`]:
//!
//! - [`ScatterGather::collect_all`]: drain every member into an ordered
//!   [`ResultSet`], fail-fast on the first non-timeout fault.
//! - [`ScatterGather::race_for_first_match`]: return the first filter-accepted
//!   value. With a worker pool and more than one member this races all
//!   members concurrently; otherwise it drains them sequentially.
//!
//! Both operations dispatch exactly once, treat an empty member set as a
//! no-op, and never let a fault be silently swallowed. Interrupting the
//! calling thread terminates the wait without a fault and leaves the
//! interrupt token asserted.

mod collect_all;
mod first_match;
mod race;
pub mod retry;

pub use retry::RetryingCollector;

use crate::config::CoordinatorConfig;
use crate::dispatch::Dispatcher;
use crate::error::OperationError;
use crate::interrupt::Interrupt;
use crate::member::Member;
use crate::pool::WorkerPool;
use crate::task::ClusterTask;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

/// Insertion-ordered Member -> value mapping
///
/// Contains only members whose retrieval succeeded; members that timed out
/// past budget or were cancelled are absent. Iteration order is the member
/// iteration order of the operation that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet<R> {
    entries: Vec<(Member, R)>,
}

impl<R> Default for ResultSet<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> ResultSet<R> {
    fn insert(&mut self, member: Member, value: R) {
        self.entries.push((member, value));
    }

    /// Value collected for `member`, if any
    pub fn get(&self, member: &Member) -> Option<&R> {
        self.entries
            .iter()
            .find(|(m, _)| m == member)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(Member, R)> {
        self.entries.iter()
    }

    /// Members present, in insertion order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.entries.iter().map(|(m, _)| m)
    }
}

impl<R> IntoIterator for ResultSet<R> {
    type Item = (Member, R);
    type IntoIter = std::vec::IntoIter<(Member, R)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Scatter/gather coordinator
///
/// Owns the retry configuration and an optional worker pool. Without a pool
/// every operation is single-threaded from the coordinator's point of view;
/// the pool enables the concurrent race strategy.
pub struct ScatterGather {
    config: CoordinatorConfig,
    pool: Option<Arc<dyn WorkerPool>>,
}

impl ScatterGather {
    /// Create a coordinator with the given configuration
    pub fn new(config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, pool: None })
    }

    /// Attach a worker pool, enabling the concurrent race strategy
    pub fn with_pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Dispatch `task` to every member and collect each member's result.
    ///
    /// Returns an insertion-ordered result set holding only the members that
    /// responded within the retry budget. The first non-timeout fault from
    /// any member aborts the operation immediately (remaining members are
    /// cancelled, best-effort) and is raised to the caller. An empty member
    /// set is a no-op yielding an empty set.
    pub fn collect_all<T, D>(
        &self,
        task: &T,
        members: &[Member],
        dispatcher: &D,
        interrupt: &Interrupt,
    ) -> Result<ResultSet<T::Output>, OperationError>
    where
        T: ClusterTask,
        D: Dispatcher<T> + ?Sized,
    {
        if members.is_empty() {
            return Ok(ResultSet::default());
        }
        let pendings = dispatcher
            .dispatch(task, members)
            .map_err(OperationError::Dispatch)?;
        collect_all::run(&pendings, &self.config, interrupt)
    }

    /// Dispatch `task` to every member and return the first value the filter
    /// accepts, or `None` if no member produces an accepted value.
    ///
    /// With an attached pool and more than one member the members race
    /// concurrently: the first accepted value (or the first non-timeout
    /// fault) wins, and everything else is cancelled. Otherwise members are
    /// drained sequentially and the first acceptance short-circuits.
    pub fn race_for_first_match<T, D, V, F>(
        &self,
        task: &T,
        members: &[Member],
        dispatcher: &D,
        filter: F,
        interrupt: &Interrupt,
    ) -> Result<Option<V>, OperationError>
    where
        T: ClusterTask,
        D: Dispatcher<T> + ?Sized,
        V: Send + 'static,
        F: Fn(T::Output) -> Option<V> + Send + Sync + 'static,
    {
        if members.is_empty() {
            return Ok(None);
        }
        let pendings = dispatcher
            .dispatch(task, members)
            .map_err(OperationError::Dispatch)?;

        match &self.pool {
            Some(pool) if pendings.len() > 1 => race::run(
                pendings,
                Arc::new(filter),
                pool.as_ref(),
                &self.config,
                interrupt,
            ),
            _ => first_match::run(&pendings, &filter, &self.config, interrupt),
        }
    }
}
