//! Fanout - scatter/gather remote-execution coordinator
//!
//! Fanout dispatches one logical task to multiple cluster members, collects
//! their individual results under a bounded retry policy, and in race mode
//! returns the first result a caller-supplied filter accepts, cancelling every
//! other in-flight computation as soon as a winner is known.
//!
//! # Architecture
//!
//! - **Pending handles**: one blocking-retrieval handle per (task, member) pair
//! - **Retrying collector**: fixed retry budget against transient timeouts
//! - **Collect-all strategy**: sequential drain into an ordered result set, fail-fast
//! - **First-match strategies**: sequential short-circuit, or a concurrent race
//!   decided by a single-slot rendezvous channel
//! - **Loopback dispatcher**: an in-process cluster for demos and tests
//!
//! Membership discovery, transport, and the business tasks themselves are
//! collaborators behind the [`dispatch`] traits; this crate owns only the
//! coordination logic.

pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod interrupt;
pub mod member;
pub mod pending;
pub mod pool;
pub mod task;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use coordinator::{ResultSet, ScatterGather};
pub use dispatch::{Dispatcher, LoopbackDispatcher, MemberResolver, StaticMembers};
pub use error::{OperationError, WaitError};
pub use interrupt::Interrupt;
pub use member::Member;
pub use pending::{Completer, Pending, SharedPending, TaskHandle};
pub use pool::{ExecutorService, WorkerPool};
pub use task::{ClusterTask, LocalTask};

/// Result type used at collaborator boundaries (dispatchers, local task bodies)
pub type Result<T> = anyhow::Result<T>;
