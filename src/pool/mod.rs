//! Worker pool
//!
//! The race strategy needs somewhere to run one collector per member. The
//! coordinator only asks for [`WorkerPool::submit`]; [`ExecutorService`] is
//! the provided implementation, a named rayon thread pool sized from
//! `FANOUT_POOL_THREADS` or the CPU count.

use anyhow::{Context, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Minimal fire-and-forget pool interface consumed by the race strategy
pub trait WorkerPool: Send + Sync {
    /// Submit a job for asynchronous execution
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

/// Rayon-backed worker pool with named threads
#[derive(Debug)]
pub struct ExecutorService {
    pool: ThreadPool,
    threads: usize,
}

impl ExecutorService {
    /// Create a pool with the given name prefix and thread count
    pub fn new(name: &str, threads: usize) -> Result<Self> {
        let name_str = name.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{name_str}-{i}"))
            .build()
            .with_context(|| format!("failed to build worker pool '{name}'"))?;
        Ok(Self { pool, threads })
    }

    /// Pool sized from `FANOUT_POOL_THREADS` or the number of CPUs
    pub fn from_env(name: &str) -> Result<Self> {
        let threads = std::env::var("FANOUT_POOL_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(|| num_cpus::get().max(1));
        Self::new(name, threads)
    }

    /// Number of worker threads
    pub fn pool_size(&self) -> usize {
        self.threads
    }
}

impl WorkerPool for ExecutorService {
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        self.pool.spawn(job);
    }
}
