//! Pending results
//!
//! A pending result is the handle for one in-flight remote computation,
//! created by the fan-out primitive at dispatch time, one per (task, member)
//! pair. The coordinator is its only consumer: it blocks for the value with a
//! per-attempt timeout, may retry after a timeout, and can issue a
//! best-effort cancellation.
//!
//! # Lifecycle
//!
//! pending → one of {resolved, failed, cancelled, timed-out} per retrieval
//! attempt. A timed-out attempt leaves the computation pending; a fresh
//! attempt may observe any terminal state. Cancellation is advisory: the
//! remote side may still complete, the coordinator just stops caring.
//!
//! [`TaskHandle`]/[`Completer`] is the crate's channel-backed implementation,
//! used by the loopback dispatcher and by anything that completes results
//! in-process. Remote transports implement [`Pending`] over their own wire
//! machinery.

use crate::error::WaitError;
use crate::interrupt::Interrupt;
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use crossbeam::select;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle to one in-flight remote computation
pub trait Pending<R>: Send + Sync {
    /// Block for the result, up to `timeout`.
    ///
    /// Exactly one terminal outcome is produced per attempt. After
    /// `Err(WaitError::Timeout)` the computation is still pending and a fresh
    /// attempt is legal; every other outcome is terminal for the handle.
    /// An interrupt observed mid-wait re-asserts the token before returning.
    fn wait(&self, timeout: Duration, interrupt: &Interrupt) -> Result<R, WaitError>;

    /// Best-effort cancellation; idempotent, a no-op on a settled computation
    fn cancel(&self);

    /// Whether cancellation has been requested on this handle
    fn is_cancelled(&self) -> bool;
}

/// Shared, type-erased pending handle as produced by a dispatcher
pub type SharedPending<R> = Arc<dyn Pending<R>>;

/// Terminal outcome delivered by a [`Completer`]
enum Settled<R> {
    Value(R),
    Failed(anyhow::Error),
}

/// Channel-backed [`Pending`] implementation
///
/// The completion side holds a capacity-1 channel; dropping the completer
/// without settling reads as cancellation on the handle side.
pub struct TaskHandle<R> {
    result_rx: Receiver<Settled<R>>,
    cancel_flag: Arc<AtomicBool>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
}

/// Completion side of a [`TaskHandle`]
///
/// Owned by whatever executes the computation (the loopback dispatcher's
/// member threads, or a transport's reader). Settling is first-write-wins.
pub struct Completer<R> {
    result_tx: Sender<Settled<R>>,
}

/// Create a connected handle/completer pair
pub fn handle<R>() -> (TaskHandle<R>, Completer<R>) {
    let (result_tx, result_rx) = bounded(1);
    let (cancel_tx, cancel_rx) = bounded(1);
    (
        TaskHandle {
            result_rx,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            cancel_tx,
            cancel_rx,
        },
        Completer { result_tx },
    )
}

impl<R> Completer<R> {
    /// Deliver the result value. Returns false if the handle side is gone
    /// or the computation already settled.
    pub fn complete(&self, value: R) -> bool {
        self.result_tx.try_send(Settled::Value(value)).is_ok()
    }

    /// Deliver a failure cause. Returns false if the handle side is gone
    /// or the computation already settled.
    pub fn fail(&self, cause: anyhow::Error) -> bool {
        self.result_tx.try_send(Settled::Failed(cause)).is_ok()
    }
}

impl<R> Settled<R> {
    fn into_result(self) -> Result<R, WaitError> {
        match self {
            Settled::Value(v) => Ok(v),
            Settled::Failed(e) => Err(WaitError::Failed(e)),
        }
    }
}

impl<R: Send> Pending<R> for TaskHandle<R> {
    fn wait(&self, timeout: Duration, interrupt: &Interrupt) -> Result<R, WaitError> {
        // A settled result always wins over a concurrent cancel/interrupt, so
        // probe it first instead of letting select! pick an arbitrary ready arm.
        match self.result_rx.try_recv() {
            Ok(settled) => return settled.into_result(),
            Err(TryRecvError::Disconnected) => return Err(WaitError::Cancelled),
            Err(TryRecvError::Empty) => {}
        }
        if self.cancel_flag.load(Ordering::Acquire) {
            return Err(WaitError::Cancelled);
        }
        if interrupt.is_set() {
            interrupt.reassert();
            return Err(WaitError::Interrupted);
        }

        let deadline = crossbeam::channel::after(timeout);
        select! {
            recv(self.result_rx) -> msg => match msg {
                Ok(settled) => settled.into_result(),
                // Completer dropped without settling: the computation is gone.
                Err(_) => Err(WaitError::Cancelled),
            },
            recv(self.cancel_rx) -> _ => Err(WaitError::Cancelled),
            recv(interrupt.receiver()) -> _ => {
                interrupt.reassert();
                Err(WaitError::Interrupted)
            },
            recv(deadline) -> _ => Err(WaitError::Timeout),
        }
    }

    fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Release);
        let _ = self.cancel_tx.try_send(());
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Acquire)
    }
}
