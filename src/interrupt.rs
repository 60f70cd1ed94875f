//! Interrupt token
//!
//! A cloneable token that lets one thread ask another to abandon a blocking
//! wait. An interrupt is never converted into a fault: the interrupted wait
//! terminates without a value and the token stays asserted so outer code can
//! react.
//!
//! The token pairs a sticky flag with a capacity-1 channel. The flag answers
//! `is_set()` at any time; the channel side makes the token usable inside a
//! crossbeam `select!` alongside result channels. Consuming the channel token
//! during a wait must be followed by [`Interrupt::reassert`], which both
//! strategies do on every interrupted path.

use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative interrupt token for blocking waits
#[derive(Debug, Clone)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Interrupt {
    /// Create a fresh, unasserted token
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// Assert the token, waking at most one wait blocked on [`Interrupt::receiver`]
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
        let _ = self.tx.try_send(());
    }

    /// Re-assert after a wait consumed the channel-side token
    ///
    /// Identical to [`Interrupt::trigger`]; the distinct name marks the
    /// re-assertion obligation at interrupted call sites.
    pub fn reassert(&self) {
        self.trigger();
    }

    /// Whether the token has ever been asserted
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Channel side of the token, for use in `select!`
    ///
    /// Clones share the underlying slot: any one consumer takes the token
    /// and is responsible for re-asserting it.
    pub fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_trigger_sets_flag_and_fires_channel() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_set());
        assert!(interrupt.receiver().try_recv().is_err());

        interrupt.trigger();
        assert!(interrupt.is_set());
        assert!(interrupt.receiver().try_recv().is_ok());
        // Flag stays set after the channel token is consumed.
        assert!(interrupt.is_set());
    }

    #[test]
    fn test_reassert_refills_channel() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        interrupt.receiver().try_recv().unwrap();

        interrupt.reassert();
        assert!(interrupt.receiver().try_recv().is_ok());
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        interrupt.trigger();
        // Capacity 1: the second trigger must not block or panic.
        assert!(interrupt.receiver().try_recv().is_ok());
        assert!(interrupt.receiver().try_recv().is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            clone.trigger();
        });
        interrupt
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        assert!(interrupt.is_set());
        handle.join().unwrap();
    }
}
