//! Concurrent first-match (race) strategy
//!
//! One worker per member races to deposit the first accepted value, or the
//! first non-timeout fault, into a single-slot rendezvous channel. The
//! coordinator consumes the first arrival and cancels everything else.
//!
//! The channel's capacity-1, non-blocking-send discipline is the whole
//! synchronization story: whichever worker's deposit lands in the empty slot
//! determines the outcome, later deposits are discarded, and no other mutable
//! state is shared between workers.

use crate::config::CoordinatorConfig;
use crate::error::OperationError;
use crate::interrupt::Interrupt;
use crate::member::Member;
use crate::pending::SharedPending;
use crate::pool::WorkerPool;
use crossbeam::channel::bounded;
use crossbeam::select;
use std::sync::Arc;

use super::retry::RetryingCollector;

/// What a worker may deposit into the rendezvous slot
enum Deposit<V> {
    Accepted(Member, V),
    Fault(Member, anyhow::Error),
}

/// Race all members for the first filter-accepted value.
///
/// Each worker runs the full retry loop for its member, with the race-wide
/// stop token standing in for the interrupt so a decided race aborts
/// in-flight waits promptly. Workers that exhaust their budget, observe
/// cancellation, or whose value the filter rejects terminate without
/// depositing; when every sender is gone without a deposit the disconnected
/// channel reads as "none found".
pub(super) fn run<R, V>(
    pendings: Vec<(Member, SharedPending<R>)>,
    filter: Arc<dyn Fn(R) -> Option<V> + Send + Sync>,
    pool: &dyn WorkerPool,
    config: &CoordinatorConfig,
    interrupt: &Interrupt,
) -> Result<Option<V>, OperationError>
where
    R: 'static,
    V: Send + 'static,
{
    let (slot_tx, slot_rx) = bounded::<Deposit<V>>(1);
    // Race-wide stop token: triggered once a winner is known (or the caller
    // interrupts), it makes every losing worker's wait return promptly.
    let stop = Interrupt::new();

    for (member, pending) in &pendings {
        let slot = slot_tx.clone();
        let filter = Arc::clone(&filter);
        let pending = Arc::clone(pending);
        let stop = stop.clone();
        let config = config.clone();
        let member = member.clone();
        pool.submit(Box::new(move || {
            let collector = RetryingCollector::new(&config);
            match collector.collect(&member, pending.as_ref(), &stop) {
                Ok(Some(value)) => {
                    if let Some(accepted) = filter(value) {
                        if slot.try_send(Deposit::Accepted(member, accepted)).is_err() {
                            log::debug!("accepted value lost the race, dropping it");
                        }
                    }
                }
                Ok(None) => {}
                Err(cause) => {
                    if let Err(lost) = slot.try_send(Deposit::Fault(member, cause)) {
                        if let Deposit::Fault(member, cause) = lost.into_inner() {
                            log::warn!("fault from member {member} lost the race: {cause:#}");
                        }
                    }
                }
            }
        }));
    }
    // The coordinator keeps no sender: once every worker is done without a
    // deposit, recv() disconnects and the race resolves to "none found".
    drop(slot_tx);

    let deposit = select! {
        recv(slot_rx) -> msg => msg.ok(),
        recv(interrupt.receiver()) -> _ => {
            interrupt.reassert();
            log::debug!("race wait interrupted, aborting");
            cancel_everything(&stop, &pendings);
            return Ok(None);
        },
    };

    // First arrival is in hand (or nobody deposited): stop every worker and
    // cancel every pending, winner included. Both are idempotent.
    cancel_everything(&stop, &pendings);

    match deposit {
        None => Ok(None),
        Some(Deposit::Accepted(member, value)) => {
            log::debug!("member {member} won the race");
            Ok(Some(value))
        }
        Some(Deposit::Fault(member, cause)) => {
            Err(OperationError::from_member_fault(member, cause))
        }
    }
}

fn cancel_everything<R>(stop: &Interrupt, pendings: &[(Member, SharedPending<R>)]) {
    stop.trigger();
    for (_, pending) in pendings {
        pending.cancel();
    }
}
