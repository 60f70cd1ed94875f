//! End-to-end coordinator behavior over scripted pending results
//!
//! These tests drive the public `ScatterGather` entry points with a fake
//! dispatcher whose pending results follow per-member scripts (value,
//! transient timeout, failure, or block-until-cancelled), so every ordering
//! and cancellation property can be asserted without a network.

use anyhow::anyhow;
use fanout::coordinator::RetryingCollector;
use fanout::{
    ClusterTask, CoordinatorConfig, Dispatcher, ExecutorService, Interrupt, LocalTask,
    LoopbackDispatcher, Member, Pending, ScatterGather, SharedPending, WaitError,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// One scripted retrieval attempt
enum Step {
    Value(i32),
    TimeOut,
    Fail(&'static str),
    /// Block until cancelled or interrupted (a member that never answers)
    Never,
}

/// Pending result that follows a fixed script, one step per wait() call
struct ScriptedPending {
    steps: Mutex<VecDeque<Step>>,
    waits: AtomicUsize,
    cancels: AtomicUsize,
    cancelled: AtomicBool,
}

impl ScriptedPending {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            waits: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        })
    }

    fn value(v: i32) -> Arc<Self> {
        Self::new(vec![Step::Value(v)])
    }

    fn never() -> Arc<Self> {
        Self::new(vec![Step::Never])
    }

    fn failing(msg: &'static str) -> Arc<Self> {
        Self::new(vec![Step::Fail(msg)])
    }

    fn wait_count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Pending<i32> for ScriptedPending {
    fn wait(&self, _timeout: Duration, interrupt: &Interrupt) -> Result<i32, WaitError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(WaitError::Cancelled);
        }
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Value(v)) => Ok(v),
            Some(Step::TimeOut) => Err(WaitError::Timeout),
            Some(Step::Fail(msg)) => Err(WaitError::Failed(anyhow!(msg))),
            Some(Step::Never) => {
                // Poll until someone cancels or interrupts; bounded so a
                // broken cancellation path fails the test instead of hanging.
                let deadline = Instant::now() + Duration::from_secs(5);
                while Instant::now() < deadline {
                    if self.cancelled.load(Ordering::SeqCst) {
                        return Err(WaitError::Cancelled);
                    }
                    if interrupt.is_set() {
                        interrupt.reassert();
                        return Err(WaitError::Interrupted);
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                Err(WaitError::Timeout)
            }
            None => Err(WaitError::Cancelled),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ProbeTask;

impl ClusterTask for ProbeTask {
    type Output = i32;

    fn name(&self) -> &str {
        "probe"
    }
}

/// Dispatcher that hands out pre-scripted pendings and counts invocations
struct FakeDispatcher {
    pendings: Vec<(Member, Arc<ScriptedPending>)>,
    dispatches: AtomicUsize,
}

impl FakeDispatcher {
    fn new(pendings: Vec<(Member, Arc<ScriptedPending>)>) -> Self {
        Self {
            pendings,
            dispatches: AtomicUsize::new(0),
        }
    }

    fn pending(&self, index: usize) -> &Arc<ScriptedPending> {
        &self.pendings[index].1
    }

    fn members(&self) -> Vec<Member> {
        self.pendings.iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Dispatcher<ProbeTask> for FakeDispatcher {
    fn dispatch(
        &self,
        _task: &ProbeTask,
        _members: &[Member],
    ) -> fanout::Result<Vec<(Member, SharedPending<i32>)>> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .pendings
            .iter()
            .map(|(m, p)| (m.clone(), Arc::clone(p) as SharedPending<i32>))
            .collect())
    }
}

fn quick_config() -> CoordinatorConfig {
    CoordinatorConfig {
        retry_budget: 3,
        attempt_timeout: Duration::from_millis(50),
    }
}

fn sequential_coordinator() -> ScatterGather {
    ScatterGather::new(quick_config()).unwrap()
}

fn racing_coordinator(threads: usize) -> ScatterGather {
    ScatterGather::new(quick_config())
        .unwrap()
        .with_pool(Arc::new(ExecutorService::new("race-test", threads).unwrap()))
}

fn member(i: usize) -> Member {
    Member::new(format!("node-{i}"))
}

// --- retry budget ---

#[test]
fn test_two_timeouts_then_success_yields_value() {
    let config = quick_config();
    let pending = ScriptedPending::new(vec![Step::TimeOut, Step::TimeOut, Step::Value(42)]);
    let collector = RetryingCollector::new(&config);
    let got = collector
        .collect(&member(0), pending.as_ref(), &Interrupt::new())
        .unwrap();
    assert_eq!(got, Some(42));
    assert_eq!(pending.wait_count(), 3);
    assert_eq!(pending.cancel_count(), 0);
}

#[test]
fn test_three_timeouts_yield_nothing_and_exactly_one_cancel() {
    let config = quick_config();
    let pending = ScriptedPending::new(vec![Step::TimeOut, Step::TimeOut, Step::TimeOut]);
    let collector = RetryingCollector::new(&config);
    let got = collector
        .collect(&member(0), pending.as_ref(), &Interrupt::new())
        .unwrap();
    assert_eq!(got, None);
    assert_eq!(pending.wait_count(), 3);
    assert_eq!(pending.cancel_count(), 1);
}

// --- collect all ---

#[test]
fn test_collect_all_gathers_results_in_member_order() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::value(10)),
        // Transient timeout, then answers on the second attempt.
        (
            member(1),
            ScriptedPending::new(vec![Step::TimeOut, Step::Value(11)]),
        ),
        // Times out past the whole budget: absent from the result, no fault.
        (
            member(2),
            ScriptedPending::new(vec![Step::TimeOut, Step::TimeOut, Step::TimeOut]),
        ),
        (member(3), ScriptedPending::value(13)),
    ]);
    let results = sequential_coordinator()
        .collect_all(&ProbeTask, &dispatcher.members(), &dispatcher, &Interrupt::new())
        .unwrap();

    let entries: Vec<(Member, i32)> = results.into_iter().collect();
    assert_eq!(
        entries,
        vec![(member(0), 10), (member(1), 11), (member(3), 13)]
    );
    assert_eq!(dispatcher.dispatches.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.pending(2).cancel_count(), 1);
}

#[test]
fn test_collect_all_fails_fast_and_skips_later_members() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::value(1)),
        (member(1), ScriptedPending::failing("replica corrupt")),
        (member(2), ScriptedPending::value(3)),
    ]);
    let err = sequential_coordinator()
        .collect_all(&ProbeTask, &dispatcher.members(), &dispatcher, &Interrupt::new())
        .unwrap_err();

    assert_eq!(err.member(), Some(&member(1)));
    assert_eq!(err.to_string(), "task failed on member node-1");
    // Member 2 was never contacted, only cancelled on the way out.
    assert_eq!(dispatcher.pending(2).wait_count(), 0);
    assert_eq!(dispatcher.pending(2).cancel_count(), 1);
}

#[test]
fn test_collect_all_empty_member_set_is_a_noop() {
    let dispatcher = FakeDispatcher::new(vec![]);
    let results = sequential_coordinator()
        .collect_all(&ProbeTask, &[], &dispatcher, &Interrupt::new())
        .unwrap();
    assert!(results.is_empty());
    // No members means no dispatch at all.
    assert_eq!(dispatcher.dispatches.load(Ordering::SeqCst), 0);
}

// --- sequential first match ---

#[test]
fn test_sequential_first_match_short_circuits_and_cancels_rest() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::value(1)),
        (member(1), ScriptedPending::value(2)),
        (member(2), ScriptedPending::value(3)),
    ]);
    // No pool attached: traversal is sequential in member order.
    let got = sequential_coordinator()
        .race_for_first_match(
            &ProbeTask,
            &dispatcher.members(),
            &dispatcher,
            |v| (v >= 2).then_some(v * 100),
            &Interrupt::new(),
        )
        .unwrap();

    assert_eq!(got, Some(200));
    assert_eq!(dispatcher.pending(2).wait_count(), 0);
    assert_eq!(dispatcher.pending(2).cancel_count(), 1);
}

#[test]
fn test_sequential_first_match_exhausts_to_none() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::value(1)),
        (member(1), ScriptedPending::value(2)),
    ]);
    let got = sequential_coordinator()
        .race_for_first_match(
            &ProbeTask,
            &dispatcher.members(),
            &dispatcher,
            |_| None::<i32>,
            &Interrupt::new(),
        )
        .unwrap();
    assert_eq!(got, None);
}

#[test]
fn test_single_member_uses_sequential_path_even_with_pool() {
    let dispatcher = FakeDispatcher::new(vec![(member(0), ScriptedPending::value(7))]);
    let got = racing_coordinator(4)
        .race_for_first_match(
            &ProbeTask,
            &dispatcher.members(),
            &dispatcher,
            Some,
            &Interrupt::new(),
        )
        .unwrap();
    assert_eq!(got, Some(7));
}

// --- concurrent race ---

#[test]
fn test_race_returns_exactly_one_winner_and_cancels_everyone() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::never()),
        (member(1), ScriptedPending::value(100)),
        (member(2), ScriptedPending::never()),
        (member(3), ScriptedPending::value(200)),
        (member(4), ScriptedPending::never()),
    ]);
    let got = racing_coordinator(5)
        .race_for_first_match(
            &ProbeTask,
            &dispatcher.members(),
            &dispatcher,
            Some,
            &Interrupt::new(),
        )
        .unwrap();

    // Two members accept concurrently; exactly one value comes back.
    assert!(got == Some(100) || got == Some(200), "got {got:?}");
    // Every pending, the winner included, receives a cancellation.
    for i in 0..5 {
        assert!(
            dispatcher.pending(i).cancel_count() >= 1,
            "member {i} was never cancelled"
        );
    }
}

#[test]
fn test_race_fault_wins_over_silent_members() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::failing("quorum lost")),
        (member(1), ScriptedPending::never()),
        (member(2), ScriptedPending::never()),
    ]);
    let err = racing_coordinator(3)
        .race_for_first_match(
            &ProbeTask,
            &dispatcher.members(),
            &dispatcher,
            |_| None::<i32>,
            &Interrupt::new(),
        )
        .unwrap_err();

    assert_eq!(err.member(), Some(&member(0)));
    for i in 0..3 {
        assert!(dispatcher.pending(i).cancel_count() >= 1);
    }
}

#[test]
fn test_race_with_no_acceptance_resolves_to_none() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::value(1)),
        (member(1), ScriptedPending::value(2)),
        (member(2), ScriptedPending::value(3)),
    ]);
    let got = racing_coordinator(3)
        .race_for_first_match(
            &ProbeTask,
            &dispatcher.members(),
            &dispatcher,
            |_| None::<i32>,
            &Interrupt::new(),
        )
        .unwrap();
    assert_eq!(got, None);
}

#[test]
fn test_race_empty_member_set_is_a_noop() {
    let dispatcher = FakeDispatcher::new(vec![]);
    let got = racing_coordinator(2)
        .race_for_first_match(&ProbeTask, &[], &dispatcher, Some, &Interrupt::new())
        .unwrap();
    assert_eq!(got, None);
    assert_eq!(dispatcher.dispatches.load(Ordering::SeqCst), 0);
}

#[test]
fn test_interrupt_aborts_race_without_fault_and_stays_set() {
    let dispatcher = FakeDispatcher::new(vec![
        (member(0), ScriptedPending::never()),
        (member(1), ScriptedPending::never()),
        (member(2), ScriptedPending::never()),
    ]);
    let interrupt = Interrupt::new();
    let trigger = interrupt.clone();
    let join = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        trigger.trigger();
    });

    let got = racing_coordinator(3)
        .race_for_first_match(&ProbeTask, &dispatcher.members(), &dispatcher, Some, &interrupt)
        .unwrap();

    assert_eq!(got, None);
    assert!(interrupt.is_set());
    join.join().unwrap();
}

// --- loopback cluster end to end ---

#[derive(Debug, Clone, Serialize)]
struct HolderLookup {
    holder: Member,
    failing: Option<Member>,
}

impl ClusterTask for HolderLookup {
    type Output = Option<String>;

    fn name(&self) -> &str {
        "holder-lookup"
    }
}

impl LocalTask for HolderLookup {
    fn run(&self, member: &Member) -> fanout::Result<Option<String>> {
        if self.failing.as_ref() == Some(member) {
            anyhow::bail!("store offline on {member}");
        }
        if &self.holder == member {
            Ok(Some(format!("payload@{member}")))
        } else {
            Ok(None)
        }
    }
}

#[test]
fn test_loopback_race_finds_the_single_holder() {
    let members: Vec<Member> = (0..4).map(member).collect();
    let task = HolderLookup {
        holder: member(2),
        failing: None,
    };
    let dispatcher = LoopbackDispatcher::new();
    let got = racing_coordinator(4)
        .race_for_first_match(&task, &members, &dispatcher, |v| v, &Interrupt::new())
        .unwrap();
    assert_eq!(got, Some("payload@node-2".to_string()));
}

#[test]
fn test_loopback_collect_all_includes_every_member() {
    let members: Vec<Member> = (0..3).map(member).collect();
    let task = HolderLookup {
        holder: member(1),
        failing: None,
    };
    let dispatcher = LoopbackDispatcher::new();
    let results = sequential_coordinator()
        .collect_all(&task, &members, &dispatcher, &Interrupt::new())
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.get(&member(1)),
        Some(&Some("payload@node-1".to_string()))
    );
    assert_eq!(results.get(&member(0)), Some(&None));
}

#[test]
fn test_loopback_collect_all_raises_member_failure() {
    let members: Vec<Member> = (0..3).map(member).collect();
    let task = HolderLookup {
        holder: member(0),
        failing: Some(member(1)),
    };
    let dispatcher = LoopbackDispatcher::new();
    let err = sequential_coordinator()
        .collect_all(&task, &members, &dispatcher, &Interrupt::new())
        .unwrap_err();
    assert_eq!(err.member(), Some(&member(1)));
}
