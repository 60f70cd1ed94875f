//! Fanout demo CLI
//!
//! Spins up an in-process loopback cluster and runs one of the scatter/gather
//! operations against it. The probe task pretends that exactly one member
//! holds a session for the requested key; race mode shows first-match
//! cancellation, collect mode shows the full ordered result set.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use fanout::{
    ClusterTask, CoordinatorConfig, ExecutorService, Interrupt, LocalTask, LoopbackDispatcher,
    Member, MemberResolver, ScatterGather, StaticMembers,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which coordination strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Collect every member's result into an ordered map
    Collect,
    /// Race all members concurrently for the first match
    Race,
    /// Sequential first-match (no worker pool)
    First,
}

/// Fanout - scatter/gather coordinator demo
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Coordination strategy
    #[arg(long, value_enum, default_value = "race")]
    mode: Mode,

    /// Number of loopback cluster members
    #[arg(short = 'n', long, default_value = "5")]
    members: usize,

    /// Index of the member that holds the session (omit for "none found")
    #[arg(long)]
    holder: Option<usize>,

    /// Index of a member whose task fails outright
    #[arg(long)]
    fail: Option<usize>,

    /// Base simulated network latency per member, in milliseconds
    #[arg(long, default_value = "20")]
    latency_ms: u64,

    /// Additional uniform latency jitter, in milliseconds
    #[arg(long, default_value = "30")]
    jitter_ms: u64,

    /// Worker pool threads for race mode (0 = number of CPUs)
    #[arg(short = 't', long, default_value = "0", env = "FANOUT_POOL_THREADS")]
    threads: usize,

    /// Session key the probe looks up
    #[arg(long, default_value = "session-42")]
    key: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

/// Probe task: does this member hold a session for `key`?
#[derive(Debug, Clone, Serialize)]
struct SessionProbe {
    key: String,
    holder: Option<Member>,
    failing: Option<Member>,
}

impl ClusterTask for SessionProbe {
    type Output = Option<String>;

    fn name(&self) -> &str {
        "session-probe"
    }
}

impl LocalTask for SessionProbe {
    fn run(&self, member: &Member) -> fanout::Result<Option<String>> {
        if self.failing.as_ref() == Some(member) {
            anyhow::bail!("session store unavailable on {member}");
        }
        if self.holder.as_ref() == Some(member) {
            Ok(Some(format!("{}@{member}", self.key)))
        } else {
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("Fanout v{}", env!("CARGO_PKG_VERSION"));
    println!("Scatter/gather coordinator demo");
    println!();

    let members: Vec<Member> = (0..cli.members)
        .map(|i| Member::new(format!("node-{i}")))
        .collect();
    let resolver = StaticMembers::new(members);
    let members = resolver.resolve();

    let task = SessionProbe {
        key: cli.key.clone(),
        holder: cli.holder.and_then(|i| members.get(i).cloned()),
        failing: cli.fail.and_then(|i| members.get(i).cloned()),
    };

    let dispatcher = LoopbackDispatcher::with_latency(
        Duration::from_millis(cli.latency_ms),
        Duration::from_millis(cli.jitter_ms),
    );

    let threads = if cli.threads == 0 {
        num_cpus::get().max(1)
    } else {
        cli.threads
    };

    let mut coordinator = ScatterGather::new(CoordinatorConfig::default())?;
    if cli.mode == Mode::Race {
        let pool = Arc::new(ExecutorService::new("fanout-worker", threads)?);
        println!(
            "Racing {} members on {} worker threads",
            members.len(),
            pool.pool_size()
        );
        coordinator = coordinator.with_pool(pool);
    } else {
        println!("Draining {} members sequentially", members.len());
    }
    println!();

    let interrupt = Interrupt::new();
    let start = Instant::now();

    match cli.mode {
        Mode::Collect => {
            let results = coordinator.collect_all(&task, &members, &dispatcher, &interrupt)?;
            let elapsed = start.elapsed();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("Collected {}/{} members:", results.len(), members.len());
                for (member, value) in results.iter() {
                    match value {
                        Some(session) => println!("  {member}: {session}"),
                        None => println!("  {member}: no session"),
                    }
                }
            }
            println!();
            println!("Done in {:.1}ms", elapsed.as_secs_f64() * 1000.0);
        }
        Mode::Race | Mode::First => {
            let outcome = coordinator.race_for_first_match(
                &task,
                &members,
                &dispatcher,
                |value: Option<String>| value,
                &interrupt,
            )?;
            let elapsed = start.elapsed();
            match outcome {
                Some(session) => println!("First match: {session}"),
                None => println!("No member holds '{}'", cli.key),
            }
            println!();
            println!("Done in {:.1}ms", elapsed.as_secs_f64() * 1000.0);
        }
    }

    Ok(())
}
