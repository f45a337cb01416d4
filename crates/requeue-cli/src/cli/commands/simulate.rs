//! `requeue simulate` – play a scenario file through the configured policy.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use requeue_core::config::RequeueConfig;
use requeue_core::retry::RetryPolicy;
use requeue_core::scenario::{RequestOutcome, Scenario, Simulator};
use requeue_core::stats::MemoryStats;

pub fn run_simulate(cfg: &RequeueConfig, path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let stats = Arc::new(MemoryStats::new());
    let policy = RetryPolicy::from_config(&cfg.retry, stats.clone())?;
    if policy.is_none() {
        tracing::info!("retries disabled; simulating without a retry policy");
    }

    let report = Simulator::run(&scenario, policy.as_ref());

    println!("{:<4} {:<10} {:<8} {}", "#", "RESULT", "FETCHES", "REQUEST");
    for (i, r) in report.requests.iter().enumerate() {
        let (result, fetches, detail) = match &r.outcome {
            RequestOutcome::Completed { status, fetches } => {
                (status.to_string(), fetches.to_string(), String::new())
            }
            RequestOutcome::Failed { error, fetches } => {
                ("failed".to_string(), fetches.to_string(), format!(" {error}"))
            }
            RequestOutcome::Filtered => ("filtered".to_string(), "-".to_string(), String::new()),
        };
        println!("{:<4} {:<10} {:<8} {}{}", i, result, fetches, r.request, detail);
    }

    println!("\n{} fetches", report.fetches);
    for (key, value) in stats.snapshot() {
        println!("{key:<48} {value}");
    }
    Ok(())
}
