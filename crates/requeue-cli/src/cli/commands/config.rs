//! `requeue config` – show where configuration lives and what it resolves to.

use anyhow::{Context, Result};
use requeue_core::config::RequeueConfig;
use std::path::Path;

pub fn run_config(path: &Path, cfg: &RequeueConfig) -> Result<()> {
    println!("# {}", path.display());
    let toml = toml::to_string_pretty(cfg).context("serialize config")?;
    print!("{toml}");

    match cfg.retry.resolve()? {
        None => println!("\n# retries disabled"),
        Some(settings) => {
            let mut codes: Vec<_> = settings.retryable_status_codes.iter().collect();
            codes.sort();
            let mut kinds: Vec<_> = settings.retryable_failures.iter().collect();
            kinds.sort();
            println!(
                "\n# resolved: up to {} retries, priority {:+} per retry",
                settings.max_retry_times, settings.priority_adjust
            );
            println!("# status codes: {codes:?}");
            for kind in kinds {
                println!("# failure: {kind}");
            }
        }
    }
    Ok(())
}
