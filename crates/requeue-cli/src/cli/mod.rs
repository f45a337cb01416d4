//! CLI for the requeue retry engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use requeue_core::config;
use std::path::PathBuf;

use commands::{run_classify, run_config, run_simulate};

/// Top-level CLI for requeue.
#[derive(Debug, Parser)]
#[command(name = "requeue")]
#[command(about = "requeue: retry decisions for fetch pipelines", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/requeue/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show the config file location and the effective retry configuration.
    Config,

    /// Check whether a status code or failure kind would be retried.
    Classify {
        /// HTTP status code, e.g. 503.
        #[arg(long, conflicts_with = "error", required_unless_present = "error")]
        status: Option<u16>,
        /// Failure kind name, e.g. ConnectionRefused or requeue::net::Dns.
        #[arg(long)]
        error: Option<String>,
    },

    /// Run a scripted scenario file through the retry policy.
    Simulate {
        /// Path to the scenario TOML file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg_path, cfg) = match &cli.config {
            Some(path) => (path.clone(), config::load_from_path(path)?),
            None => (config::config_path()?, config::load_or_init()?),
        };
        tracing::debug!("loaded config from {}: {:?}", cfg_path.display(), cfg);

        match cli.command {
            CliCommand::Config => run_config(&cfg_path, &cfg)?,
            CliCommand::Classify { status, error } => {
                run_classify(&cfg, status, error.as_deref())?
            }
            CliCommand::Simulate { path } => run_simulate(&cfg, &path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
