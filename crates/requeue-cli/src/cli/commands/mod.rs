//! CLI command handlers, one per file.

mod classify;
mod config;
mod simulate;

pub use classify::run_classify;
pub use config::run_config;
pub use simulate::run_simulate;
