pub mod config;
pub mod logging;

pub mod request;
pub mod retry;
pub mod scenario;
pub mod stats;
