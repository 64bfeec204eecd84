// Library interface for fzfcache
// The binary is a thin wrapper; integration tests and embedders use these modules

pub mod cache;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod executor;
pub mod logging;
pub mod run;

// Re-export commonly used types
pub use cache::{CacheStore, CommandKey};
pub use config::Config;
pub use error::{Error, Result};
pub use run::{run_cached, Orchestrator, RunSummary};
