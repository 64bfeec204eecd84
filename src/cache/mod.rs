//! Per-command output cache
//!
//! Commands are addressed by a digest of their text; each key owns a single
//! plain-text file holding the most recent run's output.

pub mod key;
pub mod store;

pub use key::CommandKey;
pub use store::{CacheStore, CachedLines};
