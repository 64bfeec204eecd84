//! Cached command orchestration
//!
//! One invocation moves through `replay -> run -> publish`:
//!
//! 1. Replay prints the previous output of the same command (if any) and
//!    marks every line as seen.
//! 2. Run executes the command, displaying only lines not seen yet and
//!    staging its full output.
//! 3. Publish replaces the cache entry with the staged output.
//!
//! A command that exits unsuccessfully is still published; the failure is
//! reported afterwards. Every other error stops the invocation where it
//! happens.

use std::ffi::OsStr;
use tokio::io::AsyncWrite;
use tracing::{debug, info};

use crate::cache::{CacheStore, CommandKey};
use crate::config::Config;
use crate::dedup::SeenLines;
use crate::error::{Error, Result};
use crate::executor::{CommandRunner, LineSink};

/// What a successful invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub key: CommandKey,
    /// Lines displayed from the cache before the command ran
    pub replayed: usize,
    /// Lines displayed while the command ran
    pub displayed: usize,
    /// Lines published as the new cache entry
    pub staged: usize,
}

pub struct Orchestrator {
    store: CacheStore,
    runner: CommandRunner,
}

impl Orchestrator {
    /// Open the cache store described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            store: CacheStore::open(&config.cache_dir)?,
            runner: CommandRunner::new(config.shell.clone()),
        })
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Replay, run and publish `command`, writing result lines to `display`
    /// and the command's stderr to `errors`.
    ///
    /// The command is taken as raw OS text: its bytes are hashed and handed to
    /// the shell unchanged.
    pub async fn run<W, E>(
        &self,
        command: impl AsRef<OsStr>,
        display: W,
        errors: E,
    ) -> Result<RunSummary>
    where
        W: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        let command = command.as_ref();
        let key = CommandKey::derive(command.as_encoded_bytes());
        debug!(key = %key, command = ?command, "resolved command key");

        let mut seen = SeenLines::new();
        let (replayed, display) = self.replay(&key, &mut seen, display).await?;

        let output = self.runner.run(command, seen, display, errors).await?;

        self.store.publish(&key, &output.staged)?;

        info!(
            operation = "publish",
            key = %key,
            line_count = output.staged.len(),
            replayed,
            displayed = output.displayed,
            "cache refreshed"
        );

        if !output.status.success() {
            return Err(Error::Command {
                status: output.status,
            });
        }

        Ok(RunSummary {
            key,
            replayed,
            displayed: output.displayed,
            staged: output.staged.len(),
        })
    }

    /// Print the cached lines for `key` and mark them seen. Hands the display
    /// back, flushed, for the live run.
    async fn replay<W>(
        &self,
        key: &CommandKey,
        seen: &mut SeenLines,
        display: W,
    ) -> Result<(usize, W)>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(lines) = self.store.read(key)? else {
            return Ok((0, display));
        };

        let mut display = LineSink::new(display, "stdout");
        let mut replayed = 0;
        for line in lines {
            let line = line?;
            // The cache keeps raw output, so it may repeat lines
            if seen.observe(&line) && display.write_line(&line).await {
                replayed += 1;
            }
        }
        display.flush().await;

        debug!(operation = "replay", key = %key, line_count = replayed, "cache replayed");
        Ok((replayed, display.into_inner()))
    }
}

/// Run `command` against the configured cache using the process's own
/// stdout and stderr
pub async fn run_cached(config: &Config, command: &OsStr) -> Result<RunSummary> {
    Orchestrator::new(config)?
        .run(command, tokio::io::stdout(), tokio::io::stderr())
        .await
}
