//! Error taxonomy for a cached command invocation
//!
//! Messages name the failing resource only; the underlying I/O error is
//! exposed through `source()` so callers can render the whole chain on one
//! line with `{:#}`.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The cache directory could not be created
    #[error("could not create cache directory '{}'", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A cache file, temporary file or output stream failed
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The shell could not be started
    #[error("could not start command with shell '{shell}'")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },

    /// The command ran but did not exit successfully
    #[error("command failed ({status})")]
    Command { status: ExitStatus },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this is a command failure, the one category that does not
    /// prevent the cache from being published.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::Command { .. })
    }
}
