//! Diagnostic logging for fzfcache
//!
//! Logs always go to stderr; stdout carries nothing but result lines. The
//! default level is `warn` so interactive use next to a fuzzy finder stays
//! quiet.
//!
//! Events use structured fields:
//!
//! - `operation`: phase being performed ("read", "replay", "spawn", "run", "publish")
//! - `status`: outcome ("hit", "miss", "success", exit status of the command)
//! - `key`: command key (hex digest)
//! - `line_count`: number of lines involved

use std::{fmt as std_fmt, io};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

pub const LOG_FORMAT_ENV: &str = "FZFCACHE_LOG_FORMAT";

const DEFAULT_FILTER: &str = "warn";

/// Shows "(fzfcache)" in place of the module path
struct FzfcacheFormatter {
    with_ansi: bool,
}

impl<S, N> FormatEvent<S, N> for FzfcacheFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "{} ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z")
        )?;

        if self.with_ansi {
            let level_style = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m",
                tracing::Level::WARN => "\x1b[33m",
                tracing::Level::INFO => "\x1b[32m",
                tracing::Level::DEBUG => "\x1b[34m",
                tracing::Level::TRACE => "\x1b[35m",
            };
            write!(writer, "{}{:5}(fzfcache)\x1b[0m: ", level_style, meta.level())?;
        } else {
            write!(writer, "{:5}(fzfcache): ", meta.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, human-readable
    Pretty,
    /// Same layout without color
    Compact,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse from `FZFCACHE_LOG_FORMAT`, falling back on `CI`
    pub fn from_env() -> Self {
        let requested = std::env::var(LOG_FORMAT_ENV).unwrap_or_default();
        Self::parse(&requested, std::env::var_os("CI").is_some())
    }

    fn parse(value: &str, in_ci: bool) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            _ if in_ci => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` sets the filter (default `warn`). Calling this more than once
/// keeps the first subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match LogFormat::from_env() {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(FzfcacheFormatter { with_ansi: true })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(FzfcacheFormatter { with_ansi: false })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .try_init(),
    };

    // Already installed (tests, embedding): keep the existing one
    if let Err(e) = result {
        tracing::debug!(error = %e, "global subscriber already set");
    }
}
