use clap::{CommandFactory, Parser};
use std::ffi::OsString;

/// Arguments that ask for usage when given alone
const HELP_FLAGS: [&str; 3] = ["-h", "-help", "--help"];

const AFTER_HELP: &str = "\
Environment:
  FZFCACHE_DIR         Cache directory (default: $XDG_CACHE_HOME/fzfcache or ~/.cache/fzfcache)
  XDG_CACHE_HOME       Base cache directory
  SHELL                Shell used to run the command (default: sh)
  RUST_LOG             Diagnostic log filter (default: warn)
  FZFCACHE_LOG_FORMAT  Diagnostic log format: pretty, compact or json";

/// fzfcache - cache shell command output for fuzzy finders
///
/// Prints the cached output of the command (if any), then runs it and prints
/// lines that were not shown yet. The new output replaces the cache. This is
/// typically piped into fzf, to decrease the time until it is interactive.
///
/// clap describes the arguments and renders usage, but the words themselves
/// are taken verbatim with [`Cli::from_args`]: a leading `--` belongs to the
/// command and words need not be UTF-8.
#[derive(Parser, Debug)]
#[command(name = "fzfcache")]
#[command(override_usage = "fzfcache [-h] <SHELL COMMAND...>")]
#[command(
    about = "Caches the output of a shell command and/or prints the cached results",
    long_about = None
)]
#[command(after_help = AFTER_HELP)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Shell command to run; all words are joined with single spaces
    #[arg(
        value_name = "SHELL COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<OsString>,
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    MissingCommand,
    Run(OsString),
}

impl Cli {
    /// Arguments of the current process, program name excluded
    pub fn from_env() -> Self {
        Self::from_args(std::env::args_os().skip(1))
    }

    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            command: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn invocation(&self) -> Invocation {
        match self.command.as_slice() {
            [] => Invocation::MissingCommand,
            [flag] if flag.to_str().is_some_and(|f| HELP_FLAGS.contains(&f)) => Invocation::Help,
            words => Invocation::Run(join_words(words)),
        }
    }

    /// Usage text, meant for stderr
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}

fn join_words(words: &[OsString]) -> OsString {
    let mut command = OsString::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            command.push(" ");
        }
        command.push(word);
    }
    command
}
