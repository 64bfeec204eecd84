use std::ffi::OsStr;
use std::process::ExitCode;

use fzfcache::cli::{Cli, Invocation};
use fzfcache::config::Config;
use fzfcache::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::from_env();

    let command = match cli.invocation() {
        Invocation::Help => {
            eprint!("{}", Cli::usage());
            return ExitCode::SUCCESS;
        }
        Invocation::MissingCommand => {
            eprint!("{}", Cli::usage());
            eprintln!("Error: not enough arguments, needs a command");
            return ExitCode::FAILURE;
        }
        Invocation::Run(command) => command,
    };

    let config = Config::from_env();

    match run(&config, &command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Single line: message followed by its causes
            eprintln!("fzfcache: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, command: &OsStr) -> anyhow::Result<()> {
    tracing::debug!(
        cache_dir = %config.cache_dir.display(),
        shell = %config.shell,
        "configuration resolved"
    );

    let summary = fzfcache::run_cached(config, command).await?;

    tracing::debug!(
        key = %summary.key,
        replayed = summary.replayed,
        displayed = summary.displayed,
        staged = summary.staged,
        "done"
    );

    Ok(())
}
