//! Invocation configuration resolved from the environment
//!
//! Resolution happens once at startup and produces an immutable [`Config`]
//! that is passed explicitly to the cache store and the command runner.
//!
//! Cache directory precedence:
//! - `$FZFCACHE_DIR`, used as-is
//! - `$XDG_CACHE_HOME/fzfcache`
//! - `$HOME/.cache/fzfcache`
//!
//! Empty variables are treated as unset.

use std::ffi::OsString;
use std::path::PathBuf;

pub const CACHE_DIR_ENV: &str = "FZFCACHE_DIR";
pub const XDG_CACHE_HOME_ENV: &str = "XDG_CACHE_HOME";
pub const HOME_ENV: &str = "HOME";
pub const SHELL_ENV: &str = "SHELL";

/// Shell used when `$SHELL` is unset or empty
pub const DEFAULT_SHELL: &str = "sh";

const APP_DIR: &str = "fzfcache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one cache file per command key
    pub cache_dir: PathBuf,
    /// Interpreter invoked as `<shell> -c <command>`
    pub shell: String,
}

impl Config {
    /// Resolve from the process environment
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var_os(name))
    }

    /// Resolve from an arbitrary variable lookup
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let cache_dir = if let Some(dir) = var(CACHE_DIR_ENV) {
            PathBuf::from(dir)
        } else if let Some(xdg_cache) = var(XDG_CACHE_HOME_ENV) {
            PathBuf::from(xdg_cache).join(APP_DIR)
        } else if let Some(home) = var(HOME_ENV).map(PathBuf::from).or_else(dirs::home_dir) {
            home.join(".cache").join(APP_DIR)
        } else {
            // No home directory at all; stay relative like an unset $HOME would
            PathBuf::from(".cache").join(APP_DIR)
        };

        let shell = var(SHELL_ENV)
            .map(|shell| shell.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());

        Self { cache_dir, shell }
    }
}
