/// Acceptance tests for the fzfcache binary
///
/// Each test gets its own cache directory through FZFCACHE_DIR and runs
/// commands with a plain POSIX shell.
use assert_cmd::Command;
use fzfcache::CommandKey;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn cache_dir(&self) -> PathBuf {
        self.path().join("cache")
    }

    fn fzfcache(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fzfcache"));
        cmd.env("FZFCACHE_DIR", self.cache_dir())
            .env("SHELL", "sh")
            .env_remove("RUST_LOG")
            .env_remove("FZFCACHE_LOG_FORMAT");
        cmd
    }

    fn write_data(&self, content: &str) -> PathBuf {
        let path = self.path().join("data.txt");
        fs::write(&path, content).unwrap();
        path
    }

    fn cached(&self, command: &str) -> Option<String> {
        fs::read_to_string(self.cache_dir().join(CommandKey::derive(command).as_str())).ok()
    }
}

#[test]
fn test_help_flags_print_usage_to_stderr() {
    let workspace = TestWorkspace::new();

    for flag in ["-h", "-help", "--help"] {
        workspace
            .fzfcache()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Usage: fzfcache [-h] <SHELL COMMAND...>"));
    }

    assert!(!workspace.cache_dir().exists());
}

#[test]
fn test_no_arguments_is_an_error() {
    let workspace = TestWorkspace::new();

    workspace
        .fzfcache()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage:"))
        .stderr(predicate::str::contains("needs a command"));
}

#[test]
fn test_first_run_then_replay() {
    let workspace = TestWorkspace::new();
    let data = workspace.write_data("x\ny\n");
    let command = format!("cat {}", data.display());

    // First run - nothing cached, live output only
    workspace
        .fzfcache()
        .arg("cat")
        .arg(&data)
        .assert()
        .success()
        .stdout("x\ny\n");

    assert_eq!(workspace.cached(&command).unwrap(), "x\ny\n");

    // Second run - replayed lines are not repeated by the live run
    workspace
        .fzfcache()
        .arg("cat")
        .arg(&data)
        .assert()
        .success()
        .stdout("x\ny\n");
}

#[test]
fn test_refresh_shows_new_lines_and_replaces_cache() {
    let workspace = TestWorkspace::new();
    let data = workspace.write_data("x\ny\n");
    let command = format!("cat {}", data.display());

    workspace.fzfcache().arg(&command).assert().success();

    workspace.write_data("y\nz\n");
    workspace
        .fzfcache()
        .arg(&command)
        .assert()
        .success()
        .stdout("x\ny\nz\n");

    assert_eq!(workspace.cached(&command).unwrap(), "y\nz\n");
}

#[test]
fn test_duplicate_output_lines_are_shown_once() {
    let workspace = TestWorkspace::new();
    let command = r"printf 'a\na\nb\na\n'";

    workspace
        .fzfcache()
        .arg(command)
        .assert()
        .success()
        .stdout("a\nb\n");

    // The cache holds the raw output, not the deduplicated view
    assert_eq!(workspace.cached(command).unwrap().lines().count(), 4);
}

#[test]
fn test_words_and_single_string_share_a_cache_entry() {
    let workspace = TestWorkspace::new();

    workspace
        .fzfcache()
        .args(["echo", "hello", "world"])
        .assert()
        .success()
        .stdout("hello world\n");

    assert_eq!(workspace.cached("echo hello world").unwrap(), "hello world\n");
}

#[test]
fn test_leading_double_dash_is_passed_to_the_shell() {
    let workspace = TestWorkspace::new();

    // `--` is not a command, so the shell fails on it
    workspace
        .fzfcache()
        .args(["--", "echo", "hi"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("command failed"));

    assert_eq!(workspace.cached("-- echo hi").unwrap(), "");
    assert!(workspace.cached("echo hi").is_none());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_argument_is_run_and_cached() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let workspace = TestWorkspace::new();
    let entry = workspace
        .cache_dir()
        .join(CommandKey::derive(b"echo caf\xe9").as_str());

    for _ in 0..2 {
        workspace
            .fzfcache()
            .arg("echo")
            .arg(OsStr::from_bytes(b"caf\xe9"))
            .assert()
            .success()
            .stdout(&b"caf\xe9\n"[..]);
    }

    assert_eq!(fs::read(entry).unwrap(), b"caf\xe9\n");
}

#[test]
fn test_failing_command_publishes_and_exits_nonzero() {
    let workspace = TestWorkspace::new();
    let command = "echo q; exit 3";

    workspace
        .fzfcache()
        .arg(command)
        .assert()
        .code(1)
        .stdout("q\n")
        .stderr(predicate::str::contains("command failed"));

    assert_eq!(workspace.cached(command).unwrap(), "q\n");
}

#[test]
fn test_command_stderr_is_mirrored() {
    let workspace = TestWorkspace::new();

    workspace
        .fzfcache()
        .arg("echo problem >&2; echo result")
        .assert()
        .success()
        .stdout("result\n")
        .stderr(predicate::str::contains("problem"));
}

#[test]
fn test_missing_shell_fails_without_publishing() {
    let workspace = TestWorkspace::new();

    workspace
        .fzfcache()
        .env("SHELL", "/nonexistent/fzfcache-shell")
        .arg("echo hi")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("could not start command"));

    assert!(workspace.cached("echo hi").is_none());
}

#[test]
fn test_uncreatable_cache_dir_fails() {
    let workspace = TestWorkspace::new();
    let blocker = workspace.path().join("blocker");
    fs::write(&blocker, "file").unwrap();

    workspace
        .fzfcache()
        .env("FZFCACHE_DIR", blocker.join("cache"))
        .arg("echo hi")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("could not create cache directory"));
}

#[test]
fn test_xdg_cache_home_is_used_without_override() {
    let workspace = TestWorkspace::new();
    let xdg = workspace.path().join("xdg");

    workspace
        .fzfcache()
        .env_remove("FZFCACHE_DIR")
        .env("XDG_CACHE_HOME", &xdg)
        .arg("echo hi")
        .assert()
        .success()
        .stdout("hi\n");

    let entry = xdg
        .join("fzfcache")
        .join(CommandKey::derive("echo hi").as_str());
    assert_eq!(fs::read_to_string(entry).unwrap(), "hi\n");
}

#[cfg(unix)]
#[test]
fn test_cache_dir_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let workspace = TestWorkspace::new();
    workspace.fzfcache().arg("echo hi").assert().success();

    let mode = fs::metadata(workspace.cache_dir())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o077, 0, "group/other bits set: {:o}", mode);
}
