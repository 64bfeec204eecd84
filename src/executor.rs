/// Command runner
///
/// Spawns `<shell> -c <command>` and drains both output pipes concurrently:
/// stdout lines go through the seen-lines set to the display and are staged
/// for the cache, stderr lines are mirrored straight to the error stream.
use std::io;
use std::process::{ExitStatus, Stdio};
use std::ffi::OsStr;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dedup::{trim_line_ending, SeenLines};
use crate::error::{Error, Result};

/// Everything a finished command run produced
#[derive(Debug)]
pub struct RunOutput<W, E> {
    pub status: ExitStatus,
    /// Raw stdout lines in arrival order, duplicates included
    pub staged: Vec<Vec<u8>>,
    pub seen: SeenLines,
    /// Number of lines written to the display during the run
    pub displayed: usize,
    pub display: W,
    pub errors: E,
}

/// Runs commands through a shell
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
}

impl CommandRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Run `command` to completion.
    ///
    /// Only a failure to start the shell (or to read its pipes) is an error; a
    /// non-zero exit is reported through [`RunOutput::status`] so the caller
    /// can still publish what was collected.
    pub async fn run<W, E>(
        &self,
        command: impl AsRef<OsStr>,
        seen: SeenLines,
        display: W,
        errors: E,
    ) -> Result<RunOutput<W, E>>
    where
        W: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command.as_ref())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        debug!(
            operation = "spawn",
            shell = %self.shell,
            pid = ?child.id(),
            "command started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::io("failed to capture command stdout", not_piped()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::io("failed to capture command stderr", not_piped()))?;

        // The stdout task is the only owner of the seen-lines set and the
        // staging buffer while the command runs
        let stdout_task = tokio::spawn(stream_stdout(stdout, seen, display));
        let stderr_task = tokio::spawn(mirror_stderr(stderr, errors));

        let status = child
            .wait()
            .await
            .map_err(|e| Error::io("failed to wait for command", e))?;

        let streamed = join_stream(stdout_task, "stdout").await?;
        let errors = join_stream(stderr_task, "stderr").await?;

        debug!(
            operation = "run",
            status = %status,
            staged = streamed.staged.len(),
            displayed = streamed.displayed,
            "command finished"
        );

        Ok(RunOutput {
            status,
            staged: streamed.staged,
            seen: streamed.seen,
            displayed: streamed.displayed,
            display: streamed.display,
            errors,
        })
    }
}

/// Result of draining the stdout pipe
struct Streamed<W> {
    staged: Vec<Vec<u8>>,
    seen: SeenLines,
    displayed: usize,
    display: W,
}

/// Stage every line and display the ones not seen before.
///
/// Once the display rejects a write (typically a closed pipe because the
/// finder exited) nothing more is displayed, but the pipe is still drained so
/// the command can finish and the cache is refreshed.
async fn stream_stdout<R, W>(
    reader: R,
    mut seen: SeenLines,
    display: W,
) -> io::Result<Streamed<W>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut display = LineSink::new(display, "stdout");
    let mut buf = Vec::new();
    let mut staged = Vec::new();
    let mut displayed = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = trim_line_ending(&buf);

        if seen.observe(line) && display.write_line(line).await {
            displayed += 1;
        }
        staged.push(line.to_vec());

        // Nothing else is ready yet: show what we have
        if reader.buffer().is_empty() {
            display.flush().await;
        }
    }
    display.flush().await;

    Ok(Streamed {
        staged,
        seen,
        displayed,
        display: display.into_inner(),
    })
}

/// Copy stderr to `errors` line by line, without deduplication
async fn mirror_stderr<R, E>(reader: R, errors: E) -> io::Result<E>
where
    R: AsyncRead + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut errors = LineSink::new(errors, "stderr");
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        errors.write_line(trim_line_ending(&buf)).await;
        if reader.buffer().is_empty() {
            errors.flush().await;
        }
    }
    errors.flush().await;

    Ok(errors.into_inner())
}

/// Buffered line output that stops accepting lines after the first failed
/// write or flush
pub(crate) struct LineSink<W> {
    writer: BufWriter<W>,
    stream: &'static str,
    open: bool,
}

impl<W: AsyncWrite + Unpin> LineSink<W> {
    pub(crate) fn new(writer: W, stream: &'static str) -> Self {
        Self {
            writer: BufWriter::new(writer),
            stream,
            open: true,
        }
    }

    /// Buffer one line. Returns false if the sink is closed.
    pub(crate) async fn write_line(&mut self, line: &[u8]) -> bool {
        if !self.open {
            return false;
        }
        match write_terminated(&mut self.writer, line).await {
            Ok(()) => true,
            Err(e) => {
                self.close(&e);
                false
            }
        }
    }

    pub(crate) async fn flush(&mut self) {
        if !self.open {
            return;
        }
        if let Err(e) = self.writer.flush().await {
            self.close(&e);
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn close(&mut self, err: &io::Error) {
        self.open = false;
        if err.kind() == io::ErrorKind::BrokenPipe {
            debug!(stream = self.stream, "output closed, draining without display");
        } else {
            warn!(
                stream = self.stream,
                error = %err,
                "failed to write output, draining without display"
            );
        }
    }
}

async fn write_terminated<W>(writer: &mut BufWriter<W>, line: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line).await?;
    writer.write_all(b"\n").await
}

async fn join_stream<T>(task: JoinHandle<io::Result<T>>, stream: &str) -> Result<T> {
    task.await
        .map_err(io::Error::from)
        .and_then(|result| result)
        .map_err(|e| Error::io(format!("failed to read command {}", stream), e))
}

fn not_piped() -> io::Error {
    io::Error::other("pipe was not set up")
}
