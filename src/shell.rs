use crate::builtin::BuiltinCommand;
use crate::command::{Arity, CommandContext};
use crate::error::ConsoleError;
use crate::logging::LogPipeline;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pipe the argument to the configured shell and log its output line by line.
///
/// Blocks until the child exits, or until `shell_timeout` elapses and the child is
/// killed.
#[derive(Default)]
pub(crate) struct Sh;

impl BuiltinCommand for Sh {
    fn name() -> &'static str {
        "sh"
    }

    fn arity() -> Arity {
        Arity::Exact(1)
    }

    fn help() -> &'static str {
        "Executes a shell command `sh ls -la`"
    }

    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        if args.trim().is_empty() {
            anyhow::bail!("nothing to run");
        }
        let (program, leading) = ctx
            .config
            .shell_program
            .split_first()
            .context("no shell program configured")?;

        let spawned = std::process::Command::new(program)
            .args(leading)
            .arg(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                ctx.log.error(ConsoleError::SubprocessSpawnFailure(err));
                return Ok(());
            }
        };
        log::debug!("sh: spawned pid {} for `{}`", child.id(), args);

        let stdout = child.stdout.take().context("child stdout was not captured")?;
        let outcome = match ctx.config.shell_timeout {
            None => stream(stdout, &mut child, ctx.log)?,
            Some(limit) => stream_with_deadline(stdout, limit, &mut child, ctx.log)?,
        };
        let Some(status) = outcome else {
            return Ok(());
        };

        if !status.success() {
            let code = status.code().unwrap_or_else(|| terminated_by_signal(status));
            ctx.log.warning(format!("sh: exited with status {code}"));
        }
        Ok(())
    }
}

/// Lines of `reader` without their terminator, invalid UTF-8 replaced.
fn lossy_lines<R: Read>(reader: R) -> impl Iterator<Item = std::io::Result<String>> {
    BufReader::new(reader).split(b'\n').map(|line| {
        line.map(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

/// Forward output until the pipe closes, then reap the child.
///
/// The child is waited for even when reading fails.
fn stream<R: Read>(
    stdout: R,
    child: &mut Child,
    log: &LogPipeline,
) -> Result<Option<ExitStatus>> {
    let mut read_error = None;
    for line in lossy_lines(stdout) {
        match line {
            Ok(line) => log.info(line),
            Err(err) => {
                read_error = Some(err);
                break;
            }
        }
    }
    // The pipe is closed here, so a child still writing gets SIGPIPE instead of blocking.
    let status = child.wait()?;
    match read_error {
        Some(err) => Err(err.into()),
        None => Ok(Some(status)),
    }
}

/// Like [`stream`], but the whole run, output and exit, must fit in `limit`.
///
/// Returns `None` when the child had to be killed.
fn stream_with_deadline<R: Read + Send + 'static>(
    stdout: R,
    limit: Duration,
    child: &mut Child,
    log: &LogPipeline,
) -> Result<Option<ExitStatus>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in lossy_lines(stdout) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let deadline = Instant::now() + limit;
    let mut read_error = None;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(line)) => log.info(line),
            Ok(Err(err)) => {
                read_error = Some(err);
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => return kill_and_reap(child, limit, log),
        }
    }
    drop(rx);

    // Output is done but the child may keep running with its stdout closed.
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return match read_error {
                    Some(err) => Err(err.into()),
                    None => Ok(Some(status)),
                };
            }
            Ok(None) if Instant::now() >= deadline => return kill_and_reap(child, limit, log),
            Ok(None) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                thread::sleep(POLL_INTERVAL.min(remaining));
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err.into());
            }
        }
    }
}

fn kill_and_reap(
    child: &mut Child,
    limit: Duration,
    log: &LogPipeline,
) -> Result<Option<ExitStatus>> {
    // Reap even if the kill failed, then report the kill error.
    let killed = child.kill();
    child.wait()?;
    killed?;
    log.error(format!("sh: killed after {} ms", limit.as_millis()));
    Ok(None)
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
