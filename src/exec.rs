//! Synchronous process execution with a bounded timeout.
//!
//! stdout and stderr are drained on helper threads so a chatty child can never
//! block on a full pipe; the stdin buffer, when present, is written from its own
//! thread and then closed. The calling thread polls `try_wait` until the child
//! exits or the deadline passes. On unix the child leads its own process group,
//! and a timeout kills the whole group, so pipeline members and background jobs
//! started by a shell template go down with it. Collecting the output is bounded
//! by the same deadline, since a background job can hold the pipes open after
//! the child itself has exited.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::Invocation;
use crate::errors::{HarnessError, HarnessResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs `invocation` to completion, or kills it after `timeout`.
///
/// A timeout too large to be represented as a deadline leaves the run unbounded.
pub fn execute(invocation: &Invocation, timeout: Duration) -> HarnessResult<ExecutionResult> {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k, v)))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
    if let Some(cwd) = &invocation.cwd {
        command.current_dir(cwd);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    debug!(command = %invocation.display(), stdin_bytes = invocation.stdin.as_ref().map_or(0, Vec::len), "spawning");
    let started = Instant::now();
    let deadline = started.checked_add(timeout);
    let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
        program: invocation.program.clone(),
        source,
    })?;

    // Not joined: a background job may inherit the pipe and never read it.
    if let (Some(mut pipe), Some(bytes)) = (child.stdin.take(), invocation.stdin.clone()) {
        thread::spawn(move || {
            // A child that exits without reading its input closes the pipe; that is not our failure.
            let _ = pipe.write_all(&bytes);
        });
    }
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = match wait_with_deadline(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => return Err(timed_out(&mut child, invocation, timeout)),
        Err(source) => {
            kill_tree(&mut child);
            return Err(HarnessError::Spawn {
                program: invocation.program.clone(),
                source,
            });
        }
    };

    let (Some(stdout), Some(stderr)) = (
        collect(stdout_reader, deadline),
        collect(stderr_reader, deadline),
    ) else {
        return Err(timed_out(&mut child, invocation, timeout));
    };
    let elapsed = started.elapsed();

    debug!(exit_code = ?status.code(), elapsed_ms = elapsed.as_millis() as u64, "process finished");
    Ok(ExecutionResult {
        exit_code: status.code(),
        stdout,
        stderr,
        elapsed,
    })
}

fn timed_out(child: &mut Child, invocation: &Invocation, timeout: Duration) -> HarnessError {
    warn!(command = %invocation.display(), timeout_secs = timeout.as_secs_f64(), "timed out, killing");
    kill_tree(child);
    HarnessError::Timeout {
        program: invocation.program.clone(),
        timeout,
    }
}

/// Kills the child's process group, then the child itself, and reaps it.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain syscall; the group was created for this child at spawn.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Instant>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                POLL_INTERVAL.min(deadline - now)
            }
            None => POLL_INTERVAL,
        };
        thread::sleep(pause);
    }
}

fn drain<R>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut reader| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Waits for a drained pipe. `None` means the deadline passed first.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<String> {
    let Some(rx) = rx else {
        return Some(String::new());
    };
    let bytes = match deadline {
        Some(deadline) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(bytes) => bytes,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Vec::new(),
        },
        None => rx.recv().unwrap_or_default(),
    };
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
