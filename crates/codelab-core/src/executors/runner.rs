//! Runs a materialized submission under a wall-clock deadline.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::{AbortHandle, JoinHandle};

use super::materializer::{materialize, SourceHandle};
use super::{CodeExecutor, ExecutionOutcome};
use crate::config::ExecutionConfig;
use crate::errors::ExecutionError;

/// How long output readers may keep draining once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8 * 1024;

/// Executes submissions as direct children of the server process.
///
/// Each run gets its own process group so the whole tree can be killed when
/// the deadline passes. No isolation beyond that is applied.
#[derive(Debug, Clone)]
pub struct LocalProcessExecutor {
    config: ExecutionConfig,
}

impl LocalProcessExecutor {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Build the interpreter invocation. The source path is the only argument;
    /// the submitted text never reaches a shell or the argument list.
    pub fn command(&self, source: &Path) -> Command {
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    /// Run the file behind `handle` and wait at most `deadline` for it.
    ///
    /// If the returned future is dropped before it resolves, the process
    /// group is killed and the output readers are stopped.
    pub async fn run(&self, handle: &SourceHandle, deadline: Duration) -> ExecutionOutcome {
        let mut child = match self.command(handle.path()).spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = ExecutionError::Launch {
                    interpreter: self.config.interpreter.clone(),
                    message: e.to_string(),
                };
                log::error!("Submission {}: {}", handle.id(), err);
                return ExecutionOutcome::LaunchFailed {
                    message: err.to_string(),
                };
            }
        };

        let pid = child.id();
        log::debug!(
            "Submission {} started as pid {:?} with deadline {:?}",
            handle.id(),
            pid,
            deadline
        );

        let mut stdout_reader = OutputReader::spawn(child.stdout.take());
        let mut stderr_reader = OutputReader::spawn(child.stderr.take());
        let mut guard = RunGuard {
            pid,
            readers: [stdout_reader.abort_handle(), stderr_reader.abort_handle()],
        };
        let started = Instant::now();

        tokio::select! {
            status = child.wait() => {
                // Anything the submission left running in the background would
                // hold the pipes open; it goes down with the group.
                guard.terminate_group();

                let (stdout, stderr) = tokio::join!(
                    stdout_reader.collect(),
                    stderr_reader.collect()
                );

                match status {
                    Ok(status) => {
                        log::debug!(
                            "Submission {} exited with {:?} after {:?}",
                            handle.id(),
                            status.code(),
                            started.elapsed()
                        );
                        ExecutionOutcome::Completed {
                            stdout,
                            stderr,
                            exit_code: status.code(),
                        }
                    }
                    Err(e) => {
                        log::error!("Submission {}: failed to wait for child: {}", handle.id(), e);
                        ExecutionOutcome::LaunchFailed {
                            message: ExecutionError::Io(e).to_string(),
                        }
                    }
                }
            }
            _ = tokio::time::sleep(deadline) => {
                log::warn!(
                    "Submission {} timed out after {:?}, killing process group {:?}",
                    handle.id(),
                    deadline,
                    pid
                );
                guard.terminate_group();
                if let Err(e) = child.kill().await {
                    log::warn!("Submission {}: failed to kill child: {}", handle.id(), e);
                }

                let (stdout, stderr) = tokio::join!(
                    stdout_reader.collect(),
                    stderr_reader.collect()
                );

                ExecutionOutcome::TimedOut {
                    stdout,
                    stderr,
                    deadline,
                }
            }
        }
    }
}

/// Tears down a running submission when `run` is cancelled mid-flight.
///
/// `kill_on_drop` only reaches the direct child; the group kill here also
/// covers whatever it started in the background.
struct RunGuard {
    pid: Option<u32>,
    readers: [AbortHandle; 2],
}

impl RunGuard {
    /// Kill the process group once; later calls are no-ops.
    fn terminate_group(&mut self) {
        terminate_group(self.pid.take());
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.pid.is_some() {
            log::debug!("Run cancelled, killing process group {:?}", self.pid);
        }
        self.terminate_group();
        for reader in &self.readers {
            reader.abort();
        }
    }
}

#[async_trait]
impl CodeExecutor for LocalProcessExecutor {
    async fn execute(&self, code: &str) -> ExecutionOutcome {
        let mut handle = match materialize(code, &self.config.source_dir()).await {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to materialize submission: {}", e);
                return ExecutionOutcome::LaunchFailed {
                    message: e.to_string(),
                };
            }
        };

        let outcome = self.run(&handle, self.config.timeout()).await;

        if let Err(e) = handle.release() {
            log::warn!(
                "Failed to remove submission {} at {}: {}",
                handle.id(),
                handle.path().display(),
                e
            );
        }

        outcome
    }
}

type OutputBuffer = Arc<Mutex<Vec<u8>>>;

/// Drains one child pipe into a buffer that stays readable if the drain is
/// cut short.
struct OutputReader {
    task: JoinHandle<()>,
    buffer: OutputBuffer,
}

impl OutputReader {
    fn spawn<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = OutputBuffer::default();
        let task = tokio::spawn(drain(reader, buffer.clone()));
        Self { task, buffer }
    }

    fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    /// Wait up to `DRAIN_GRACE` for end of stream, then return whatever was
    /// read so far.
    async fn collect(&mut self) -> String {
        match tokio::time::timeout(DRAIN_GRACE, &mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Output reader failed: {}", e),
            Err(_) => {
                // A descendant outside the process group still holds the pipe.
                log::debug!("Output still open after {:?}, keeping what was read", DRAIN_GRACE);
                self.task.abort();
                let _ = (&mut self.task).await;
            }
        }

        let bytes = std::mem::take(&mut *lock_buffer(&self.buffer));
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn lock_buffer(buffer: &OutputBuffer) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, buffer: OutputBuffer) {
    let Some(mut reader) = reader else {
        return;
    };

    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => lock_buffer(&buffer).extend_from_slice(&chunk[..n]),
            Err(e) => {
                log::debug!("Stopped reading child output: {}", e);
                break;
            }
        }
    }
}

#[cfg(unix)]
fn terminate_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };

    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("Failed to kill process group {}: {}", raw, e),
    }
}

#[cfg(not(unix))]
fn terminate_group(_pid: Option<u32>) {}
