//! Bounded execution of submitted source code.
//!
//! A submission is written to a uniquely named temporary file, run by a fixed
//! interpreter under a wall-clock deadline, and turned into the plain text the
//! HTTP layer returns. The child runs with the host's privileges: any isolation
//! (namespaces, read-only mounts, resource limits) has to be added by a
//! `CodeExecutor` that wraps `LocalProcessExecutor`.

use async_trait::async_trait;
use std::time::Duration;

pub mod classifier;
pub mod materializer;
pub mod runner;

pub use classifier::{classify, timeout_message};
pub use materializer::{materialize, SourceHandle};
pub use runner::LocalProcessExecutor;

/// Result of one interpreter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The child exited on its own; a non-zero code is still a completion.
    Completed {
        stdout: String,
        stderr: String,
        /// `None` when the child was terminated by a signal.
        exit_code: Option<i32>,
    },
    /// The deadline elapsed and the child was killed. Output is whatever was
    /// read before termination.
    TimedOut {
        stdout: String,
        stderr: String,
        deadline: Duration,
    },
    /// The interpreter could not be spawned, or the source could not be
    /// written before spawning.
    LaunchFailed { message: String },
}

impl ExecutionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, ExecutionOutcome::TimedOut { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionOutcome::Completed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run `code` once and report how it ended. Never fails: every problem
    /// is folded into an `ExecutionOutcome`.
    async fn execute(&self, code: &str) -> ExecutionOutcome;

    /// Run `code` and return the text sent back as `output`.
    async fn execute_and_capture(&self, code: &str) -> String {
        classify(&self.execute(code).await)
    }
}
