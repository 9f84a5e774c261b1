//! Error types for Janitor operations

use reclaim_domain::RunResult;
use reclaim_gatekeeper::GatekeeperError;
use std::time::Duration;
use thiserror::Error;

/// Invocation-level failures
///
/// Per-file and per-process failures never appear here; they are recorded
/// inside the [`RunResult`].
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Another run holds the run lock; retry later
    #[error("A reclamation run is already in progress")]
    RunAlreadyInProgress,

    /// The run exceeded its wall-clock budget
    ///
    /// `partial` carries everything that finished before the deadline, with
    /// status `Aborted`.
    #[error("Reclamation run timed out after {timeout:?}")]
    RunTimedOut {
        /// The budget that was exceeded
        timeout: Duration,
        /// Results accumulated before the deadline
        partial: Box<RunResult>,
    },

    /// A run phase panicked
    ///
    /// `partial` carries everything recorded before the failure, with status
    /// `Aborted`.
    #[error("Reclamation run failed: {message}")]
    RunFailed {
        /// What went wrong in the worker
        message: String,
        /// Results accumulated before the failure
        partial: Box<RunResult>,
    },

    /// Policy rejected at construction
    #[error("Policy error: {0}")]
    Policy(#[from] GatekeeperError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error outside a run (signal handling, runtime failures)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JanitorError {
    /// The partial result of a timed-out or failed run
    pub fn partial_result(&self) -> Option<&RunResult> {
        match self {
            JanitorError::RunTimedOut { partial, .. } | JanitorError::RunFailed { partial, .. } => {
                Some(partial)
            }
            _ => None,
        }
    }
}
