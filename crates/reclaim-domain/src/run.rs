//! Run results - the output contract of a reclamation run

use crate::{ProcessOutcome, SizeAccumulator, TargetReport, TerminationOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a run, based on UUIDv7
///
/// UUIDv7 ids sort by creation time, so run logs order naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Generate a new time-ordered run id
    ///
    /// # Examples
    ///
    /// ```
    /// use reclaim_domain::RunId;
    ///
    /// let a = RunId::new();
    /// let b = RunId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Both phases finished without a single recorded failure
    Completed,
    /// Both phases finished; at least one path or pid failed
    CompletedWithErrors,
    /// The run timed out; the result holds whatever finished first
    Aborted,
}

impl RunStatus {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured summary of one run
///
/// Immutable once returned. Contains no presentation formatting; external
/// collaborators render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Run identifier
    pub run_id: RunId,

    /// Run start (milliseconds since Unix epoch)
    pub start_time: u64,

    /// Run end (milliseconds since Unix epoch)
    pub end_time: u64,

    /// Whether the run only measured and classified
    pub dry_run: bool,

    /// Merged sweep totals and per-file errors
    pub sweep: SizeAccumulator,

    /// Per-target reports in configuration order
    pub targets: Vec<TargetReport>,

    /// Per-process decisions in snapshot order
    pub process_outcomes: Vec<ProcessOutcome>,

    /// Set when the process snapshot itself could not be taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_scan_error: Option<String>,

    /// Terminal state
    pub status: RunStatus,
}

impl RunResult {
    /// Status for a run that finished both phases
    ///
    /// `Completed` only when neither the sweep nor the process phase recorded
    /// a failure.
    pub fn completion_status(
        sweep: &SizeAccumulator,
        process_outcomes: &[ProcessOutcome],
        process_scan_error: Option<&str>,
    ) -> RunStatus {
        let process_failed =
            process_scan_error.is_some() || process_outcomes.iter().any(ProcessOutcome::is_error);
        if sweep.is_clean() && !process_failed {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        }
    }

    /// Wall-clock duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Processes actually terminated
    pub fn terminated_count(&self) -> usize {
        self.process_outcomes
            .iter()
            .filter(|o| o.termination == Some(TerminationOutcome::Terminated))
            .count()
    }

    /// Processes classified as candidates
    pub fn candidate_count(&self) -> usize {
        self.process_outcomes
            .iter()
            .filter(|o| o.verdict.is_candidate())
            .count()
    }

    /// Failures attributable to a pid
    pub fn process_error_count(&self) -> usize {
        self.process_outcomes.iter().filter(|o| o.is_error()).count()
    }

    /// All failures: sweep paths, pids, and a failed snapshot
    pub fn error_count(&self) -> usize {
        self.sweep.error_count()
            + self.process_error_count()
            + usize::from(self.process_scan_error.is_some())
    }

    /// Whether nothing at all was recorded
    pub fn is_empty(&self) -> bool {
        self.sweep.is_empty()
            && self.targets.is_empty()
            && self.process_outcomes.is_empty()
            && self.process_scan_error.is_none()
    }
}
