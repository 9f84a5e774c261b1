//! Metrics collection across reclamation runs

use reclaim_domain::{RunResult, RunStatus};

/// Cumulative counters over every run a Janitor has finished
///
/// `bytes_freed` inherits the optimistic accounting of the sweep: it is the
/// potential savings measured, not a guarantee of space returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JanitorMetrics {
    /// Runs finished, including aborted ones
    pub runs: usize,

    /// Runs that hit their timeout
    pub aborted_runs: usize,

    /// Runs that finished with per-item errors
    pub runs_with_errors: usize,

    /// Files removed (or counted, in dry-run)
    pub files_removed: u64,

    /// Potential bytes reclaimed
    pub bytes_freed: u64,

    /// Processes confirmed terminated
    pub processes_terminated: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one run into the totals
    pub fn record_run(&mut self, result: &RunResult) {
        self.runs += 1;
        match result.status {
            RunStatus::Aborted => self.aborted_runs += 1,
            RunStatus::CompletedWithErrors => self.runs_with_errors += 1,
            RunStatus::Completed => {}
        }
        self.files_removed = self.files_removed.saturating_add(result.sweep.files_removed);
        self.bytes_freed = self.bytes_freed.saturating_add(result.sweep.bytes_freed);
        self.processes_terminated += result.terminated_count();
        self.total_runtime_ms = self.total_runtime_ms.saturating_add(result.duration_ms());
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Janitor Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Runs: {} ({} aborted, {} with errors)", self.runs, self.aborted_runs, self.runs_with_errors),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            format!("Files removed: {}", self.files_removed),
            format!("Potential bytes reclaimed: {}", self.bytes_freed),
            format!("Processes terminated: {}", self.processes_terminated),
        ]
        .join("\n")
    }
}
