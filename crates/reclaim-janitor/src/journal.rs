//! Per-run journal
//!
//! Both run phases write into the journal as they go, file by file and
//! process by process, so a run that hits its deadline can still report
//! everything done before it.

use reclaim_domain::{
    ProcessOutcome, RunId, RunResult, RunStatus, SizeAccumulator, SweepTarget, TargetReport,
    TargetStatus, TerminationOutcome,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Pending,
    Running,
    Finished(TargetStatus),
}

/// Live counters for one configured target
struct TargetSlot {
    category: String,
    root_path: PathBuf,
    state: Mutex<SlotState>,
    totals: Mutex<SizeAccumulator>,
}

pub(crate) struct RunJournal {
    cancelled: AtomicBool,
    /// One slot per configured target, updated file by file
    targets: Vec<TargetSlot>,
    processes: Mutex<Vec<ProcessOutcome>>,
    scan_error: Mutex<Option<String>>,
}

/// A poisoned journal still holds valid rows; keep reading them.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RunJournal {
    pub(crate) fn new(targets: &[SweepTarget]) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            targets: targets
                .iter()
                .map(|target| TargetSlot {
                    category: target.category().to_string(),
                    root_path: target.root_path().to_path_buf(),
                    state: Mutex::new(SlotState::Pending),
                    totals: Mutex::new(SizeAccumulator::new()),
                })
                .collect(),
            processes: Mutex::new(Vec::new()),
            scan_error: Mutex::new(None),
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn cancel_flag(&self) -> &AtomicBool {
        &self.cancelled
    }

    /// Mark a target as started and hand out its live counters
    pub(crate) fn start_target(&self, index: usize) -> Option<&Mutex<SizeAccumulator>> {
        let slot = self.targets.get(index)?;
        *lock(&slot.state) = SlotState::Running;
        Some(&slot.totals)
    }

    pub(crate) fn finish_target(&self, index: usize, status: TargetStatus) {
        if let Some(slot) = self.targets.get(index) {
            *lock(&slot.state) = SlotState::Finished(status);
        }
    }

    /// Seed the process rows in snapshot order
    ///
    /// Candidates start as `Cancelled` and are overwritten as the terminator
    /// reaches them.
    pub(crate) fn record_processes(&self, rows: Vec<ProcessOutcome>) {
        *lock(&self.processes) = rows;
    }

    pub(crate) fn record_termination(&self, row: usize, outcome: TerminationOutcome) {
        if let Some(entry) = lock(&self.processes).get_mut(row) {
            entry.termination = Some(outcome);
        }
    }

    pub(crate) fn record_scan_error(&self, message: String) {
        *lock(&self.scan_error) = Some(message);
    }

    /// Assemble the run result from whatever has been recorded
    ///
    /// Targets that never started are left out and a target still running
    /// is reported as interrupted with the files it got through. The rest
    /// keep configuration order.
    pub(crate) fn to_result(
        &self,
        run_id: RunId,
        start_time: u64,
        end_time: u64,
        dry_run: bool,
        aborted: bool,
    ) -> RunResult {
        let mut sweep = SizeAccumulator::new();
        let mut targets = Vec::new();
        for slot in &self.targets {
            let status = match *lock(&slot.state) {
                SlotState::Pending => continue,
                SlotState::Running => TargetStatus::Interrupted,
                SlotState::Finished(status) => status,
            };
            let totals = lock(&slot.totals).clone();
            targets.push(TargetReport {
                category: slot.category.clone(),
                root_path: slot.root_path.clone(),
                status,
                files_removed: totals.files_removed,
                bytes_freed: totals.bytes_freed,
            });
            sweep.absorb(totals);
        }
        let process_outcomes = lock(&self.processes).clone();
        let process_scan_error = lock(&self.scan_error).clone();

        let status = if aborted {
            RunStatus::Aborted
        } else {
            RunResult::completion_status(&sweep, &process_outcomes, process_scan_error.as_deref())
        };

        RunResult {
            run_id,
            start_time,
            end_time,
            dry_run,
            sweep,
            targets,
            process_outcomes,
            process_scan_error,
            status,
        }
    }
}
