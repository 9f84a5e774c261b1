//! Run Orchestrator
//!
//! One run sweeps every target, then snapshots, classifies and terminates
//! processes. Both phases execute on a blocking thread under a wall-clock
//! budget; whatever finished before the budget ran out is still reported.

use crate::journal::RunJournal;
use crate::{JanitorConfig, JanitorError, JanitorMetrics, RunLock, Sweeper, Terminator};
use reclaim_domain::traits::ProcessTable;
use reclaim_domain::{ProcessOutcome, RunId, RunResult, SweepTarget, TerminationOutcome};
use reclaim_gatekeeper::{Classifier, PolicyConfig};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How long a timed-out run waits for its worker to notice cancellation
const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Current timestamp in milliseconds since Unix epoch
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Resource reclamation service
///
/// Holds the configuration, the policy used by [`Janitor::run`], the process
/// table and the run lock. Only one run proceeds at a time per lock; a
/// second caller gets [`JanitorError::RunAlreadyInProgress`] immediately.
///
/// # Examples
///
/// ```no_run
/// use reclaim_domain::traits::ProcessTable;
/// use reclaim_domain::SweepTarget;
/// use reclaim_gatekeeper::PolicyConfig;
/// use reclaim_janitor::{Janitor, JanitorConfig};
/// use std::sync::Arc;
///
/// # async fn example<P>(table: Arc<P>) -> Result<(), Box<dyn std::error::Error>>
/// # where
/// #     P: ProcessTable + Send + Sync + 'static,
/// # {
/// let janitor = Janitor::new(JanitorConfig::preview(), PolicyConfig::default(), table)?;
///
/// let targets = vec![SweepTarget::new(std::env::temp_dir(), "temp")?];
/// let result = janitor.run(&targets).await?;
/// println!("{}: {} bytes", result.status, result.sweep.bytes_freed);
/// # Ok(())
/// # }
/// ```
pub struct Janitor<P> {
    config: JanitorConfig,
    policy: PolicyConfig,
    table: Arc<P>,
    lock: Arc<RunLock>,
    metrics: Mutex<JanitorMetrics>,
}

impl<P> Janitor<P>
where
    P: ProcessTable + Send + Sync + 'static,
{
    /// Create a Janitor with its own run lock
    ///
    /// Rejects an invalid configuration or policy up front.
    pub fn new(config: JanitorConfig, policy: PolicyConfig, table: Arc<P>) -> Result<Self, JanitorError> {
        config.validate()?;
        policy.validate()?;
        Ok(Self {
            config,
            policy,
            table,
            lock: RunLock::shared(),
            metrics: Mutex::new(JanitorMetrics::new()),
        })
    }

    /// Share a run lock with other janitors
    pub fn with_lock(mut self, lock: Arc<RunLock>) -> Self {
        self.lock = lock;
        self
    }

    /// The run lock this Janitor acquires
    pub fn lock(&self) -> &Arc<RunLock> {
        &self.lock
    }

    /// Get the configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Get the default policy
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Get a copy of the current metrics
    pub fn metrics(&self) -> JanitorMetrics {
        self.metrics_guard().clone()
    }

    /// Reset metrics counters
    pub fn reset_metrics(&self) {
        self.metrics_guard().reset();
    }

    fn metrics_guard(&self) -> MutexGuard<'_, JanitorMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run once with the configured policy and timeout
    pub async fn run(&self, targets: &[SweepTarget]) -> Result<RunResult, JanitorError> {
        self.run_reclamation(&self.policy, targets, self.config.run_timeout())
            .await
    }

    /// Perform one complete reclamation run
    ///
    /// 1. Acquires the run lock (fails fast if held)
    /// 2. Sweeps every target, in parallel, journaling each file as it goes
    /// 3. Snapshots processes, classifies each, and terminates candidates
    ///    sequentially in snapshot order
    ///
    /// Per-item failures end up inside the returned [`RunResult`]. If
    /// `timeout` elapses, outstanding work is cancelled and
    /// [`JanitorError::RunTimedOut`] carries the partial result, including
    /// the files removed from a target that was cut off mid-walk. A panic in
    /// either phase yields [`JanitorError::RunFailed`] with the same kind of
    /// partial result.
    pub async fn run_reclamation(
        &self,
        policy: &PolicyConfig,
        targets: &[SweepTarget],
        timeout: Duration,
    ) -> Result<RunResult, JanitorError> {
        let classifier = Classifier::new(policy.clone())?;
        let _guard = self
            .lock
            .try_acquire()
            .ok_or(JanitorError::RunAlreadyInProgress)?;

        let run_id = RunId::new();
        let start_time = now_millis();
        let dry_run = self.config.dry_run;
        tracing::info!(
            "Starting reclamation run {} ({} targets, timeout {:?}{})",
            run_id,
            targets.len(),
            timeout,
            if dry_run { ", dry run" } else { "" }
        );

        let journal = Arc::new(RunJournal::new(targets));
        let mut work = {
            let journal = Arc::clone(&journal);
            let table = Arc::clone(&self.table);
            let targets = targets.to_vec();
            let sweeper = Sweeper::from_config(&self.config);
            let terminator = Terminator::from_config(&self.config);
            let terminate_processes = self.config.terminate_processes;

            tokio::task::spawn_blocking(move || {
                sweeper.sweep_into(&targets, &journal);
                if terminate_processes && !journal.is_cancelled() {
                    reclaim_processes(table.as_ref(), &classifier, terminator, &journal);
                }
            })
        };

        match tokio::time::timeout(timeout, &mut work).await {
            Ok(Ok(())) => {
                let result = journal.to_result(run_id, start_time, now_millis(), dry_run, false);
                self.finish(&result);
                Ok(result)
            }
            Ok(Err(e)) => {
                journal.cancel();
                let partial = journal.to_result(run_id, start_time, now_millis(), dry_run, true);
                tracing::error!("Reclamation run {} failed: {}", run_id, e);
                self.finish(&partial);
                Err(JanitorError::RunFailed {
                    message: e.to_string(),
                    partial: Box::new(partial),
                })
            }
            Err(_) => {
                journal.cancel();
                // Let the worker finish the file or poll it is on
                if tokio::time::timeout(CANCEL_GRACE, &mut work).await.is_err() {
                    tracing::warn!(
                        "Run {} worker still busy {:?} after cancellation",
                        run_id,
                        CANCEL_GRACE
                    );
                }
                let partial = journal.to_result(run_id, start_time, now_millis(), dry_run, true);
                tracing::warn!("Reclamation run {} timed out after {:?}", run_id, timeout);
                self.finish(&partial);
                Err(JanitorError::RunTimedOut {
                    timeout,
                    partial: Box::new(partial),
                })
            }
        }
    }

    fn finish(&self, result: &RunResult) {
        self.metrics_guard().record_run(result);
        tracing::info!(
            "Reclamation run {} {}: {} files, {} potential bytes, {} of {} candidates terminated, {} errors in {}ms",
            result.run_id,
            result.status,
            result.sweep.files_removed,
            result.sweep.bytes_freed,
            result.terminated_count(),
            result.candidate_count(),
            result.error_count(),
            result.duration_ms()
        );
    }
}

/// Snapshot, classify, and terminate candidates
///
/// Rows are journaled in snapshot order before any termination starts, so
/// an aborted run still lists every classified process.
fn reclaim_processes<P: ProcessTable + ?Sized>(
    table: &P,
    classifier: &Classifier,
    terminator: Terminator,
    journal: &RunJournal,
) {
    let snapshot = match table.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Process snapshot failed: {}", e);
            journal.record_scan_error(e.to_string());
            return;
        }
    };

    let mut candidates = Vec::new();
    let mut candidate_rows = Vec::new();
    let rows: Vec<ProcessOutcome> = snapshot
        .iter()
        .enumerate()
        .map(|(row, process)| {
            let verdict = classifier.classify(process);
            tracing::debug!("{} (pid {}): {}", process.name, process.pid, verdict);
            let termination = if verdict.is_candidate() {
                candidates.push(process.clone());
                candidate_rows.push(row);
                Some(TerminationOutcome::Cancelled)
            } else {
                None
            };
            ProcessOutcome {
                pid: process.pid,
                name: process.name.clone(),
                verdict,
                termination,
            }
        })
        .collect();

    tracing::debug!(
        "Classified {} processes, {} candidates",
        rows.len(),
        candidates.len()
    );
    journal.record_processes(rows);

    terminator.terminate_all(table, &candidates, journal.cancel_flag(), |index, outcome| {
        if let Some(&row) = candidate_rows.get(index) {
            journal.record_termination(row, outcome);
        }
    });
}
