//! Background worker for periodic reclamation runs

use crate::{Janitor, JanitorError, JanitorMetrics};
use reclaim_domain::traits::ProcessTable;
use reclaim_domain::SweepTarget;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Longest accepted cadence; the timer cannot schedule much further out
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Background worker that runs the Janitor on a schedule
///
/// The first run starts immediately; later runs follow the configured
/// interval. A run that overlaps one started elsewhere on the same lock is
/// skipped, not queued.
///
/// # Examples
///
/// ```no_run
/// use reclaim_domain::traits::ProcessTable;
/// use reclaim_janitor::{Janitor, JanitorWorker};
/// use std::sync::Arc;
///
/// # async fn example<P>(janitor: Arc<Janitor<P>>) -> Result<(), Box<dyn std::error::Error>>
/// # where
/// #     P: ProcessTable + Send + Sync + 'static,
/// # {
/// let worker = JanitorWorker::new(janitor, Vec::new());
///
/// // Run until Ctrl+C
/// worker.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct JanitorWorker<P> {
    janitor: Arc<Janitor<P>>,
    targets: Vec<SweepTarget>,
    interval: Duration,
}

impl<P> JanitorWorker<P>
where
    P: ProcessTable + Send + Sync + 'static,
{
    /// Create a worker using the Janitor's configured interval
    pub fn new(janitor: Arc<Janitor<P>>, targets: Vec<SweepTarget>) -> Self {
        let interval = janitor.config().run_interval().min(MAX_INTERVAL);
        Self {
            janitor,
            targets,
            interval,
        }
    }

    /// Override the run cadence (capped at one year)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.min(MAX_INTERVAL);
        self
    }

    /// The Janitor this worker drives
    pub fn janitor(&self) -> &Arc<Janitor<P>> {
        &self.janitor
    }

    /// Current metrics of the underlying Janitor
    pub fn metrics(&self) -> JanitorMetrics {
        self.janitor.metrics()
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    pub async fn run(&self) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Reclamation worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting reclamation cycle");
                    self.cycle().await;
                }
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        return Err(JanitorError::Worker(format!("cannot listen for shutdown signal: {}", e)));
                    }
                    tracing::info!("Shutdown signal received, stopping reclamation worker");
                    break;
                }
            }
        }

        tracing::info!("Reclamation worker stopped. Final metrics:\n{}", self.metrics().summary());
        Ok(())
    }

    /// Run for a specific number of cycles
    pub async fn run_cycles(&self, cycles: usize) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Reclamation worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting reclamation cycle {}/{}", cycle + 1, cycles);
            self.cycle().await;
        }

        tracing::info!("Reclamation worker finished {} cycles", cycles);
        Ok(())
    }

    /// One run; every failure is logged and the worker carries on
    async fn cycle(&self) {
        match self.janitor.run(&self.targets).await {
            Ok(result) => {
                tracing::info!(
                    "Reclamation cycle {}: {} files, {} potential bytes, {} processes terminated",
                    result.status,
                    result.sweep.files_removed,
                    result.sweep.bytes_freed,
                    result.terminated_count()
                );
            }
            Err(JanitorError::RunAlreadyInProgress) => {
                tracing::info!("Skipping reclamation cycle: a run is already in progress");
            }
            Err(e) => {
                tracing::error!("Reclamation cycle failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JanitorConfig;
    use reclaim_domain::ProcessInfo;
    use reclaim_gatekeeper::PolicyConfig;
    use std::fs;
    use tempfile::TempDir;

    struct EmptyTable;

    impl ProcessTable for EmptyTable {
        type Error = String;

        fn snapshot(&self) -> Result<Vec<ProcessInfo>, String> {
            Ok(Vec::new())
        }

        fn is_alive(&self, _process: &ProcessInfo) -> Result<bool, String> {
            Ok(false)
        }

        fn terminate(&self, _process: &ProcessInfo) -> Result<(), String> {
            Ok(())
        }
    }

    fn janitor() -> Arc<Janitor<EmptyTable>> {
        Arc::new(Janitor::new(JanitorConfig::default(), PolicyConfig::default(), Arc::new(EmptyTable)).unwrap())
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let worker = JanitorWorker::new(janitor(), Vec::new());
        assert_eq!(worker.interval, Duration::from_secs(3600));
        assert_eq!(worker.metrics().runs, 0);
    }

    #[tokio::test]
    async fn test_huge_interval_is_capped() {
        let config = JanitorConfig {
            run_interval_minutes: u64::MAX,
            ..Default::default()
        };
        let janitor = Arc::new(Janitor::new(config, PolicyConfig::default(), Arc::new(EmptyTable)).unwrap());

        let worker = JanitorWorker::new(janitor, Vec::new());
        assert_eq!(worker.interval, MAX_INTERVAL);
        assert_eq!(worker.with_interval(Duration::MAX).interval, MAX_INTERVAL);
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stale.tmp"), b"12345").unwrap();
        let targets = vec![SweepTarget::new(dir.path(), "temp").unwrap()];

        let worker = JanitorWorker::new(janitor(), targets).with_interval(Duration::from_millis(5));
        worker.run_cycles(2).await.unwrap();

        let metrics = worker.metrics();
        assert_eq!(metrics.runs, 2);
        assert_eq!(metrics.files_removed, 1);
        assert_eq!(metrics.bytes_freed, 5);
    }

    #[tokio::test]
    async fn test_skips_cycle_when_lock_held() {
        let janitor = janitor();
        let _held = janitor.lock().try_acquire().unwrap();

        let worker = JanitorWorker::new(Arc::clone(&janitor), Vec::new()).with_interval(Duration::from_millis(5));
        worker.run_cycles(1).await.unwrap();

        assert_eq!(worker.metrics().runs, 0);
    }
}
