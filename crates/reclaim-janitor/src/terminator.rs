//! Terminator - ends candidate processes one at a time

use crate::JanitorConfig;
use reclaim_domain::traits::ProcessTable;
use reclaim_domain::{ProcessInfo, TerminationOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sequential process terminator
///
/// Blocking: callers on an async runtime run it on a blocking thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminator {
    delay: Duration,
    timeout: Duration,
    poll_interval: Duration,
    dry_run: bool,
}

impl Terminator {
    /// Create a terminator
    ///
    /// `delay` separates consecutive terminations; `timeout` bounds the wait
    /// for one process to exit.
    pub fn new(delay: Duration, timeout: Duration) -> Self {
        Self {
            delay,
            timeout,
            poll_interval: POLL_INTERVAL,
            dry_run: false,
        }
    }

    /// Terminator matching a janitor configuration
    pub fn from_config(config: &JanitorConfig) -> Self {
        Self::new(config.termination_delay(), config.termination_timeout()).with_dry_run(config.dry_run)
    }

    /// Report `DryRun` instead of terminating
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Override how often an exiting process is re-checked
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Terminate one process and wait for it to exit
    ///
    /// Never fails: every problem becomes a [`TerminationOutcome`].
    pub fn terminate<P: ProcessTable + ?Sized>(
        &self,
        table: &P,
        process: &ProcessInfo,
    ) -> TerminationOutcome {
        self.terminate_until(table, process, &AtomicBool::new(false))
    }

    /// Like [`Terminator::terminate`], but stops waiting for the exit once
    /// `cancel` is set and reports the process as still running.
    fn terminate_until<P: ProcessTable + ?Sized>(
        &self,
        table: &P,
        process: &ProcessInfo,
        cancel: &AtomicBool,
    ) -> TerminationOutcome {
        if self.dry_run {
            return TerminationOutcome::DryRun;
        }

        match table.is_alive(process) {
            Ok(true) => {}
            Ok(false) => return TerminationOutcome::AlreadyGone,
            Err(e) => return TerminationOutcome::Denied(format!("liveness check failed: {}", e)),
        }

        if let Err(e) = table.terminate(process) {
            // Exiting on its own between the check and the signal is not a denial
            return match table.is_alive(process) {
                Ok(false) => TerminationOutcome::AlreadyGone,
                _ => TerminationOutcome::Denied(e.to_string()),
            };
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match table.is_alive(process) {
                Ok(false) => return TerminationOutcome::Terminated,
                Ok(true) => {}
                Err(e) => {
                    tracing::debug!("Liveness re-check for pid {} failed: {}", process.pid, e);
                }
            }
            if Instant::now() >= deadline || cancel.load(Ordering::Acquire) {
                return TerminationOutcome::StillRunning;
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Sleep for `duration` in poll-sized steps; `false` if cancelled
    fn pause(&self, duration: Duration, cancel: &AtomicBool) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if cancel.load(Ordering::Acquire) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    /// Terminate candidates in order
    ///
    /// `record` receives each candidate's index and outcome as soon as it is
    /// known. Once `cancel` is set the process being waited on is reported as
    /// still running and no further candidate is signalled; callers treat
    /// unreported candidates as cancelled.
    pub fn terminate_all<P, F>(
        &self,
        table: &P,
        candidates: &[ProcessInfo],
        cancel: &AtomicBool,
        mut record: F,
    ) where
        P: ProcessTable + ?Sized,
        F: FnMut(usize, TerminationOutcome),
    {
        for (index, process) in candidates.iter().enumerate() {
            if cancel.load(Ordering::Acquire) {
                tracing::debug!("Termination cancelled before pid {}", process.pid);
                return;
            }

            if index > 0 && !self.dry_run && !self.delay.is_zero() && !self.pause(self.delay, cancel) {
                tracing::debug!("Termination cancelled before pid {}", process.pid);
                return;
            }

            let outcome = self.terminate_until(table, process, cancel);
            match &outcome {
                TerminationOutcome::Terminated => {
                    tracing::info!("Terminated {} (pid {})", process.name, process.pid);
                }
                TerminationOutcome::Denied(reason) => {
                    tracing::warn!("Cannot terminate {} (pid {}): {}", process.name, process.pid, reason);
                }
                TerminationOutcome::StillRunning => {
                    tracing::warn!(
                        "{} (pid {}) still running after {:?}",
                        process.name,
                        process.pid,
                        self.timeout
                    );
                }
                other => {
                    tracing::debug!("{} (pid {}): {}", process.name, process.pid, other);
                }
            }
            record(index, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Clone, Copy)]
    enum Behaviour {
        /// Exits on the first signal
        Obeys,
        Ignores,
        Refuses,
        Gone,
    }

    struct FakeTable {
        behaviour: HashMap<u32, Behaviour>,
        signalled: RefCell<Vec<u32>>,
    }

    impl FakeTable {
        fn new(entries: &[(u32, Behaviour)]) -> Self {
            Self {
                behaviour: entries.iter().copied().collect(),
                signalled: RefCell::new(Vec::new()),
            }
        }
    }

    impl ProcessTable for FakeTable {
        type Error = String;

        fn snapshot(&self) -> Result<Vec<ProcessInfo>, String> {
            Ok(Vec::new())
        }

        fn is_alive(&self, process: &ProcessInfo) -> Result<bool, String> {
            let signalled = self.signalled.borrow().contains(&process.pid);
            Ok(match self.behaviour[&process.pid] {
                Behaviour::Gone => false,
                Behaviour::Obeys => !signalled,
                Behaviour::Ignores | Behaviour::Refuses => true,
            })
        }

        fn terminate(&self, process: &ProcessInfo) -> Result<(), String> {
            match self.behaviour[&process.pid] {
                Behaviour::Refuses => Err("operation not permitted".to_string()),
                _ => {
                    self.signalled.borrow_mut().push(process.pid);
                    Ok(())
                }
            }
        }
    }

    fn process(pid: u32) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: format!("proc{}", pid),
            start_time: 1_000,
            captured_at: 10_000,
            cpu_seconds: 0.0,
            working_set_bytes: 1024,
            has_window: false,
            window_title: None,
            command_line: String::new(),
        }
    }

    fn fast() -> Terminator {
        Terminator::new(Duration::ZERO, Duration::from_millis(20)).with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_outcomes() {
        let table = FakeTable::new(&[
            (1, Behaviour::Obeys),
            (2, Behaviour::Ignores),
            (3, Behaviour::Refuses),
            (4, Behaviour::Gone),
        ]);
        let terminator = fast();

        assert_eq!(terminator.terminate(&table, &process(1)), TerminationOutcome::Terminated);
        assert_eq!(terminator.terminate(&table, &process(2)), TerminationOutcome::StillRunning);
        assert_eq!(
            terminator.terminate(&table, &process(3)),
            TerminationOutcome::Denied("operation not permitted".to_string())
        );
        assert_eq!(terminator.terminate(&table, &process(4)), TerminationOutcome::AlreadyGone);
    }

    #[test]
    fn test_dry_run_never_signals() {
        let table = FakeTable::new(&[(1, Behaviour::Obeys)]);
        let outcome = fast().with_dry_run(true).terminate(&table, &process(1));

        assert_eq!(outcome, TerminationOutcome::DryRun);
        assert!(table.signalled.borrow().is_empty());
    }

    #[test]
    fn test_terminate_all_in_order() {
        let table = FakeTable::new(&[(7, Behaviour::Obeys), (3, Behaviour::Gone), (5, Behaviour::Obeys)]);
        let candidates = vec![process(7), process(3), process(5)];
        let mut seen = Vec::new();

        fast().terminate_all(&table, &candidates, &AtomicBool::new(false), |i, outcome| {
            seen.push((i, outcome))
        });

        assert_eq!(
            seen,
            vec![
                (0, TerminationOutcome::Terminated),
                (1, TerminationOutcome::AlreadyGone),
                (2, TerminationOutcome::Terminated),
            ]
        );
        assert_eq!(*table.signalled.borrow(), vec![7, 5]);
    }

    #[test]
    fn test_cancel_stops_before_next() {
        let table = FakeTable::new(&[(1, Behaviour::Obeys)]);
        let mut seen = 0;
        fast().terminate_all(&table, &[process(1)], &AtomicBool::new(true), |_, _| seen += 1);
        assert_eq!(seen, 0);
        assert!(table.signalled.borrow().is_empty());
    }

    #[test]
    fn test_cancel_cuts_exit_wait_short() {
        let table = FakeTable::new(&[(2, Behaviour::Ignores)]);
        let terminator = Terminator::new(Duration::ZERO, Duration::from_secs(30))
            .with_poll_interval(Duration::from_millis(1));

        let started = Instant::now();
        let outcome = terminator.terminate_until(&table, &process(2), &AtomicBool::new(true));

        assert_eq!(outcome, TerminationOutcome::StillRunning);
        assert_eq!(*table.signalled.borrow(), vec![2]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancel_interrupts_delay() {
        let terminator = Terminator::new(Duration::from_secs(30), Duration::ZERO)
            .with_poll_interval(Duration::from_millis(1));
        assert!(!terminator.pause(Duration::from_secs(30), &AtomicBool::new(true)));
        assert!(terminator.pause(Duration::from_millis(2), &AtomicBool::new(false)));
    }
}
