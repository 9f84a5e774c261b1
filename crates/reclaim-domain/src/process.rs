//! Process snapshot rows

use serde::{Deserialize, Serialize};

/// One row of a point-in-time process snapshot
///
/// Captured once per run and never re-queried while a decision is being made,
/// so classification cannot race against the process changing underneath it.
/// All time arithmetic uses `captured_at`, the snapshot's own clock reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Operating-system process id
    pub pid: u32,

    /// Executable name
    pub name: String,

    /// Process start time (seconds since Unix epoch)
    pub start_time: u64,

    /// When this row was captured (seconds since Unix epoch)
    pub captured_at: u64,

    /// CPU seconds consumed during the observation window
    pub cpu_seconds: f64,

    /// Resident memory in bytes
    pub working_set_bytes: u64,

    /// Whether the process owns a visible window
    pub has_window: bool,

    /// Title of the main window, if any
    pub window_title: Option<String>,

    /// Full command line, space-joined
    pub command_line: String,
}

impl ProcessInfo {
    /// Seconds between process start and snapshot capture
    ///
    /// A start time later than the capture time (clock skew) yields zero,
    /// which the classifier treats as "recently started".
    pub fn age_seconds(&self) -> u64 {
        self.captured_at.saturating_sub(self.start_time)
    }

    /// Whether `other` describes the same process instance
    ///
    /// Pids are recycled, so identity is pid plus start time.
    pub fn is_same_instance(&self, pid: u32, start_time: u64) -> bool {
        self.pid == pid && self.start_time == start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(start_time: u64, captured_at: u64) -> ProcessInfo {
        ProcessInfo {
            pid: 42,
            name: "worker".to_string(),
            start_time,
            captured_at,
            cpu_seconds: 0.0,
            working_set_bytes: 0,
            has_window: false,
            window_title: None,
            command_line: "worker --idle".to_string(),
        }
    }

    #[test]
    fn test_age_seconds() {
        assert_eq!(row(1_000, 1_120).age_seconds(), 120);
    }

    #[test]
    fn test_age_clamps_on_skew() {
        assert_eq!(row(2_000, 1_000).age_seconds(), 0);
    }

    #[test]
    fn test_same_instance_requires_start_time() {
        let p = row(1_000, 1_120);
        assert!(p.is_same_instance(42, 1_000));
        assert!(!p.is_same_instance(42, 1_001));
        assert!(!p.is_same_instance(43, 1_000));
    }
}
