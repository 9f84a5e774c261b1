//! Per-target and per-process outcomes

use crate::ClassificationVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of sweeping one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "failures", rename_all = "snake_case")]
pub enum TargetStatus {
    /// Every enumerated file was removed
    Success,
    /// Some files or directories failed; the count is the number of errors
    PartialFailure(usize),
    /// Root path (or glob) did not exist; nothing was attempted
    Skipped,
    /// The run was cancelled while this target was being swept; the totals
    /// cover the files handled before that
    Interrupted,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Success => write!(f, "success"),
            TargetStatus::PartialFailure(1) => write!(f, "partial (1 error)"),
            TargetStatus::PartialFailure(n) => write!(f, "partial ({} errors)", n),
            TargetStatus::Skipped => write!(f, "skipped"),
            TargetStatus::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Report for one sweep target, in configuration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    /// Target category label
    pub category: String,

    /// Configured root path or pattern
    pub root_path: PathBuf,

    /// Final status
    pub status: TargetStatus,

    /// Files removed by this target
    pub files_removed: u64,

    /// Potential bytes freed by this target
    pub bytes_freed: u64,
}

/// Result of trying to terminate a Candidate process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// Process exited after the termination request
    Terminated,
    /// Process had already exited (or its pid was recycled) before termination
    AlreadyGone,
    /// Termination was refused by the operating system
    Denied(String),
    /// Request accepted but the process outlived the termination timeout
    StillRunning,
    /// Dry-run mode; nothing was sent
    DryRun,
    /// Run was aborted before this process was reached
    Cancelled,
}

impl TerminationOutcome {
    /// Whether this outcome counts as a run error
    pub fn is_error(&self) -> bool {
        matches!(self, TerminationOutcome::Denied(_) | TerminationOutcome::StillRunning)
    }
}

impl fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationOutcome::Terminated => write!(f, "terminated"),
            TerminationOutcome::AlreadyGone => write!(f, "already gone"),
            TerminationOutcome::Denied(reason) => write!(f, "denied: {}", reason),
            TerminationOutcome::StillRunning => write!(f, "still running"),
            TerminationOutcome::DryRun => write!(f, "dry run"),
            TerminationOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Decision and action for one snapshot row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Process id
    pub pid: u32,

    /// Process name
    pub name: String,

    /// Classifier verdict
    pub verdict: ClassificationVerdict,

    /// Termination result; `None` for preserved processes
    pub termination: Option<TerminationOutcome>,
}

impl ProcessOutcome {
    /// Whether this row is a failure attributable to its pid
    pub fn is_error(&self) -> bool {
        self.termination.as_ref().is_some_and(TerminationOutcome::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecisionRule;

    #[test]
    fn test_display() {
        assert_eq!(TargetStatus::PartialFailure(3).to_string(), "partial (3 errors)");
        assert_eq!(TargetStatus::PartialFailure(1).to_string(), "partial (1 error)");
        assert_eq!(TargetStatus::Interrupted.to_string(), "interrupted");
        assert_eq!(
            TerminationOutcome::Denied("access denied".into()).to_string(),
            "denied: access denied"
        );
        assert_eq!(TerminationOutcome::AlreadyGone.to_string(), "already gone");
    }

    #[test]
    fn test_error_outcomes() {
        assert!(TerminationOutcome::Denied("access denied".into()).is_error());
        assert!(TerminationOutcome::StillRunning.is_error());
        assert!(!TerminationOutcome::AlreadyGone.is_error());
        assert!(!TerminationOutcome::Terminated.is_error());
        assert!(!TerminationOutcome::DryRun.is_error());
    }

    #[test]
    fn test_preserved_row_is_not_error() {
        let row = ProcessOutcome {
            pid: 7,
            name: "shell".into(),
            verdict: ClassificationVerdict::Preserve(DecisionRule::VisibleWindow),
            termination: None,
        };
        assert!(!row.is_error());
    }
}
