//! Classification verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// The rule that decided a verdict
///
/// Listed in evaluation order. Every verdict names one of these, so there is
/// no anonymous "default preserve".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// Process owns a visible window (absolute veto)
    VisibleWindow,
    /// Process is younger than the minimum age
    RecentlyStarted,
    /// Name, command line, or title matches a critical pattern
    CriticalProcess,
    /// CPU use within the observation window exceeds the activity threshold
    ActiveCpu,
    /// Small working set and no window
    LowMemoryNoWindow,
    /// Large working set but no CPU activity
    IdleLargeFootprint,
    /// Old enough and no CPU activity
    LongLivedIdle,
    /// No rule produced enough evidence
    InsufficientEvidence,
}

impl DecisionRule {
    /// Stable machine-readable rule name
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionRule::VisibleWindow => "visible_window",
            DecisionRule::RecentlyStarted => "recently_started",
            DecisionRule::CriticalProcess => "critical_process",
            DecisionRule::ActiveCpu => "active_cpu",
            DecisionRule::LowMemoryNoWindow => "low_memory_no_window",
            DecisionRule::IdleLargeFootprint => "idle_large_footprint",
            DecisionRule::LongLivedIdle => "long_lived_idle",
            DecisionRule::InsufficientEvidence => "insufficient_evidence",
        }
    }

    /// Human-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            DecisionRule::VisibleWindow => "visible window",
            DecisionRule::RecentlyStarted => "recently started",
            DecisionRule::CriticalProcess => "critical subsystem process",
            DecisionRule::ActiveCpu => "active CPU usage",
            DecisionRule::LowMemoryNoWindow => "low memory, no window",
            DecisionRule::IdleLargeFootprint => "idle despite large footprint",
            DecisionRule::LongLivedIdle => "long-lived idle process",
            DecisionRule::InsufficientEvidence => "insufficient evidence to classify as safe",
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of classifying one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "rule", rename_all = "snake_case")]
pub enum ClassificationVerdict {
    /// Keep the process running
    Preserve(DecisionRule),
    /// Process is judged safe to terminate
    Candidate(DecisionRule),
}

impl ClassificationVerdict {
    /// The deciding rule
    pub fn rule(&self) -> DecisionRule {
        match self {
            ClassificationVerdict::Preserve(rule) | ClassificationVerdict::Candidate(rule) => *rule,
        }
    }

    /// Human-readable reason
    pub fn reason(&self) -> &'static str {
        self.rule().reason()
    }

    /// Whether the verdict allows termination
    pub fn is_candidate(&self) -> bool {
        matches!(self, ClassificationVerdict::Candidate(_))
    }
}

impl fmt::Display for ClassificationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationVerdict::Preserve(rule) => write!(f, "preserve ({})", rule),
            ClassificationVerdict::Candidate(rule) => write!(f, "candidate ({})", rule),
        }
    }
}
