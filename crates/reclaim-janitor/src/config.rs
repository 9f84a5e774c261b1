//! Configuration for Janitor operations
//!
//! Defines run budgets, termination pacing, and operational modes.

use crate::JanitorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Janitor service
///
/// # Examples
///
/// ```
/// use reclaim_janitor::JanitorConfig;
/// use std::time::Duration;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.run_timeout(), Duration::from_secs(600));
///
/// // Measure and classify without touching anything
/// let config = JanitorConfig::preview();
/// assert!(config.dry_run);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JanitorConfig {
    /// Wall-clock budget for one run (in seconds)
    /// Default: 600 (10 minutes)
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Pause between consecutive process terminations (in milliseconds)
    /// Default: 250
    #[serde(default = "default_termination_delay_ms")]
    pub termination_delay_ms: u64,

    /// How long to wait for a terminated process to exit (in milliseconds)
    /// Default: 3000
    #[serde(default = "default_termination_timeout_ms")]
    pub termination_timeout_ms: u64,

    /// Dry-run mode: measure and classify, never delete or terminate
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Run the process classification and termination phase
    /// Default: true
    #[serde(default = "default_true")]
    pub terminate_processes: bool,

    /// Remove directories left empty by a sweep (never the target root)
    /// Default: true
    #[serde(default = "default_true")]
    pub prune_empty_dirs: bool,

    /// How often the background worker starts a run (in minutes)
    /// Default: 60
    #[serde(default = "default_run_interval_minutes")]
    pub run_interval_minutes: u64,
}

fn default_run_timeout_secs() -> u64 {
    600
}

fn default_termination_delay_ms() -> u64 {
    250
}

fn default_termination_timeout_ms() -> u64 {
    3000
}

fn default_run_interval_minutes() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            run_timeout_secs: default_run_timeout_secs(),
            termination_delay_ms: default_termination_delay_ms(),
            termination_timeout_ms: default_termination_timeout_ms(),
            dry_run: false,
            terminate_processes: true,
            prune_empty_dirs: true,
            run_interval_minutes: default_run_interval_minutes(),
        }
    }
}

impl JanitorConfig {
    /// Dry-run configuration for previewing what a run would do
    pub fn preview() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Check that the budgets are usable
    pub fn validate(&self) -> Result<(), JanitorError> {
        if self.run_timeout_secs == 0 {
            return Err(JanitorError::Config("run_timeout_secs must be greater than zero".into()));
        }
        if self.run_interval_minutes == 0 {
            return Err(JanitorError::Config(
                "run_interval_minutes must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Run budget as Duration
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Inter-termination delay as Duration
    pub fn termination_delay(&self) -> Duration {
        Duration::from_millis(self.termination_delay_ms)
    }

    /// Per-process exit wait as Duration
    pub fn termination_timeout(&self) -> Duration {
        Duration::from_millis(self.termination_timeout_ms)
    }

    /// Worker cadence as Duration
    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_minutes.saturating_mul(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert_eq!(config.run_timeout_secs, 600);
        assert_eq!(config.termination_delay_ms, 250);
        assert_eq!(config.termination_timeout_ms, 3000);
        assert!(!config.dry_run);
        assert!(config.terminate_processes);
        assert!(config.prune_empty_dirs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_conversions() {
        let config = JanitorConfig::default();
        assert_eq!(config.run_timeout(), Duration::from_secs(600));
        assert_eq!(config.termination_delay(), Duration::from_millis(250));
        assert_eq!(config.termination_timeout(), Duration::from_secs(3));
        assert_eq!(config.run_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_run_interval_saturates() {
        let config = JanitorConfig {
            run_interval_minutes: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.run_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_validate_rejects_zero_budgets() {
        let config = JanitorConfig {
            run_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(JanitorError::Config(_))));

        let config = JanitorConfig {
            run_interval_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial_table() {
        let config: JanitorConfig = toml::from_str("dry_run = true\nrun_timeout_secs = 30").unwrap();
        assert!(config.dry_run);
        assert_eq!(config.run_timeout_secs, 30);
        assert_eq!(config.termination_delay_ms, 250);

        assert!(toml::from_str::<JanitorConfig>("unknown_knob = 1").is_err());
    }
}
