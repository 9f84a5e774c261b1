//! Classification policy

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const MIB: u64 = 1024 * 1024;

/// Thresholds and patterns the classifier evaluates
///
/// # Examples
///
/// ```
/// use reclaim_gatekeeper::PolicyConfig;
///
/// let config = PolicyConfig::default();
/// assert_eq!(config.min_age_seconds, 300);
/// assert!(config.validate().is_ok());
///
/// // Conservative keeps more processes alive
/// let config = PolicyConfig::conservative();
/// assert!(config.min_age_seconds > PolicyConfig::default().min_age_seconds);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Processes younger than this are always preserved
    /// Default: 300 seconds (still initializing)
    #[serde(default = "default_min_age_seconds")]
    pub min_age_seconds: u64,

    /// CPU seconds within the observation window above which a process is
    /// considered active
    /// Default: 0.10
    #[serde(default = "default_cpu_activity_threshold")]
    pub cpu_activity_threshold: f64,

    /// Working-set size below which a windowless process is a candidate
    /// Default: 10 MiB
    #[serde(default = "default_idle_memory_floor_bytes")]
    pub idle_memory_floor_bytes: u64,

    /// Age after which an idle process is a candidate
    /// Default: 60 minutes
    #[serde(default = "default_idle_memory_age_minutes")]
    pub idle_memory_age_minutes: u64,

    /// CPU seconds at or below which usage counts as effectively zero
    /// Default: 0.01
    #[serde(default = "default_idle_cpu_epsilon")]
    pub idle_cpu_epsilon: f64,

    /// Globs matched against process names and command lines
    /// Default: system and desktop-session processes
    #[serde(default = "default_critical_names")]
    pub critical_name_patterns: BTreeSet<String>,

    /// Globs matched against window titles
    /// Default: installer and updater windows
    #[serde(default = "default_critical_titles")]
    pub critical_title_patterns: BTreeSet<String>,
}

fn default_min_age_seconds() -> u64 {
    300
}

fn default_cpu_activity_threshold() -> f64 {
    0.10
}

fn default_idle_memory_floor_bytes() -> u64 {
    10 * MIB
}

fn default_idle_memory_age_minutes() -> u64 {
    60
}

fn default_idle_cpu_epsilon() -> f64 {
    0.01
}

fn default_critical_names() -> BTreeSet<String> {
    to_set(DEFAULT_CRITICAL_NAMES)
}

fn default_critical_titles() -> BTreeSet<String> {
    to_set(DEFAULT_CRITICAL_TITLES)
}

/// System and desktop-session processes that are never terminated
const DEFAULT_CRITICAL_NAMES: &[&str] = &[
    // Linux init, session, and device plumbing
    "init",
    "systemd*",
    "kthreadd",
    "dbus*",
    "sshd",
    "login",
    "agetty",
    "cron*",
    "rsyslogd",
    "polkitd",
    "udisksd",
    "upowerd",
    "NetworkManager",
    "wpa_supplicant",
    "Xorg",
    "Xwayland",
    "gnome-shell",
    "kwin*",
    "plasmashell",
    "pipewire*",
    "wireplumber",
    "pulseaudio",
    "containerd*",
    "dockerd",
    // Windows session and service hosts
    "csrss.exe",
    "dwm.exe",
    "explorer.exe",
    "lsass.exe",
    "services.exe",
    "smss.exe",
    "svchost.exe",
    "wininit.exe",
    "winlogon.exe",
    // Ourselves
    "reclaim*",
];

const DEFAULT_CRITICAL_TITLES: &[&str] = &["*Installer*", "*Setup*", "*Update*"];

impl Default for PolicyConfig {
    /// Balanced policy
    ///
    /// - Minimum age: 5 minutes
    /// - Activity threshold: 0.10 CPU seconds per observation window
    /// - Memory floor: 10 MiB
    /// - Idle age: 60 minutes
    fn default() -> Self {
        Self {
            min_age_seconds: default_min_age_seconds(),
            cpu_activity_threshold: default_cpu_activity_threshold(),
            idle_memory_floor_bytes: default_idle_memory_floor_bytes(),
            idle_memory_age_minutes: default_idle_memory_age_minutes(),
            idle_cpu_epsilon: default_idle_cpu_epsilon(),
            critical_name_patterns: default_critical_names(),
            critical_title_patterns: default_critical_titles(),
        }
    }
}

impl PolicyConfig {
    /// Conservative policy (older, smaller, quieter processes only)
    ///
    /// Suitable for shared workstations where an unexpected kill is costly.
    ///
    /// - Minimum age: 30 minutes
    /// - Activity threshold: 0.02 CPU seconds
    /// - Memory floor: 4 MiB
    /// - Idle age: 4 hours
    pub fn conservative() -> Self {
        Self {
            min_age_seconds: 1800,
            cpu_activity_threshold: 0.02,
            idle_memory_floor_bytes: 4 * MIB,
            idle_memory_age_minutes: 240,
            idle_cpu_epsilon: 0.005,
            ..Self::default()
        }
    }

    /// Aggressive policy (younger, larger processes qualify)
    ///
    /// - Minimum age: 60 seconds
    /// - Activity threshold: 0.25 CPU seconds
    /// - Memory floor: 50 MiB
    /// - Idle age: 15 minutes
    pub fn aggressive() -> Self {
        Self {
            min_age_seconds: 60,
            cpu_activity_threshold: 0.25,
            idle_memory_floor_bytes: 50 * MIB,
            idle_memory_age_minutes: 15,
            idle_cpu_epsilon: 0.02,
            ..Self::default()
        }
    }

    /// Idle age threshold in seconds
    pub fn idle_age_seconds(&self) -> u64 {
        self.idle_memory_age_minutes.saturating_mul(60)
    }

    /// Check thresholds and patterns
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if !self.cpu_activity_threshold.is_finite() || self.cpu_activity_threshold < 0.0 {
            return Err(GatekeeperError::InvalidPolicy(format!(
                "cpu_activity_threshold must be a non-negative number, got {}",
                self.cpu_activity_threshold
            )));
        }

        if !self.idle_cpu_epsilon.is_finite() || self.idle_cpu_epsilon < 0.0 {
            return Err(GatekeeperError::InvalidPolicy(format!(
                "idle_cpu_epsilon must be a non-negative number, got {}",
                self.idle_cpu_epsilon
            )));
        }

        if self.idle_cpu_epsilon > self.cpu_activity_threshold {
            return Err(GatekeeperError::InvalidPolicy(format!(
                "idle_cpu_epsilon ({}) must not exceed cpu_activity_threshold ({})",
                self.idle_cpu_epsilon, self.cpu_activity_threshold
            )));
        }

        for pattern in self
            .critical_name_patterns
            .iter()
            .chain(self.critical_title_patterns.iter())
        {
            check_pattern(pattern)?;
        }

        Ok(())
    }
}

pub(crate) fn check_pattern(pattern: &str) -> Result<glob::Pattern, GatekeeperError> {
    if pattern.trim().is_empty() {
        return Err(GatekeeperError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern is empty".to_string(),
        });
    }

    glob::Pattern::new(pattern).map_err(|e| GatekeeperError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PolicyConfig::default();
        assert_eq!(config.min_age_seconds, 300);
        assert_eq!(config.idle_memory_floor_bytes, 10 * MIB);
        assert_eq!(config.idle_age_seconds(), 3600);
        assert!(config.critical_name_patterns.contains("systemd*"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(PolicyConfig::conservative().validate().is_ok());
        assert!(PolicyConfig::aggressive().validate().is_ok());
        assert!(PolicyConfig::aggressive().min_age_seconds < PolicyConfig::default().min_age_seconds);
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let config = PolicyConfig {
            cpu_activity_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GatekeeperError::InvalidPolicy(_))));

        let config = PolicyConfig {
            idle_cpu_epsilon: 1.0,
            cpu_activity_threshold: 0.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GatekeeperError::InvalidPolicy(_))));
    }

    #[test]
    fn test_rejects_bad_patterns() {
        let mut config = PolicyConfig::default();
        config.critical_name_patterns.insert("[unclosed".to_string());
        assert!(matches!(
            config.validate(),
            Err(GatekeeperError::InvalidPattern { .. })
        ));

        let mut config = PolicyConfig::default();
        config.critical_title_patterns.insert("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_rejects_unknown_fields() {
        let text = r#"
            min_age_seconds = 30
            cpu_activity_threshold = 10.0
            idle_memory_floor_bytes = 10485760
            idle_memory_age_minutes = 60
            surprise = true
        "#;
        assert!(toml::from_str::<PolicyConfig>(text).is_err());
    }

    #[test]
    fn test_toml_defaults_optional_fields() {
        let text = r#"
            min_age_seconds = 30
            cpu_activity_threshold = 10.0
            idle_memory_floor_bytes = 10485760
            idle_memory_age_minutes = 60
        "#;
        let config: PolicyConfig = toml::from_str(text).unwrap();
        assert_eq!(config.idle_cpu_epsilon, 0.01);
        assert!(config.critical_name_patterns.contains("systemd*"));
        assert!(config.critical_title_patterns.contains("*Installer*"));
    }

    #[test]
    fn test_toml_partial_table() {
        let config: PolicyConfig = toml::from_str("min_age_seconds = 30").unwrap();
        assert_eq!(config.min_age_seconds, 30);
        assert_eq!(config.idle_memory_floor_bytes, 10 * MIB);
        assert_eq!(config, PolicyConfig { min_age_seconds: 30, ..Default::default() });
    }

    #[test]
    fn test_toml_explicit_empty_patterns() {
        let text = r#"
            min_age_seconds = 30
            cpu_activity_threshold = 10.0
            idle_memory_floor_bytes = 10485760
            idle_memory_age_minutes = 60
            critical_name_patterns = []
        "#;
        let config: PolicyConfig = toml::from_str(text).unwrap();
        assert!(config.critical_name_patterns.is_empty());
        assert!(!config.critical_title_patterns.is_empty());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = PolicyConfig::aggressive();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: PolicyConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
