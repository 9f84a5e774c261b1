//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use reclaim_domain::SweepTarget;
use reclaim_gatekeeper::PolicyConfig;
use reclaim_janitor::JanitorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Process classification policy
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Run budgets and modes
    #[serde(default)]
    pub janitor: JanitorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,

    /// Locations to sweep
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetEntry>,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// One `[[targets]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
    /// Directory, file or glob; a leading `~` means the home directory
    pub path: String,

    /// Label used in reports
    pub category: String,

    /// Sweep `<profile>/<suffix>` inside every subdirectory of `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_suffix: Option<String>,
}

impl TargetEntry {
    /// Plain target entry.
    pub fn new(path: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category: category.into(),
            profile_suffix: None,
        }
    }

    /// Per-profile target entry.
    pub fn per_profile(
        path: impl Into<String>,
        suffix: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            profile_suffix: Some(suffix.into()),
            ..Self::new(path, category)
        }
    }

    /// Build the sweep target, expanding `~` against `home`.
    pub fn resolve(&self, home: Option<&Path>) -> Result<SweepTarget> {
        let root = expand_home(&self.path, home)?;
        let target = match &self.profile_suffix {
            Some(suffix) => SweepTarget::per_profile(root, suffix, &self.category),
            None => SweepTarget::new(root, &self.category),
        };
        target.map_err(|e| CliError::Config(format!("target '{}': {}", self.path, e)))
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".reclaim").join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check policy, budgets and targets.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        self.janitor.validate()?;
        self.sweep_targets().map(|_| ())
    }

    /// Resolve every configured target.
    pub fn sweep_targets(&self) -> Result<Vec<SweepTarget>> {
        let home = dirs::home_dir();
        self.targets
            .iter()
            .map(|entry| entry.resolve(home.as_deref()))
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            janitor: JanitorConfig::default(),
            output: OutputSettings::default(),
            targets: default_targets(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn expand_home(path: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(path)),
    };

    let home = home.ok_or_else(|| CliError::Config(format!("Cannot expand '{}': no home directory", path)))?;
    let rest = rest.trim_start_matches(['/', '\\']);
    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}

/// Workstation locations swept when no targets are configured.
pub fn default_targets() -> Vec<TargetEntry> {
    let mut targets = vec![TargetEntry::new(
        std::env::temp_dir().to_string_lossy().into_owned(),
        "temp",
    )];

    if cfg!(windows) {
        targets.extend([
            TargetEntry::new(
                "~/AppData/Local/Microsoft/Windows/Explorer/thumbcache_*.db",
                "thumbnails",
            ),
            TargetEntry::per_profile("~/AppData/Local/Google/Chrome/User Data", "Cache", "chrome"),
            TargetEntry::per_profile("~/AppData/Local/Chromium/User Data", "Cache", "chromium"),
            TargetEntry::per_profile("~/AppData/Local/Microsoft/Edge/User Data", "Cache", "edge"),
            TargetEntry::per_profile("~/AppData/Local/Mozilla/Firefox/Profiles", "cache2", "firefox"),
        ]);
    } else if cfg!(target_os = "macos") {
        targets.extend([
            TargetEntry::per_profile("~/Library/Caches/Google/Chrome", "Cache", "chrome"),
            TargetEntry::per_profile("~/Library/Caches/Chromium", "Cache", "chromium"),
            TargetEntry::per_profile("~/Library/Caches/Microsoft Edge", "Cache", "edge"),
            TargetEntry::per_profile("~/Library/Caches/Firefox/Profiles", "cache2", "firefox"),
        ]);
    } else {
        targets.extend([
            TargetEntry::new("~/.cache/thumbnails", "thumbnails"),
            TargetEntry::per_profile("~/.cache/google-chrome", "Cache", "chrome"),
            TargetEntry::per_profile("~/.cache/chromium", "Cache", "chromium"),
            TargetEntry::per_profile("~/.cache/microsoft-edge", "Cache", "edge"),
            TargetEntry::per_profile("~/.cache/mozilla/firefox", "cache2", "firefox"),
        ]);
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_domain::Expansion;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.output.color);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.targets[0].category, "temp");
        assert!(config.targets.iter().any(|t| t.profile_suffix.as_deref() == Some("cache2")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/alex");
        assert_eq!(expand_home("~", Some(home)).unwrap(), PathBuf::from("/home/alex"));
        assert_eq!(
            expand_home("~/.cache/x", Some(home)).unwrap(),
            PathBuf::from("/home/alex/.cache/x")
        );
        assert_eq!(expand_home("/tmp/~x", Some(home)).unwrap(), PathBuf::from("/tmp/~x"));
        assert_eq!(expand_home("~other/x", Some(home)).unwrap(), PathBuf::from("~other/x"));
        assert!(expand_home("~/x", None).is_err());
    }

    #[test]
    fn test_resolve_targets() {
        let home = Path::new("/home/alex");
        let target = TargetEntry::per_profile("~/.cache/chromium", "Cache", "chromium")
            .resolve(Some(home))
            .unwrap();
        assert_eq!(target.root_path(), Path::new("/home/alex/.cache/chromium"));
        assert_eq!(target.expansion(), &Expansion::PerSubdirectory(PathBuf::from("Cache")));

        let bad = TargetEntry::per_profile("/x", "../escape", "bad");
        assert!(matches!(bad.resolve(Some(home)), Err(CliError::Config(_))));
    }

    #[test]
    fn test_partial_file() {
        let text = r#"
            [policy]
            min_age_seconds = 30

            [janitor]
            dry_run = true

            [[targets]]
            path = "/var/tmp/app"
            category = "app"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.policy.min_age_seconds, 30);
        assert!(config.janitor.dry_run);
        assert!(config.output.color);
        assert_eq!(config.targets, vec![TargetEntry::new("/var/tmp/app", "app")]);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("[surprise]\nx = 1").is_err());
        assert!(toml::from_str::<Config>("[[targets]]\npath = \"/x\"\ncategory = \"x\"\nfollow = true").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.janitor.run_timeout_secs = 42;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[janitor]\nrun_timeout_secs = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CliError::Janitor(_))));
    }
}
