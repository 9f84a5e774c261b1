//! Sweep targets - declarative cleanup locations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// How a target root is expanded before files are enumerated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "suffix", rename_all = "snake_case")]
pub enum Expansion {
    /// Enumerate files recursively under the root itself
    None,

    /// Treat each immediate subdirectory of the root as a profile and sweep
    /// `<profile>/<suffix>` inside it
    ///
    /// Used for multi-profile browser caches such as
    /// `google-chrome/{Default,Profile 1}/Cache`.
    PerSubdirectory(PathBuf),
}

/// Reasons a sweep target is rejected at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Root path was empty
    EmptyRoot,

    /// Category label was empty
    EmptyCategory,

    /// Profile suffix was empty, absolute, or escaped the profile directory
    InvalidSuffix(PathBuf),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::EmptyRoot => write!(f, "sweep target root path is empty"),
            TargetError::EmptyCategory => write!(f, "sweep target category is empty"),
            TargetError::InvalidSuffix(suffix) => write!(
                f,
                "profile suffix '{}' must be a non-empty relative path inside the profile",
                suffix.display()
            ),
        }
    }
}

impl std::error::Error for TargetError {}

/// A declared cleanup location
///
/// Constructed once at configuration time and consumed read-only by the
/// sweep aggregator. A root containing `*`, `?` or `[` is a glob pattern;
/// each match is swept as its own root.
///
/// # Examples
///
/// ```
/// use reclaim_domain::{Expansion, SweepTarget};
///
/// let temp = SweepTarget::new("/tmp/app-cache", "temp").unwrap();
/// assert_eq!(temp.expansion(), &Expansion::None);
///
/// let chrome = SweepTarget::per_profile("/home/me/.cache/google-chrome", "Cache", "chrome").unwrap();
/// assert!(matches!(chrome.expansion(), Expansion::PerSubdirectory(_)));
///
/// assert!(SweepTarget::per_profile("/x", "../escape", "bad").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSweepTarget")]
pub struct SweepTarget {
    root_path: PathBuf,
    expansion: Expansion,
    category: String,
}

/// Unvalidated wire form, checked through [`SweepTarget::from_parts`]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSweepTarget {
    root_path: PathBuf,
    expansion: Expansion,
    category: String,
}

impl TryFrom<RawSweepTarget> for SweepTarget {
    type Error = TargetError;

    fn try_from(raw: RawSweepTarget) -> Result<Self, Self::Error> {
        SweepTarget::from_parts(raw.root_path, raw.expansion, raw.category)
    }
}

impl SweepTarget {
    /// Create a plain recursive target
    pub fn new(root_path: impl Into<PathBuf>, category: impl Into<String>) -> Result<Self, TargetError> {
        Self::from_parts(root_path.into(), Expansion::None, category.into())
    }

    /// Create a profile-expanded target
    pub fn per_profile(
        root_path: impl Into<PathBuf>,
        suffix: impl Into<PathBuf>,
        category: impl Into<String>,
    ) -> Result<Self, TargetError> {
        Self::from_parts(
            root_path.into(),
            Expansion::PerSubdirectory(suffix.into()),
            category.into(),
        )
    }

    /// Validate and assemble a target
    pub fn from_parts(
        root_path: PathBuf,
        expansion: Expansion,
        category: String,
    ) -> Result<Self, TargetError> {
        if root_path.as_os_str().is_empty() {
            return Err(TargetError::EmptyRoot);
        }
        if category.trim().is_empty() {
            return Err(TargetError::EmptyCategory);
        }
        if let Expansion::PerSubdirectory(suffix) = &expansion {
            if !is_contained_relative(suffix) {
                return Err(TargetError::InvalidSuffix(suffix.clone()));
            }
        }

        Ok(Self {
            root_path,
            expansion,
            category,
        })
    }

    /// Root path or glob pattern
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Expansion rule
    pub fn expansion(&self) -> &Expansion {
        &self.expansion
    }

    /// Category label used in reports and errors
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Whether the root is a glob pattern
    pub fn is_pattern(&self) -> bool {
        let root = self.root_path.to_string_lossy();
        root.contains('*') || root.contains('?') || root.contains('[')
    }
}

/// A suffix must stay inside the profile directory it is joined onto
fn is_contained_relative(suffix: &Path) -> bool {
    if suffix.as_os_str().is_empty() {
        return false;
    }
    suffix
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
