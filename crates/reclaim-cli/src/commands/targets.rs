//! Targets command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::{Formatter, TargetListing};
use reclaim_domain::{Expansion, SweepTarget};

/// Execute the targets command.
pub fn execute_targets(config: &Config, formatter: &Formatter) -> Result<i32> {
    let listings = list_targets(&config.sweep_targets()?);
    println!("{}", formatter.format_targets(&listings)?);
    Ok(0)
}

/// Describe each target and whether anything is there to sweep.
pub fn list_targets(targets: &[SweepTarget]) -> Vec<TargetListing> {
    targets
        .iter()
        .map(|target| TargetListing {
            category: target.category().to_string(),
            path: target.root_path().display().to_string(),
            profile_suffix: match target.expansion() {
                Expansion::PerSubdirectory(suffix) => Some(suffix.display().to_string()),
                Expansion::None => None,
            },
            exists: root_exists(target),
        })
        .collect()
}

fn root_exists(target: &SweepTarget) -> bool {
    if target.is_pattern() {
        let pattern = target.root_path().to_string_lossy();
        return glob::glob(&pattern)
            .map(|mut paths| paths.any(|entry| entry.is_ok()))
            .unwrap_or(false);
    }
    target.root_path().symlink_metadata().is_ok()
}
