//! Classify command implementation.

use crate::cli::ClassifyArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Formatter, VerdictRow};
use reclaim_domain::traits::ProcessTable;
use reclaim_gatekeeper::{Classifier, PolicyConfig};
use reclaim_host::{HostOptions, HostProcessTable};
use std::time::Duration;

/// Execute the classify command.
///
/// Read-only: takes one snapshot and prints a verdict per process.
pub async fn execute_classify(args: ClassifyArgs, config: &Config, formatter: &Formatter) -> Result<i32> {
    let policy = args.policy.map(PolicyConfig::from).unwrap_or_else(|| config.policy.clone());
    let classifier = Classifier::new(policy)?;

    let table = HostProcessTable::with_options(HostOptions {
        observation_window: Duration::from_millis(args.window_ms),
        ..HostOptions::default()
    });

    // Sampling sleeps for the observation window
    let snapshot = tokio::task::spawn_blocking(move || table.snapshot())
        .await
        .map_err(|e| CliError::InvalidInput(format!("process snapshot task failed: {}", e)))??;

    let rows = classify_rows(&classifier, snapshot, args.candidates);
    println!("{}", formatter.format_verdicts(&rows)?);
    Ok(0)
}

/// Pair each snapshot row with its verdict, keeping snapshot order.
pub fn classify_rows(
    classifier: &Classifier,
    snapshot: Vec<reclaim_domain::ProcessInfo>,
    candidates_only: bool,
) -> Vec<VerdictRow> {
    snapshot
        .into_iter()
        .map(|process| {
            let verdict = classifier.classify(&process);
            VerdictRow { process, verdict }
        })
        .filter(|row| !candidates_only || row.verdict.is_candidate())
        .collect()
}
