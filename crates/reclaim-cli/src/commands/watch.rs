//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reclaim_host::HostProcessTable;
use reclaim_janitor::{Janitor, JanitorWorker};
use std::sync::Arc;
use std::time::Duration;

/// Execute the watch command.
///
/// Runs until Ctrl+C, then prints the accumulated metrics.
pub async fn execute_watch(args: WatchArgs, config: Config, formatter: &Formatter) -> Result<i32> {
    let targets = config.sweep_targets()?;
    let interval = watch_interval(&args, &config)?;

    let mut janitor_config = config.janitor;
    if args.dry_run {
        janitor_config.dry_run = true;
    }

    let janitor = Arc::new(Janitor::new(
        janitor_config,
        config.policy,
        Arc::new(HostProcessTable::new()),
    )?);
    let worker = JanitorWorker::new(janitor, targets).with_interval(interval);

    eprintln!(
        "{}",
        formatter.info(&format!("Running every {} minutes; press Ctrl+C to stop", interval.as_secs() / 60))
    );
    worker.run().await?;

    println!("{}", worker.metrics().summary());
    Ok(0)
}

fn watch_interval(args: &WatchArgs, config: &Config) -> Result<Duration> {
    match args.interval {
        Some(0) => Err(CliError::InvalidInput("interval must be at least one minute".into())),
        Some(minutes) => Ok(Duration::from_secs(minutes.saturating_mul(60))),
        None => Ok(config.janitor.run_interval()),
    }
}
