//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::exit_code;
use crate::output::Formatter;
use reclaim_domain::traits::ProcessTable;
use reclaim_domain::RunResult;
use reclaim_gatekeeper::PolicyConfig;
use reclaim_host::HostProcessTable;
use reclaim_janitor::{Janitor, JanitorConfig, JanitorError};
use std::sync::Arc;

/// Execute the run command against the live process table.
pub async fn execute_run(args: RunArgs, config: Config, formatter: &Formatter) -> Result<i32> {
    run_with_table(args, config, Arc::new(HostProcessTable::new()), formatter).await
}

/// Execute the run command against `table`.
pub async fn run_with_table<P>(
    args: RunArgs,
    config: Config,
    table: Arc<P>,
    formatter: &Formatter,
) -> Result<i32>
where
    P: ProcessTable + Send + Sync + 'static,
{
    let targets = config.sweep_targets()?;
    let (janitor_config, policy) = effective_settings(&args, config);

    if janitor_config.dry_run {
        tracing::info!("Dry run: nothing will be deleted or terminated");
    }

    let janitor = Janitor::new(janitor_config, policy, table)?;
    report(janitor.run(&targets).await, formatter)
}

/// Apply command-line overrides to the loaded configuration.
pub fn effective_settings(args: &RunArgs, config: Config) -> (JanitorConfig, PolicyConfig) {
    let mut janitor = config.janitor;
    if args.dry_run {
        janitor.dry_run = true;
    }
    if args.no_processes {
        janitor.terminate_processes = false;
    }
    if let Some(secs) = args.timeout {
        janitor.run_timeout_secs = secs;
    }

    let policy = args.policy.map(PolicyConfig::from).unwrap_or(config.policy);
    (janitor, policy)
}

/// Print a run outcome and pick the exit code.
///
/// A timed-out or failed run still prints its partial result.
pub fn report(outcome: std::result::Result<RunResult, JanitorError>, formatter: &Formatter) -> Result<i32> {
    match outcome {
        Ok(result) => {
            println!("{}", formatter.format_run(&result)?);
            Ok(exit_code(result.status))
        }
        Err(JanitorError::RunTimedOut { timeout, partial }) => {
            eprintln!(
                "{}",
                formatter.warning(&format!("Run aborted after {:?}; showing partial results", timeout))
            );
            println!("{}", formatter.format_run(&partial)?);
            Ok(exit_code(partial.status))
        }
        Err(JanitorError::RunFailed { message, partial }) => {
            eprintln!("{}", formatter.error(&format!("Run failed: {}; showing partial results", message)));
            println!("{}", formatter.format_run(&partial)?);
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PolicyPreset;
    use crate::config::{OutputFormat, TargetEntry};
    use crate::error::CliError;
    use reclaim_domain::{ProcessInfo, RunId, RunStatus, SizeAccumulator};
    use std::time::Duration;
    use std::fs;
    use tempfile::TempDir;

    struct EmptyTable;

    impl ProcessTable for EmptyTable {
        type Error = String;

        fn snapshot(&self) -> std::result::Result<Vec<ProcessInfo>, String> {
            Ok(Vec::new())
        }

        fn is_alive(&self, _process: &ProcessInfo) -> std::result::Result<bool, String> {
            Ok(false)
        }

        fn terminate(&self, _process: &ProcessInfo) -> std::result::Result<(), String> {
            Err("not supported".to_string())
        }
    }

    fn config_for(dir: &TempDir) -> Config {
        Config {
            targets: vec![TargetEntry::new(dir.path().to_string_lossy(), "scratch")],
            ..Config::default()
        }
    }

    #[test]
    fn test_effective_settings() {
        let args = RunArgs {
            dry_run: true,
            timeout: Some(5),
            no_processes: true,
            policy: Some(PolicyPreset::Conservative),
        };
        let (janitor, policy) = effective_settings(&args, Config::default());
        assert!(janitor.dry_run);
        assert!(!janitor.terminate_processes);
        assert_eq!(janitor.run_timeout_secs, 5);
        assert_eq!(policy, PolicyConfig::conservative());
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        config.janitor.run_timeout_secs = 77;
        config.policy.min_age_seconds = 12;

        let (janitor, policy) = effective_settings(&RunArgs::default(), config.clone());
        assert_eq!(janitor, config.janitor);
        assert_eq!(policy, config.policy);
    }

    #[tokio::test]
    async fn test_run_sweeps_targets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tmp"), b"12345").unwrap();

        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let code = run_with_table(RunArgs::default(), config_for(&dir), Arc::new(EmptyTable), &formatter)
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert!(!dir.path().join("a.tmp").exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_dry_run_keeps_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tmp"), b"12345").unwrap();

        let args = RunArgs {
            dry_run: true,
            ..RunArgs::default()
        };
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let code = run_with_table(args, config_for(&dir), Arc::new(EmptyTable), &formatter)
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert!(dir.path().join("a.tmp").exists());
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let dir = TempDir::new().unwrap();
        let args = RunArgs {
            timeout: Some(0),
            ..RunArgs::default()
        };
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = run_with_table(args, config_for(&dir), Arc::new(EmptyTable), &formatter).await;

        assert!(matches!(result, Err(CliError::Janitor(JanitorError::Config(_)))));
    }

    fn aborted() -> Box<RunResult> {
        Box::new(RunResult {
            run_id: RunId::new(),
            start_time: 0,
            end_time: 10,
            dry_run: false,
            sweep: SizeAccumulator::new(),
            targets: Vec::new(),
            process_outcomes: Vec::new(),
            process_scan_error: None,
            status: RunStatus::Aborted,
        })
    }

    #[test]
    fn test_report_keeps_partial_results() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let timed_out = JanitorError::RunTimedOut {
            timeout: Duration::from_secs(1),
            partial: aborted(),
        };
        assert_eq!(report(Err(timed_out), &formatter).unwrap(), 3);

        let failed = JanitorError::RunFailed {
            message: "task panicked".into(),
            partial: aborted(),
        };
        assert_eq!(report(Err(failed), &formatter).unwrap(), 1);

        assert!(report(Err(JanitorError::RunAlreadyInProgress), &formatter).is_err());
    }
}
