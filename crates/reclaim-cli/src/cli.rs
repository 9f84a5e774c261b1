//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use reclaim_gatekeeper::PolicyConfig;
use std::path::PathBuf;

/// Reclaim - Free disk space and memory on a workstation.
#[derive(Debug, Parser)]
#[command(name = "reclaim")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RECLAIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (one summary line)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sweep targets and terminate idle processes (default)
    Run(RunArgs),

    /// Snapshot processes and show verdicts without terminating anything
    Classify(ClassifyArgs),

    /// List configured sweep targets
    Targets,

    /// Run repeatedly on an interval until Ctrl+C
    Watch(WatchArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the run command.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Measure and classify, but never delete or terminate
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run budget in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Skip the process phase
    #[arg(long)]
    pub no_processes: bool,

    /// Use a policy preset instead of the configured policy
    #[arg(short, long, value_enum)]
    pub policy: Option<PolicyPreset>,
}

/// Arguments for the classify command.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Only show termination candidates
    #[arg(long)]
    pub candidates: bool,

    /// CPU observation window in milliseconds
    #[arg(long, default_value = "1000")]
    pub window_ms: u64,

    /// Use a policy preset instead of the configured policy
    #[arg(short, long, value_enum)]
    pub policy: Option<PolicyPreset>,
}

/// Arguments for the watch command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Minutes between runs (overrides the configuration)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Measure and classify, but never delete or terminate
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Arguments for configuration management.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

/// Policy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyPreset {
    /// Balanced thresholds
    Default,
    /// Older, smaller, quieter processes only
    Conservative,
    /// Younger and larger processes qualify
    Aggressive,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PolicyPreset> for PolicyConfig {
    fn from(preset: PolicyPreset) -> Self {
        match preset {
            PolicyPreset::Default => PolicyConfig::default(),
            PolicyPreset::Conservative => PolicyConfig::conservative(),
            PolicyPreset::Aggressive => PolicyConfig::aggressive(),
        }
    }
}
