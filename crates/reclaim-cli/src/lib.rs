//! Reclaim CLI library.
//!
//! This library provides the core functionality for the `reclaim` command-line
//! interface: configuration loading, command execution, and output formatting.
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Run completed without errors |
//! | 1 | Invocation failed (bad configuration, run already in progress) |
//! | 2 | Run completed, but some paths or processes failed |
//! | 3 | Run aborted by its timeout; partial results were printed |

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;

use reclaim_domain::RunStatus;
use tracing_subscriber::EnvFilter;

/// Process exit code for a finished run.
pub fn exit_code(status: RunStatus) -> i32 {
    match status {
        RunStatus::Completed => 0,
        RunStatus::CompletedWithErrors => 2,
        RunStatus::Aborted => 3,
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks warn, info or debug.
pub fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second install (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
