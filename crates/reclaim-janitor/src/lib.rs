//! Reclaim Janitor
//!
//! Reclamation engine: sweeps disk targets, terminates idle processes, and
//! reports what it did.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Sweeping**: walking plain, glob and per-profile targets, measuring
//!   and removing files, tolerating per-file failures
//! - **Process reclamation**: snapshotting processes, classifying them with
//!   the Gatekeeper, and terminating candidates one at a time
//! - **Run orchestration**: one run at a time per [`RunLock`], bounded by a
//!   wall-clock timeout that still yields a partial result
//! - **Metrics collection**: cumulative counters across runs
//!
//! # Accounting
//!
//! Sweep byte totals are *potential savings*. A file's size is counted
//! before its removal is attempted, so a file that turns out to be locked
//! still contributes bytes (and an error row). Treat `bytes_freed` as an
//! upper bound on space actually returned.
//!
//! # Usage
//!
//! ## Standalone sweep
//!
//! ```
//! use reclaim_domain::SweepTarget;
//! use reclaim_janitor::Sweeper;
//!
//! let targets = vec![SweepTarget::new(std::env::temp_dir().join("reclaim-doc-absent"), "temp").unwrap()];
//! let summary = Sweeper::new().with_dry_run(true).sweep(&targets);
//! println!("{} files, {} potential bytes", summary.totals.files_removed, summary.totals.bytes_freed);
//! ```
//!
//! ## One run
//!
//! ```no_run
//! use reclaim_domain::traits::ProcessTable;
//! use reclaim_domain::SweepTarget;
//! use reclaim_gatekeeper::PolicyConfig;
//! use reclaim_janitor::{Janitor, JanitorConfig, JanitorError};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example<P>(table: Arc<P>, targets: Vec<SweepTarget>) -> Result<(), JanitorError>
//! # where
//! #     P: ProcessTable + Send + Sync + 'static,
//! # {
//! let janitor = Janitor::new(JanitorConfig::default(), PolicyConfig::default(), table)?;
//!
//! match janitor
//!     .run_reclamation(&PolicyConfig::conservative(), &targets, Duration::from_secs(120))
//!     .await
//! {
//!     Ok(result) => println!("{}", result.status),
//!     Err(JanitorError::RunTimedOut { partial, .. }) => {
//!         println!("aborted after {} targets", partial.targets.len())
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! The Janitor can be configured via TOML:
//!
//! ```toml
//! [janitor]
//! run_timeout_secs = 600
//! termination_delay_ms = 250
//! termination_timeout_ms = 3000
//! dry_run = false
//! terminate_processes = true
//! prune_empty_dirs = true
//! run_interval_minutes = 60
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod janitor;
mod journal;
mod lock;
mod metrics;
mod sweeper;
mod terminator;
mod worker;

pub use config::JanitorConfig;
pub use error::JanitorError;
pub use janitor::Janitor;
pub use lock::{RunGuard, RunLock};
pub use metrics::JanitorMetrics;
pub use sweeper::{SweepSummary, Sweeper, TargetSweep};
pub use terminator::Terminator;
pub use worker::JanitorWorker;
