//! Reclaim Host Layer
//!
//! Implements the ProcessTable trait on top of the operating system's
//! process list via `sysinfo`.
//!
//! # Sampling
//!
//! A snapshot refreshes the process list twice, separated by an observation
//! window. `cpu_seconds` is the CPU time each process accumulated between
//! the two samples, so a process that has been busy for hours but is quiet
//! right now reads as idle.
//!
//! # Windows
//!
//! Portable process tables expose no window handles. A process whose
//! environment carries a display-server connection (`DISPLAY` or
//! `WAYLAND_DISPLAY`) is reported as having a window; this errs on the side
//! of preserving GUI-capable processes.
//!
//! # Examples
//!
//! ```no_run
//! use reclaim_domain::traits::ProcessTable;
//! use reclaim_host::HostProcessTable;
//!
//! let table = HostProcessTable::new();
//! for process in table.snapshot().unwrap() {
//!     println!("{} {} {:.2}s", process.pid, process.name, process.cpu_seconds);
//! }
//! ```

#![warn(missing_docs)]

use reclaim_domain::traits::ProcessTable;
use reclaim_domain::ProcessInfo;
use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System};
use thiserror::Error;

/// Environment variables that mark a display-server client
const DISPLAY_VARS: &[&str] = &["DISPLAY", "WAYLAND_DISPLAY"];

/// Errors that can occur during host operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Process enumeration is not available on this platform
    #[error("Process enumeration is not supported on this platform")]
    Unsupported,

    /// The process is no longer in the process table
    #[error("Process not found: {0}")]
    NotFound(u32),

    /// The termination request was not delivered
    #[error("Termination of pid {pid} rejected: {reason}")]
    Rejected {
        /// Target process
        pid: u32,
        /// What the operating system reported
        reason: String,
    },
}

/// Sampling options for [`HostProcessTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostOptions {
    /// Time between the two samples of a snapshot
    /// Default: 1 second
    pub observation_window: Duration,

    /// Report display-server clients as having a window
    /// Default: true
    pub treat_display_clients_as_windowed: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            observation_window: Duration::from_secs(1),
            treat_display_clients_as_windowed: true,
        }
    }
}

/// Operating-system backed process table
///
/// # Thread Safety
///
/// The underlying `System` sits behind a mutex, so one table can be shared
/// between the snapshot and termination steps of a run.
pub struct HostProcessTable {
    system: Mutex<System>,
    options: HostOptions,
    own_pid: Option<Pid>,
}

impl Default for HostProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProcessTable {
    /// Create a table with default sampling options
    pub fn new() -> Self {
        Self::with_options(HostOptions::default())
    }

    /// Create a table with custom sampling options
    pub fn with_options(options: HostOptions) -> Self {
        Self {
            system: Mutex::new(System::new()),
            options,
            own_pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Sampling options in effect
    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh one pid and return it if it is the same live instance
    fn live_instance<'a>(system: &'a mut System, process: &ProcessInfo) -> Option<&'a Process> {
        let pid = Pid::from_u32(process.pid);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing(),
        );
        system
            .process(pid)
            .filter(|p| p.start_time() == process.start_time && !is_zombie(p.status()))
    }

    fn to_info(&self, process: &Process, cpu_seconds: f64, captured_at: u64) -> ProcessInfo {
        let has_window =
            self.options.treat_display_clients_as_windowed && has_display(process.environ());
        ProcessInfo {
            pid: process.pid().as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            start_time: process.start_time(),
            captured_at,
            cpu_seconds,
            working_set_bytes: process.memory(),
            has_window,
            window_title: None,
            command_line: join_command_line(process.cmd()),
        }
    }
}

impl ProcessTable for HostProcessTable {
    type Error = HostError;

    fn snapshot(&self) -> Result<Vec<ProcessInfo>, HostError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(HostError::Unsupported);
        }

        let mut system = self.system();
        let refresh = ProcessRefreshKind::everything();

        system.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);
        let first: HashMap<Pid, (u64, u64)> = system
            .processes()
            .iter()
            .map(|(pid, p)| (*pid, (p.start_time(), p.accumulated_cpu_time())))
            .collect();

        std::thread::sleep(self.options.observation_window);

        system.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);
        let captured_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut rows: Vec<ProcessInfo> = system
            .processes()
            .values()
            .filter(|p| Some(p.pid()) != self.own_pid)
            .filter(|p| !is_zombie(p.status()))
            .map(|p| {
                let baseline = first.get(&p.pid()).copied();
                let cpu_ms = cpu_delta_ms(baseline, p.start_time(), p.accumulated_cpu_time());
                self.to_info(p, cpu_ms as f64 / 1000.0, captured_at)
            })
            .collect();
        rows.sort_by_key(|row| row.pid);

        tracing::debug!(
            "Captured {} processes over {:?}",
            rows.len(),
            self.options.observation_window
        );
        Ok(rows)
    }

    fn is_alive(&self, process: &ProcessInfo) -> Result<bool, HostError> {
        let mut system = self.system();
        Ok(Self::live_instance(&mut system, process).is_some())
    }

    fn terminate(&self, process: &ProcessInfo) -> Result<(), HostError> {
        let mut system = self.system();
        let live = Self::live_instance(&mut system, process).ok_or(HostError::NotFound(process.pid))?;

        let delivered = match live.kill_with(Signal::Term) {
            Some(delivered) => delivered,
            // No graceful signal on this platform
            None => live.kill(),
        };

        if delivered {
            tracing::debug!("Sent termination request to pid {}", process.pid);
            Ok(())
        } else {
            Err(HostError::Rejected {
                pid: process.pid,
                reason: "operating system refused the request".to_string(),
            })
        }
    }
}

fn is_zombie(status: ProcessStatus) -> bool {
    matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

/// CPU milliseconds between two samples
///
/// A process first seen in the second sample, or whose pid was reused in
/// between, is charged everything it has accumulated.
fn cpu_delta_ms(baseline: Option<(u64, u64)>, start_time: u64, current_ms: u64) -> u64 {
    match baseline {
        Some((started, before)) if started == start_time => current_ms.saturating_sub(before),
        _ => current_ms,
    }
}

fn has_display(environ: &[OsString]) -> bool {
    environ.iter().any(|entry| {
        let entry = entry.to_string_lossy();
        entry
            .split_once('=')
            .map(|(key, value)| DISPLAY_VARS.contains(&key) && !value.is_empty())
            .unwrap_or(false)
    })
}

fn join_command_line(cmd: &[OsString]) -> String {
    cmd.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_has_display() {
        assert!(has_display(&os(&["HOME=/home/u", "DISPLAY=:0"])));
        assert!(has_display(&os(&["WAYLAND_DISPLAY=wayland-0"])));
        assert!(!has_display(&os(&["DISPLAY="])));
        assert!(!has_display(&os(&["XDISPLAY=:0", "PATH=/bin"])));
        assert!(!has_display(&[]));
    }

    #[test]
    fn test_cpu_delta() {
        assert_eq!(cpu_delta_ms(Some((100, 1_000)), 100, 1_250), 250);
        // Pid reused between samples
        assert_eq!(cpu_delta_ms(Some((100, 1_000)), 200, 40), 40);
        // First seen in the second sample
        assert_eq!(cpu_delta_ms(None, 100, 75), 75);
        // Counter never goes backwards
        assert_eq!(cpu_delta_ms(Some((100, 500)), 100, 400), 0);
    }

    #[test]
    fn test_join_command_line() {
        assert_eq!(join_command_line(&os(&["/usr/bin/app", "--flag", "x y"])), "/usr/bin/app --flag x y");
        assert_eq!(join_command_line(&[]), "");
    }

    #[test]
    fn test_default_options() {
        let options = HostOptions::default();
        assert_eq!(options.observation_window, Duration::from_secs(1));
        assert!(options.treat_display_clients_as_windowed);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(HostError::NotFound(42).to_string(), "Process not found: 42");
    }
}
