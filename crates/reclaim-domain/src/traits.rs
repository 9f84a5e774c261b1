//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::ProcessInfo;

/// Trait for enumerating and terminating processes
///
/// Implemented by the infrastructure layer (reclaim-host). Methods take
/// `&self` because one table is shared by the snapshot and termination
/// steps of a run; implementations use interior mutability where the
/// underlying API needs it.
pub trait ProcessTable {
    /// Error type for table operations
    type Error: std::fmt::Display;

    /// Capture a snapshot of running processes
    ///
    /// Rows are returned in a stable order; that order becomes the order of
    /// the run's process outcomes.
    fn snapshot(&self) -> Result<Vec<ProcessInfo>, Self::Error>;

    /// Whether the exact process instance in `process` is still running
    ///
    /// Must compare start time as well as pid, so a recycled pid reads as
    /// not alive.
    fn is_alive(&self, process: &ProcessInfo) -> Result<bool, Self::Error>;

    /// Request termination of `process`
    ///
    /// Returning `Ok` means the request was delivered, not that the process
    /// has exited.
    fn terminate(&self, process: &ProcessInfo) -> Result<(), Self::Error>;
}
