//! Reclaim Domain Layer
//!
//! This crate contains the shared vocabulary of the reclamation engine. It
//! defines the value objects every other layer passes around and the trait
//! seam through which the engine reaches the operating system.
//!
//! ## Key Concepts
//!
//! - **Sweep Target**: a declared cleanup location (plain root, glob, or
//!   per-profile expansion)
//! - **Size Accumulator**: files removed, potential bytes freed, and per-file
//!   errors, with order-independent merge semantics
//! - **Process Info**: an immutable snapshot row for one running process
//! - **Verdict**: the classifier's Preserve/Candidate decision, always tagged
//!   with the rule that decided it
//! - **Run Result**: the single serializable output contract of a run
//!
//! ## Architecture
//!
//! - No filesystem or process access happens here
//! - Infrastructure implementations live in other crates
//! - [`traits::ProcessTable`] is implemented by `reclaim-host` and by test doubles

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod outcome;
pub mod process;
pub mod run;
pub mod target;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use accumulator::{SizeAccumulator, SweepError};
pub use outcome::{ProcessOutcome, TargetReport, TargetStatus, TerminationOutcome};
pub use process::ProcessInfo;
pub use run::{RunId, RunResult, RunStatus};
pub use target::{Expansion, SweepTarget, TargetError};
pub use verdict::{ClassificationVerdict, DecisionRule};
