//! Reclaim Gatekeeper
//!
//! Decides which running processes are safe to terminate.
//!
//! The Gatekeeper provides:
//! - A validated [`PolicyConfig`] with presets
//! - An ordered, first-match-wins rule table
//! - A pure [`Classifier`]: same snapshot row and policy, same verdict
//!
//! # Rule order
//!
//! | # | Rule | Verdict |
//! |---|------|---------|
//! | 1 | Visible window | Preserve |
//! | 2 | Younger than `min_age_seconds` | Preserve |
//! | 3 | Critical name/command line/title pattern | Preserve |
//! | 4 | CPU above `cpu_activity_threshold` | Preserve |
//! | 5 | Working set below `idle_memory_floor_bytes`, no window | Candidate |
//! | 6 | Working set at or above the floor, CPU effectively zero | Candidate |
//! | 7 | Older than `idle_memory_age_minutes`, CPU effectively zero | Candidate |
//! | 8 | Anything else | Preserve |
//!
//! # Examples
//!
//! ```
//! use reclaim_domain::{ClassificationVerdict, DecisionRule, ProcessInfo};
//! use reclaim_gatekeeper::{Classifier, PolicyConfig};
//!
//! let classifier = Classifier::new(PolicyConfig::default()).unwrap();
//! let process = ProcessInfo {
//!     pid: 4242,
//!     name: "editor".to_string(),
//!     start_time: 0,
//!     captured_at: 10_000,
//!     cpu_seconds: 0.0,
//!     working_set_bytes: 1024,
//!     has_window: true,
//!     window_title: Some("notes.txt".to_string()),
//!     command_line: "editor notes.txt".to_string(),
//! };
//!
//! assert_eq!(
//!     classifier.classify(&process),
//!     ClassificationVerdict::Preserve(DecisionRule::VisibleWindow)
//! );
//! ```

#![warn(missing_docs)]

mod classifier;
mod config;
mod error;

pub use classifier::{rule_order, Classifier};
pub use config::PolicyConfig;
pub use error::GatekeeperError;
