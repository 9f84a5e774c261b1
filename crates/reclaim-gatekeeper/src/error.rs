//! Gatekeeper error types

use thiserror::Error;

/// Errors raised while building a classifier
///
/// Classification itself never fails; every malformed value is rejected here,
/// at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    /// A numeric threshold is out of range
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// A critical-process pattern is empty or not a valid glob
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },
}
