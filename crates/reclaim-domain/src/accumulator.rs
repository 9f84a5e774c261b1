//! Size accumulator - running totals for a sweep

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single per-file failure recorded during a sweep
///
/// Every failure is attributable to a specific path and the category of the
/// target that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepError {
    /// Category label of the target being swept
    pub target_category: String,

    /// Path that could not be enumerated or removed
    pub path: PathBuf,

    /// Human-readable failure message
    pub message: String,
}

impl SweepError {
    /// Create a new sweep error
    pub fn new(
        target_category: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target_category: target_category.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Running totals for files removed, bytes freed, and errors
///
/// `bytes_freed` follows an optimistic accounting policy: a file's size is
/// added when it is measured, before removal is attempted. A file that then
/// fails to delete still contributes its size, so the figure is **potential
/// savings**, not a guarantee of reclaimed space. `files_removed` only counts
/// successful removals.
///
/// # Examples
///
/// ```
/// use reclaim_domain::SizeAccumulator;
///
/// let mut a = SizeAccumulator::new();
/// a.record_removed(1024);
///
/// let mut b = SizeAccumulator::new();
/// b.record_removed(2048);
///
/// let merged = a.merge(b);
/// assert_eq!(merged.files_removed, 2);
/// assert_eq!(merged.bytes_freed, 3072);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeAccumulator {
    /// Files successfully removed (or that would be, in dry-run mode)
    pub files_removed: u64,

    /// Bytes measured for removal (potential savings)
    pub bytes_freed: u64,

    /// Failures in the order they were recorded
    pub errors: Vec<SweepError>,
}

impl SizeAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a file's size toward the total
    ///
    /// Called before removal is attempted.
    pub fn record_measured(&mut self, bytes: u64) {
        self.bytes_freed = self.bytes_freed.saturating_add(bytes);
    }

    /// Count a successful removal
    pub fn record_removal(&mut self) {
        self.files_removed = self.files_removed.saturating_add(1);
    }

    /// Measure and count a removal in one step
    pub fn record_removed(&mut self, bytes: u64) {
        self.record_measured(bytes);
        self.record_removal();
    }

    /// Append a failure
    pub fn record_error(&mut self, error: SweepError) {
        self.errors.push(error);
    }

    /// Number of recorded failures
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether no failures were recorded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether nothing at all was recorded
    pub fn is_empty(&self) -> bool {
        self.files_removed == 0 && self.bytes_freed == 0 && self.errors.is_empty()
    }

    /// Merge two accumulators
    ///
    /// Numeric fields add (associative and commutative); error sequences are
    /// concatenated, `self`'s errors first.
    pub fn merge(mut self, other: SizeAccumulator) -> SizeAccumulator {
        self.absorb(other);
        self
    }

    /// In-place form of [`SizeAccumulator::merge`]
    pub fn absorb(&mut self, other: SizeAccumulator) {
        self.files_removed = self.files_removed.saturating_add(other.files_removed);
        self.bytes_freed = self.bytes_freed.saturating_add(other.bytes_freed);
        self.errors.extend(other.errors);
    }
}

impl FromIterator<SizeAccumulator> for SizeAccumulator {
    fn from_iter<I: IntoIterator<Item = SizeAccumulator>>(iter: I) -> Self {
        iter.into_iter().fold(SizeAccumulator::new(), SizeAccumulator::merge)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn accumulator() -> impl Strategy<Value = SizeAccumulator> {
        (
            0u64..10_000,
            0u64..(1 << 40),
            prop::collection::vec("[a-z]{1,8}", 0..4),
        )
            .prop_map(|(files_removed, bytes_freed, messages)| SizeAccumulator {
                files_removed,
                bytes_freed,
                errors: messages
                    .into_iter()
                    .map(|m| SweepError::new("cat", format!("/p/{}", m), m))
                    .collect(),
            })
    }

    fn totals(acc: &SizeAccumulator) -> (u64, u64, usize) {
        (acc.files_removed, acc.bytes_freed, acc.errors.len())
    }

    proptest! {
        /// Property: merge is commutative over the numeric fields
        #[test]
        fn test_merge_commutative(a in accumulator(), b in accumulator()) {
            let ab = a.clone().merge(b.clone());
            let ba = b.merge(a);
            prop_assert_eq!(totals(&ab), totals(&ba));
        }

        /// Property: merge is associative, including error order
        #[test]
        fn test_merge_associative(a in accumulator(), b in accumulator(), c in accumulator()) {
            let left = a.clone().merge(b.clone()).merge(c.clone());
            let right = a.merge(b.merge(c));
            prop_assert_eq!(left, right);
        }

        /// Property: the empty accumulator is an identity for merge
        #[test]
        fn test_merge_identity(a in accumulator()) {
            prop_assert_eq!(a.clone().merge(SizeAccumulator::new()), a.clone());
            prop_assert_eq!(SizeAccumulator::new().merge(a.clone()), a);
        }

        /// Property: bytes_freed never decreases as files are measured
        #[test]
        fn test_bytes_monotonic(sizes in prop::collection::vec(0u64..(1 << 32), 0..32)) {
            let mut acc = SizeAccumulator::new();
            let mut last = 0;
            for size in sizes {
                acc.record_measured(size);
                prop_assert!(acc.bytes_freed >= last);
                last = acc.bytes_freed;
            }
        }
    }
}
