//! Sweep Aggregator
//!
//! Walks every configured [`SweepTarget`], measures each file, then removes
//! it. Byte totals are optimistic: a file's size is counted before removal is
//! attempted, so `bytes_freed` is the *potential* savings of the run. A file
//! that could not be removed still contributes its size and also leaves a
//! [`SweepError`] row behind. Sockets, pipes and device nodes are never
//! touched.

use crate::journal::RunJournal;
use crate::JanitorConfig;
use jwalk::WalkDir;
use rayon::prelude::*;
use reclaim_domain::{
    Expansion, SizeAccumulator, SweepError, SweepTarget, TargetReport, TargetStatus,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of sweeping one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSweep {
    /// Per-target status line
    pub report: TargetReport,
    /// Counters and errors contributed by this target alone
    pub totals: SizeAccumulator,
}

/// Merged outcome of a full sweep
///
/// `reports` follows the order the targets were given in; `totals` is the
/// merge of every target's accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Merged counters across all targets
    pub totals: SizeAccumulator,
    /// One report per target, in configuration order
    pub reports: Vec<TargetReport>,
}

impl FromIterator<TargetSweep> for SweepSummary {
    fn from_iter<I: IntoIterator<Item = TargetSweep>>(iter: I) -> Self {
        let mut summary = SweepSummary::default();
        for sweep in iter {
            summary.totals.absorb(sweep.totals);
            summary.reports.push(sweep.report);
        }
        summary
    }
}

/// Roots a target resolves to before walking
enum Roots {
    /// Nothing on disk matches the target
    Missing,
    Found(Vec<PathBuf>),
}

/// Executes sweep targets
///
/// Targets run in parallel on the rayon pool; the files inside one target
/// are handled sequentially.
///
/// # Examples
///
/// ```
/// use reclaim_domain::{SweepTarget, TargetStatus};
/// use reclaim_janitor::Sweeper;
///
/// let target = SweepTarget::new("/definitely/not/here", "temp").unwrap();
/// let summary = Sweeper::new().with_dry_run(true).sweep(&[target]);
///
/// assert_eq!(summary.reports[0].status, TargetStatus::Skipped);
/// assert!(summary.totals.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweeper {
    dry_run: bool,
    prune_empty_dirs: bool,
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sweeper {
    /// Sweeper that removes files and prunes emptied directories
    pub fn new() -> Self {
        Self {
            dry_run: false,
            prune_empty_dirs: true,
        }
    }

    /// Sweeper matching a janitor configuration
    pub fn from_config(config: &JanitorConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            prune_empty_dirs: config.prune_empty_dirs,
        }
    }

    /// Measure and count without removing anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Remove directories a sweep leaves empty
    pub fn with_prune_empty_dirs(mut self, prune: bool) -> Self {
        self.prune_empty_dirs = prune;
        self
    }

    /// Whether this sweeper only measures
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sweep every target and merge the results
    pub fn sweep(&self, targets: &[SweepTarget]) -> SweepSummary {
        let never = AtomicBool::new(false);
        let sweeps: Vec<TargetSweep> = targets
            .par_iter()
            .map(|target| self.sweep_target(target, &never))
            .collect();
        sweeps.into_iter().collect()
    }

    /// Sweep every target, journaling each file as it is handled
    pub(crate) fn sweep_into(&self, targets: &[SweepTarget], journal: &RunJournal) {
        targets.par_iter().enumerate().for_each(|(index, target)| {
            if journal.is_cancelled() {
                return;
            }
            if let Some(live) = journal.start_target(index) {
                let status = self.sweep_live(target, journal.cancel_flag(), live);
                journal.finish_target(index, status);
            }
        });
    }

    /// Sweep a single target
    ///
    /// Stops issuing removals as soon as `cancel` is set; whatever was
    /// counted up to that point is still returned.
    pub fn sweep_target(&self, target: &SweepTarget, cancel: &AtomicBool) -> TargetSweep {
        let live = Mutex::new(SizeAccumulator::new());
        let status = self.sweep_live(target, cancel, &live);
        let totals = live.into_inner().unwrap_or_else(PoisonError::into_inner);
        TargetSweep {
            report: report(target, status, &totals),
            totals,
        }
    }

    /// Sweep a single target into counters other threads may read mid-sweep
    pub(crate) fn sweep_live(
        &self,
        target: &SweepTarget,
        cancel: &AtomicBool,
        live: &Mutex<SizeAccumulator>,
    ) -> TargetStatus {
        let category = target.category();

        let roots = match self.resolve_roots(target, live) {
            Roots::Missing if tally(live).is_clean() => {
                tracing::debug!(
                    "Skipping target {} ({}): nothing to sweep",
                    category,
                    target.root_path().display()
                );
                return TargetStatus::Skipped;
            }
            Roots::Missing => Vec::new(),
            Roots::Found(roots) => roots,
        };

        let mut completed = true;
        for root in &roots {
            if cancel.load(Ordering::Acquire) || !self.sweep_root(root, category, cancel, live) {
                completed = false;
                break;
            }
        }

        let totals = tally(live);
        if !completed {
            tracing::warn!(
                "Sweep of target {} interrupted after {} files, {} bytes",
                category,
                totals.files_removed,
                totals.bytes_freed
            );
            return TargetStatus::Interrupted;
        }

        if totals.is_clean() {
            tracing::debug!(
                "Swept target {}: {} files, {} bytes",
                category,
                totals.files_removed,
                totals.bytes_freed
            );
            TargetStatus::Success
        } else {
            tracing::warn!(
                "Swept target {} with {} errors: {} files, {} bytes",
                category,
                totals.error_count(),
                totals.files_removed,
                totals.bytes_freed
            );
            TargetStatus::PartialFailure(totals.error_count())
        }
    }

    /// Expand globs and profile directories into concrete roots
    fn resolve_roots(&self, target: &SweepTarget, live: &Mutex<SizeAccumulator>) -> Roots {
        let category = target.category();
        let bases = if target.is_pattern() {
            let pattern = target.root_path().to_string_lossy();
            let paths = match glob::glob(&pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    tally(live).record_error(SweepError::new(
                        category,
                        target.root_path(),
                        format!("invalid pattern: {}", e),
                    ));
                    return Roots::Missing;
                }
            };

            let mut matches = Vec::new();
            for entry in paths {
                match entry {
                    Ok(path) => matches.push(path),
                    Err(e) => tally(live).record_error(SweepError::new(
                        category,
                        e.path(),
                        format!("cannot read pattern match: {}", e.error()),
                    )),
                }
            }
            matches
        } else if exists(target.root_path()) {
            vec![target.root_path().to_path_buf()]
        } else {
            Vec::new()
        };

        if bases.is_empty() {
            return Roots::Missing;
        }

        match target.expansion() {
            Expansion::None => Roots::Found(bases),
            Expansion::PerSubdirectory(suffix) => {
                let mut roots = Vec::new();
                for base in &bases {
                    for profile in profiles(base, category, live) {
                        let nested = profile.join(suffix);
                        if exists(&nested) {
                            roots.push(nested);
                        }
                    }
                }
                Roots::Found(roots)
            }
        }
    }

    /// Remove every file below one resolved root
    ///
    /// Returns `false` when `cancel` cut the walk short.
    fn sweep_root(
        &self,
        root: &Path,
        category: &str,
        cancel: &AtomicBool,
        live: &Mutex<SizeAccumulator>,
    ) -> bool {
        if !fs::metadata(root).map(|m| m.is_dir()).unwrap_or(false) {
            self.remove_file(root, category, live);
            return true;
        }

        let mut emptied = Vec::new();
        for entry in WalkDir::new(root)
            .parallelism(jwalk::Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
        {
            if cancel.load(Ordering::Acquire) {
                tracing::debug!("Sweep of {} cancelled", root.display());
                return false;
            }

            match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        if entry.depth > 0 {
                            emptied.push((entry.depth, entry.path()));
                        }
                    } else {
                        self.remove_file(&entry.path(), category, live);
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    tracing::warn!("Cannot read {}: {}", path.display(), e);
                    tally(live).record_error(SweepError::new(
                        category,
                        path,
                        format!("cannot enumerate: {}", e),
                    ));
                }
            }
        }

        if self.prune_empty_dirs && !self.dry_run {
            // Deepest first so parents empty out before they are tried
            emptied.sort_by(|a, b| b.0.cmp(&a.0));
            for (_, dir) in emptied {
                prune(&dir);
            }
        }
        true
    }

    /// Measure one file (or link), then remove it
    fn remove_file(&self, path: &Path, category: &str, live: &Mutex<SizeAccumulator>) {
        let size = match fs::symlink_metadata(path) {
            Ok(meta) if is_special(&meta.file_type()) => {
                tracing::debug!("Leaving special file {} in place", path.display());
                return;
            }
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                tally(live).record_error(SweepError::new(
                    category,
                    path,
                    format!("cannot read metadata: {}", e),
                ));
                return;
            }
        };

        if self.dry_run {
            tally(live).record_removed(size);
            return;
        }

        let removed = fs::remove_file(path);
        let mut totals = tally(live);
        totals.record_measured(size);
        match removed {
            Ok(()) => totals.record_removal(),
            // Removed underneath us; it is gone either way
            Err(e) if e.kind() == io::ErrorKind::NotFound => totals.record_removal(),
            Err(e) => {
                tracing::debug!("Cannot remove {}: {}", path.display(), e);
                totals.record_error(SweepError::new(
                    category,
                    path,
                    format!("cannot remove: {}", e),
                ));
            }
        }
    }
}

/// A poisoned accumulator still holds valid counts; keep adding to them.
fn tally(live: &Mutex<SizeAccumulator>) -> MutexGuard<'_, SizeAccumulator> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Sockets, pipes and device nodes belong to running programs
#[cfg(unix)]
fn is_special(file_type: &fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;

    file_type.is_socket()
        || file_type.is_fifo()
        || file_type.is_block_device()
        || file_type.is_char_device()
}

#[cfg(not(unix))]
fn is_special(_file_type: &fs::FileType) -> bool {
    false
}

/// Remove a directory the sweep emptied
///
/// A directory that still holds something is left alone.
fn prune(dir: &Path) {
    match fs::remove_dir(dir) {
        Ok(()) => {}
        Err(e) if matches!(e.kind(), io::ErrorKind::DirectoryNotEmpty | io::ErrorKind::NotFound) => {}
        Err(e) => tracing::debug!("Cannot prune {}: {}", dir.display(), e),
    }
}

/// Immediate subdirectories of `base`, sorted by name
fn profiles(base: &Path, category: &str, live: &Mutex<SizeAccumulator>) -> Vec<PathBuf> {
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) => {
            tally(live).record_error(SweepError::new(
                category,
                base,
                format!("cannot list profiles: {}", e),
            ));
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs
}

fn report(target: &SweepTarget, status: TargetStatus, totals: &SizeAccumulator) -> TargetReport {
    TargetReport {
        category: target.category().to_string(),
        root_path: target.root_path().to_path_buf(),
        status,
        files_removed: totals.files_removed,
        bytes_freed: totals.bytes_freed,
    }
}
