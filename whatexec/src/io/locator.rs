//! Filesystem-wide executable search.
//!
//! A scan is split into work units: the files directly inside each root,
//! plus one recursive walk per immediate subdirectory. Units are ordered by
//! [`LocationPrioritizer`] score and run in parallel on the rayon pool; their
//! results are merged after every unit reports, so arrival order never
//! influences the outcome.
//!
//! Every unit carries the best score reachable inside it, so a directory
//! that merely contains a well-known location is ranked by that location.
//! Single-match scans share a "best `(score, unit)` so far" bound. A unit
//! whose best reachable key is already beaten stops launching or abandons
//! its walk; every other unit keeps going, so the winner is always the first
//! entry of the all-instances ordering.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};
use walkdir::{DirEntry, WalkDir};

use crate::core::priority::LocationPrioritizer;
use crate::core::query::CommandQuery;
use crate::core::types::{ResolvedExecutable, SearchDepth};
use crate::error::ResolveError;
use crate::io::detector::{ExecutableDetector, verify_executable};
use crate::io::volumes::{DriveHandle, VolumeSource};

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How far and how wide a scan may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub depth: SearchDepth,
    /// Upper bound on directory levels below a root; guards against deep or
    /// cyclic trees.
    pub max_depth: usize,
    /// Stay on the root's volume instead of crossing into other mounts.
    pub stay_on_volume: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            depth: SearchDepth::Recursive,
            max_depth: DEFAULT_MAX_DEPTH,
            stay_on_volume: true,
        }
    }
}

impl ScanOptions {
    pub fn with_depth(self, depth: SearchDepth) -> Self {
        Self { depth, ..self }
    }
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Named(&'a OsStr),
    AnyExecutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    First,
    All,
}

#[derive(Debug, Clone)]
struct WorkUnit {
    root: PathBuf,
    /// Root-files units list one level only; subdirectory units recurse.
    max_depth: usize,
    /// Lowest score any match inside this unit can have.
    score: u32,
    is_subdirectory: bool,
}

#[derive(Debug)]
struct Match {
    resolved: ResolvedExecutable,
    score: u32,
    unit: usize,
    seq: usize,
}

enum UnitOutcome {
    Matches(Vec<Match>),
    Cancelled,
}

/// Locates executables by walking directories, drives or every ready volume.
pub struct FileSystemLocator {
    detector: Arc<dyn ExecutableDetector>,
    prioritizer: Arc<LocationPrioritizer>,
    volumes: Arc<dyn VolumeSource>,
    options: ScanOptions,
}

impl FileSystemLocator {
    pub fn new(
        detector: Arc<dyn ExecutableDetector>,
        prioritizer: Arc<LocationPrioritizer>,
        volumes: Arc<dyn VolumeSource>,
        options: ScanOptions,
    ) -> Self {
        Self {
            detector,
            prioritizer,
            volumes,
            options,
        }
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Copy of this locator with different scan options.
    pub fn with_options(&self, options: ScanOptions) -> Self {
        Self {
            detector: Arc::clone(&self.detector),
            prioritizer: Arc::clone(&self.prioritizer),
            volumes: Arc::clone(&self.volumes),
            options,
        }
    }

    // Single match.

    pub fn locate_in_directory(
        &self,
        directory: &Path,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        self.first_match(&[directory.to_path_buf()], name, cancel)
    }

    pub fn locate_in_drive(
        &self,
        drive: &DriveHandle,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        self.first_match(&[drive.mount_point().to_path_buf()], name, cancel)
    }

    /// Search every ready volume and stop at the best-ranked match.
    pub fn locate(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        let roots = self.volume_roots();
        self.first_match(&roots, name, cancel)
    }

    // All instances.

    pub fn locate_instances_in_directory(
        &self,
        directory: &Path,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        self.all_matches(&[directory.to_path_buf()], name, cancel)
    }

    pub fn locate_instances_in_drive(
        &self,
        drive: &DriveHandle,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        self.all_matches(&[drive.mount_point().to_path_buf()], name, cancel)
    }

    pub fn locate_instances(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        let roots = self.volume_roots();
        self.all_matches(&roots, name, cancel)
    }

    // Multi-locate: every executable, no name filter.

    pub fn locate_all_in_directory(
        &self,
        directory: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        self.scan(&[directory.to_path_buf()], Target::AnyExecutable, Mode::All, cancel)
    }

    pub fn locate_all_in_drive(
        &self,
        drive: &DriveHandle,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        self.scan(
            &[drive.mount_point().to_path_buf()],
            Target::AnyExecutable,
            Mode::All,
            cancel,
        )
    }

    pub fn locate_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        let roots = self.volume_roots();
        self.scan(&roots, Target::AnyExecutable, Mode::All, cancel)
    }

    fn volume_roots(&self) -> Vec<PathBuf> {
        self.volumes
            .ready_volumes()
            .into_iter()
            .map(|drive| drive.mount_point().to_path_buf())
            .collect()
    }

    fn first_match(
        &self,
        roots: &[PathBuf],
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        let query = CommandQuery::parse(name)?;
        if query.is_path_like() {
            return Ok(verify_executable(&*self.detector, query.as_path()));
        }
        let found = self.scan(roots, Target::Named(OsStr::new(name)), Mode::First, cancel)?;
        Ok(found.into_iter().next())
    }

    fn all_matches(
        &self,
        roots: &[PathBuf],
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        let query = CommandQuery::parse(name)?;
        if query.is_path_like() {
            return Ok(verify_executable(&*self.detector, query.as_path())
                .into_iter()
                .collect());
        }
        self.scan(roots, Target::Named(OsStr::new(name)), Mode::All, cancel)
    }

    #[instrument(skip_all, fields(roots = roots.len(), mode = ?mode))]
    fn scan(
        &self,
        roots: &[PathBuf],
        target: Target<'_>,
        mode: Mode,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let units = self.plan_units(roots);
        debug!(units = units.len(), "planned scan");
        self.run_units(&units, target, mode, cancel)
    }

    fn run_units(
        &self,
        units: &[WorkUnit],
        target: Target<'_>,
        mode: Mode,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        let best = AtomicU64::new(u64::MAX);
        let outcomes: Vec<UnitOutcome> = units
            .par_iter()
            .enumerate()
            .map(|(index, unit)| self.scan_unit(index, unit, target, mode, &best, cancel))
            .collect();

        let mut matches = Vec::new();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Matches(found) => matches.extend(found),
                UnitOutcome::Cancelled => return Err(ResolveError::Cancelled),
            }
        }

        matches.sort_by_key(|m| (m.score, m.unit, m.seq));
        if mode == Mode::First {
            matches.truncate(1);
        }
        let mut seen = HashSet::new();
        Ok(matches
            .into_iter()
            .filter(|m| seen.insert(m.resolved.path().to_path_buf()))
            .map(|m| m.resolved)
            .collect())
    }

    /// Split `roots` into ranked work units.
    fn plan_units(&self, roots: &[PathBuf]) -> Vec<WorkUnit> {
        let mut units = Vec::new();
        for root in roots {
            let Ok(root_meta) = fs::metadata(root) else {
                debug!(root = %root.display(), "scan root unavailable, skipping");
                continue;
            };
            units.push(WorkUnit {
                root: root.clone(),
                max_depth: 1,
                score: self.prioritizer.score(root),
                is_subdirectory: false,
            });

            if self.options.depth == SearchDepth::TopLevelOnly || self.options.max_depth < 2 {
                continue;
            }
            let entries = match fs::read_dir(root) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(root = %root.display(), err = %err, "cannot list scan root");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                if !file_type.is_dir() {
                    continue;
                }
                if self.options.stay_on_volume
                    && !entry
                        .metadata()
                        .is_ok_and(|meta| same_volume(&root_meta, &meta))
                {
                    trace!(dir = %entry.path().display(), "different volume, skipping");
                    continue;
                }
                let path = entry.path();
                units.push(WorkUnit {
                    score: self.prioritizer.best_score_within(&path),
                    root: path,
                    max_depth: self.options.max_depth - 1,
                    is_subdirectory: true,
                });
            }
        }
        units.sort_by(|a, b| {
            (a.score, a.is_subdirectory, &a.root).cmp(&(b.score, b.is_subdirectory, &b.root))
        });
        units
    }

    fn scan_unit(
        &self,
        index: usize,
        unit: &WorkUnit,
        target: Target<'_>,
        mode: Mode,
        best: &AtomicU64,
        cancel: &CancellationToken,
    ) -> UnitOutcome {
        let floor = rank_key(unit.score, index);
        let beaten = || mode == Mode::First && best.load(Ordering::Acquire) < floor;
        if cancel.is_cancelled() {
            return UnitOutcome::Cancelled;
        }
        if beaten() {
            return UnitOutcome::Matches(Vec::new());
        }

        let prioritizer = Arc::clone(&self.prioritizer);
        let walker = WalkDir::new(&unit.root)
            .min_depth(1)
            .max_depth(unit.max_depth)
            .follow_links(false)
            .same_file_system(self.options.stay_on_volume)
            .sort_by(move |a, b| sibling_order(&prioritizer, a, b));

        let platform = self.detector.platform();
        let mut found = Vec::new();
        for (seq, entry) in walker.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return UnitOutcome::Cancelled;
            }
            if beaten() {
                trace!(root = %unit.root.display(), "better-ranked match elsewhere, abandoning");
                return UnitOutcome::Matches(Vec::new());
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    trace!(err = %err, "unreadable entry skipped");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if let Target::Named(name) = target {
                if !platform.names_equal(entry.file_name(), name) {
                    continue;
                }
            }
            let Some(resolved) = verify_executable(&*self.detector, entry.path()) else {
                continue;
            };
            let score = self.prioritizer.score_parent(resolved.path());
            found.push(Match {
                score,
                resolved,
                unit: index,
                seq,
            });
            if mode == Mode::First {
                best.fetch_min(rank_key(score, index), Ordering::AcqRel);
                if score <= unit.score {
                    break;
                }
            }
        }
        UnitOutcome::Matches(found)
    }
}

/// Files before subdirectories, subdirectories by priority, then by name.
fn sibling_order(prioritizer: &LocationPrioritizer, a: &DirEntry, b: &DirEntry) -> CmpOrdering {
    let key = |entry: &DirEntry| {
        let is_dir = entry.file_type().is_dir();
        let score = if is_dir {
            prioritizer.best_score_within(entry.path())
        } else {
            0
        };
        (is_dir, score)
    };
    key(a)
        .cmp(&key(b))
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// `(score, unit)` packed so one atomic `fetch_min` tracks the best
/// single-match candidate.
fn rank_key(score: u32, unit: usize) -> u64 {
    let unit = u32::try_from(unit).unwrap_or(u32::MAX);
    (u64::from(score) << 32) | u64::from(unit)
}

#[cfg(unix)]
fn same_volume(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    a.dev() == b.dev()
}

#[cfg(not(unix))]
fn same_volume(_a: &Metadata, _b: &Metadata) -> bool {
    true
}
