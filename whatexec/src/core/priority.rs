//! Directory ranking used to order scan results.
//!
//! Scores are a pure function of a path and a table of well-known folders.
//! Lower scores sort first; [`UNRANKED`] is used for everything else.

use std::path::{Path, PathBuf};

/// Score for directories outside every well-known location.
pub const UNRANKED: u32 = 10;

/// Well-known folder categories, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationCategory {
    /// Deliberate install locations (`/usr/bin`, `Program Files`).
    Install,
    /// Operating-system directories.
    System,
    /// Per-user and per-machine application data.
    AppData,
    AdminTools,
    Desktop,
}

impl LocationCategory {
    pub fn score(self) -> u32 {
        match self {
            Self::Install => 0,
            Self::System => 1,
            Self::AppData => 2,
            Self::AdminTools => 3,
            Self::Desktop => 4,
        }
    }
}

/// Well-known folders of one machine, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFolders {
    pub install: Vec<PathBuf>,
    pub system: Vec<PathBuf>,
    pub app_data: Vec<PathBuf>,
    pub admin_tools: Vec<PathBuf>,
    pub desktop: Vec<PathBuf>,
}

impl KnownFolders {
    fn categorized(&self) -> impl Iterator<Item = (&PathBuf, LocationCategory)> {
        fn tag(
            paths: &[PathBuf],
            category: LocationCategory,
        ) -> impl Iterator<Item = (&PathBuf, LocationCategory)> {
            paths.iter().map(move |path| (path, category))
        }
        tag(&self.install, LocationCategory::Install)
            .chain(tag(&self.system, LocationCategory::System))
            .chain(tag(&self.app_data, LocationCategory::AppData))
            .chain(tag(&self.admin_tools, LocationCategory::AdminTools))
            .chain(tag(&self.desktop, LocationCategory::Desktop))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PriorityRule {
    prefix: PathBuf,
    depth: usize,
    score: u32,
}

/// Assigns a [`UNRANKED`]-bounded score to directories.
///
/// The longest matching prefix wins, so a nested well-known folder (an
/// admin-tools folder inside app data) keeps its own score. Equal-length
/// prefixes keep table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationPrioritizer {
    rules: Vec<PriorityRule>,
}

impl LocationPrioritizer {
    pub fn new<I, P>(rules: I) -> Self
    where
        I: IntoIterator<Item = (P, u32)>,
        P: AsRef<Path>,
    {
        let mut rules: Vec<PriorityRule> = rules
            .into_iter()
            .filter(|(prefix, _)| !prefix.as_ref().as_os_str().is_empty())
            .map(|(prefix, score)| {
                let prefix = fold_case(prefix.as_ref());
                PriorityRule {
                    depth: prefix.components().count(),
                    prefix,
                    score,
                }
            })
            .collect();
        // Stable: equal depths keep table order.
        rules.sort_by(|a, b| b.depth.cmp(&a.depth));
        Self { rules }
    }

    pub fn from_known_folders(folders: &KnownFolders) -> Self {
        Self::new(
            folders
                .categorized()
                .map(|(path, category)| (path.clone(), category.score())),
        )
    }

    pub fn score(&self, directory: &Path) -> u32 {
        let folded = fold_case(directory);
        self.rules
            .iter()
            .find(|rule| folded.starts_with(&rule.prefix))
            .map_or(UNRANKED, |rule| rule.score)
    }

    /// Best score reachable at or below `directory`: its own score, or that
    /// of any ranked location nested inside it.
    pub fn best_score_within(&self, directory: &Path) -> u32 {
        let folded = fold_case(directory);
        self.rules
            .iter()
            .filter(|rule| rule.prefix.starts_with(&folded))
            .map(|rule| rule.score)
            .fold(self.score(directory), u32::min)
    }

    /// Score of the directory that contains `file`.
    pub fn score_parent(&self, file: &Path) -> u32 {
        file.parent().map_or(UNRANKED, |parent| self.score(parent))
    }
}

fn fold_case(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().to_lowercase())
}
