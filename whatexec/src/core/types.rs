//! Shared value types for resolution results and scan options.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// Absolute path of a file that existed and was executable when this value
/// was built.
///
/// Only the detector module can construct one, which keeps the "verified at
/// construction" guarantee. The file may still change afterwards; callers
/// that execute it accept that race.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedExecutable {
    path: PathBuf,
}

impl ResolvedExecutable {
    pub(crate) fn verified(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl fmt::Display for ResolvedExecutable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl AsRef<Path> for ResolvedExecutable {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Whether a scan descends into subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDepth {
    /// Inspect the immediate entries of each root only.
    TopLevelOnly,
    #[default]
    Recursive,
}

impl SearchDepth {
    pub fn from_recursive(recursive: bool) -> Self {
        if recursive {
            Self::Recursive
        } else {
            Self::TopLevelOnly
        }
    }
}

/// Shared contract of everything that turns a command name into a path.
pub trait ExecutableResolver {
    /// Non-failing lookup. `Err` is reserved for invalid input and
    /// cancellation; a miss is `Ok(None)`.
    fn try_resolve(&self, name: &str) -> Result<Option<ResolvedExecutable>, ResolveError>;

    /// Every match this resolver knows about, best first. Resolvers that can
    /// only produce one answer return at most one element.
    fn resolve_all(&self, name: &str) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        Ok(self.try_resolve(name)?.into_iter().collect())
    }

    /// Failing convenience form of [`ExecutableResolver::try_resolve`].
    fn resolve(&self, name: &str) -> Result<ResolvedExecutable, ResolveError> {
        self.try_resolve(name)?
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}
