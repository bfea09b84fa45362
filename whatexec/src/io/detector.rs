//! Executable file detection.

use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::Path;

use tracing::trace;

use crate::core::platform::Platform;
use crate::core::types::ResolvedExecutable;
use crate::error::ResolveError;

/// Answers "can this file be run as a program on this OS".
pub trait ExecutableDetector: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fails with [`ResolveError::FileNotFound`] when `path` does not exist.
    /// Directories are never executable.
    fn is_executable(&self, path: &Path) -> Result<bool, ResolveError>;
}

/// Detector combining permission bits and the platform extension allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDetector {
    platform: Platform,
}

impl PlatformDetector {
    /// Detector for the running OS; fails on wasm and iOS-like sandboxes.
    pub fn for_current_platform() -> Result<Self, ResolveError> {
        Ok(Self::new(Platform::current()?))
    }

    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl ExecutableDetector for PlatformDetector {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn is_executable(&self, path: &Path) -> Result<bool, ResolveError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ResolveError::FileNotFound(path.to_path_buf()));
            }
            Err(err) => {
                trace!(path = %path.display(), err = %err, "metadata unavailable");
                return Ok(false);
            }
        };
        if !metadata.is_file() {
            return Ok(false);
        }

        let permitted = has_execute_permission(&metadata);
        let known_extension = self.platform.has_executable_extension(path);
        if self.platform.requires_all_signals() {
            Ok(permitted && known_extension)
        } else {
            Ok(permitted || known_extension)
        }
    }
}

#[cfg(unix)]
fn has_execute_permission(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

// ACLs are out of reach without platform APIs; a file whose metadata we could
// read counts as permitted and the extension decides.
#[cfg(not(unix))]
fn has_execute_permission(_metadata: &Metadata) -> bool {
    true
}

/// Build a [`ResolvedExecutable`] if `path` exists and passes the detector.
///
/// Vanished files and unreadable metadata are treated as "not a match".
pub fn verify_executable<D>(detector: &D, path: &Path) -> Option<ResolvedExecutable>
where
    D: ExecutableDetector + ?Sized,
{
    match detector.is_executable(path) {
        Ok(true) => match std::path::absolute(path) {
            Ok(absolute) => Some(ResolvedExecutable::verified(absolute)),
            Err(err) => {
                trace!(path = %path.display(), err = %err, "cannot make path absolute");
                None
            }
        },
        Ok(false) => None,
        Err(err) => {
            trace!(path = %path.display(), err = %err, "candidate skipped");
            None
        }
    }
}
