//! Error taxonomy for command resolution.
//!
//! Only input validation, platform support and caller-requested cancellation
//! escape to callers. Failures local to one candidate (a file that vanished,
//! a directory that cannot be listed) are absorbed by the scanning code.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by resolvers, locators and the detector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The command name was empty or blank.
    #[error("command name cannot be empty")]
    InvalidInput,

    /// No candidate matched by any strategy.
    #[error("could not find executable `{0}`")]
    NotFound(String),

    /// A file passed to the detector does not exist.
    #[error("{0} does not exist")]
    FileNotFound(PathBuf),

    /// Executable detection has no meaning on this platform.
    #[error("executable detection is not supported on {0}")]
    PlatformNotSupported(&'static str),

    /// `PATH` is unset or could not be read.
    #[error("PATH environment variable is unavailable")]
    EnvironmentUnavailable,

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A background worker panicked or was aborted.
    #[error("background worker failed: {0}")]
    Worker(String),
}

impl ResolveError {
    /// True for outcomes the non-failing API reports as "no result".
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::FileNotFound(_) | Self::EnvironmentUnavailable
        )
    }
}
