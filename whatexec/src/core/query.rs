//! Validated command names.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use crate::error::ResolveError;

/// A command name as typed by the user: bare (`git`), with an extension
/// (`git.exe`), or path-like (`./run.sh`, `/usr/bin/git`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandQuery {
    raw: String,
}

impl CommandQuery {
    /// Reject empty and whitespace-only names before any I/O happens.
    pub fn parse(name: &str) -> Result<Self, ResolveError> {
        if name.trim().is_empty() {
            return Err(ResolveError::InvalidInput);
        }
        Ok(Self {
            raw: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.raw)
    }

    /// Rooted queries and queries containing a separator are literal paths
    /// and never go through `PATH` or a filesystem scan.
    pub fn is_path_like(&self) -> bool {
        self.as_path().has_root() || self.raw.chars().any(std::path::is_separator)
    }

    pub fn has_extension(&self) -> bool {
        self.as_path().extension().is_some()
    }

    /// Final path component, used when falling back to a filesystem scan.
    pub fn file_name(&self) -> Option<&OsStr> {
        self.as_path().file_name()
    }
}

impl fmt::Display for CommandQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
