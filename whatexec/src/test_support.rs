//! Test-only helpers: fixture files, a manual clock and a scripted `PATH`.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::ResolveError;
use crate::io::cache::Clock;
use crate::io::environment::{EntryList, PathSource};

/// Write a file with the owner/group/other execute bits set.
pub fn write_executable(dir: &Path, name: &str) -> io::Result<PathBuf> {
    write_with_mode(dir, name, 0o755)
}

/// Write a file without any execute bit.
pub fn write_plain_file(dir: &Path, name: &str) -> io::Result<PathBuf> {
    write_with_mode(dir, name, 0o644)
}

fn write_with_mode(dir: &Path, name: &str, mode: u32) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, b"#!/bin/sh\nexit 0\n")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(path)
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed `PATH` and extension lists that count how often they are read.
#[derive(Debug)]
pub struct StaticPathSource {
    directories: Option<EntryList>,
    extensions: EntryList,
    directory_reads: AtomicUsize,
    extension_reads: AtomicUsize,
}

impl StaticPathSource {
    pub fn new<I, P, E>(directories: I, extensions: E) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        E: IntoIterator<Item = &'static str>,
    {
        let directories: Vec<OsString> = directories
            .into_iter()
            .map(|dir| dir.as_ref().as_os_str().to_os_string())
            .collect();
        let extensions: Vec<OsString> = extensions.into_iter().map(OsString::from).collect();
        Self {
            directories: Some(directories.into()),
            extensions: extensions.into(),
            directory_reads: AtomicUsize::new(0),
            extension_reads: AtomicUsize::new(0),
        }
    }

    /// A source whose `PATH` variable is missing.
    pub fn unavailable() -> Self {
        Self {
            directories: None,
            extensions: EntryList::from(vec![OsString::new()]),
            directory_reads: AtomicUsize::new(0),
            extension_reads: AtomicUsize::new(0),
        }
    }

    pub fn directory_reads(&self) -> usize {
        self.directory_reads.load(Ordering::SeqCst)
    }

    pub fn extension_reads(&self) -> usize {
        self.extension_reads.load(Ordering::SeqCst)
    }
}

impl PathSource for StaticPathSource {
    fn directories(&self) -> Result<EntryList, ResolveError> {
        self.directory_reads.fetch_add(1, Ordering::SeqCst);
        self.directories
            .clone()
            .ok_or(ResolveError::EnvironmentUnavailable)
    }

    fn extensions(&self) -> EntryList {
        self.extension_reads.fetch_add(1, Ordering::SeqCst);
        self.extensions.clone()
    }
}
