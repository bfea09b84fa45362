//! Operating-system variants and their executable conventions.
//!
//! The platform is chosen once (usually via [`Platform::current`]) and then
//! passed to every component that needs OS-specific behavior, so nothing
//! re-branches on the host OS per call.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use crate::error::ResolveError;

const WINDOWS_EXTENSIONS: &[&str] = &["exe", "msi", "appx", "com", "bat", "cmd", "jar"];

const LINUX_EXTENSIONS: &[&str] = &[
    "appimage", "deb", "rpm", "so", "o", "out", "bin", "elf", "mod", "axf", "ko", "prx", "puff",
    "jar", "sh",
];

const MACOS_EXTENSIONS: &[&str] = &[
    "kext", "pkg", "app", "so", "o", "out", "bin", "elf", "mod", "axf", "ko", "prx", "puff", "jar",
    "sh",
];

const FREEBSD_EXTENSIONS: &[&str] = &[
    "appimage", "so", "o", "out", "bin", "elf", "mod", "axf", "ko", "prx", "puff", "jar", "sh",
];

const ANDROID_EXTENSIONS: &[&str] = &[
    "apk", "so", "o", "out", "bin", "elf", "mod", "axf", "ko", "prx", "puff", "jar", "sh",
];

/// `PATHEXT` value assumed on Windows when the variable is unset.
pub const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

/// Operating systems with a well-defined notion of an executable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    FreeBsd,
    Android,
    /// Remaining POSIX systems (NetBSD, OpenBSD, illumos, ...).
    OtherUnix,
}

impl Platform {
    /// Platform of the running process.
    ///
    /// Fails for browser runtimes and app-store sandboxes (wasm, iOS), where
    /// "executable file" has no meaning.
    pub fn current() -> Result<Self, ResolveError> {
        if cfg!(target_family = "wasm") {
            return Err(ResolveError::PlatformNotSupported("wasm"));
        }
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name onto a platform.
    pub fn from_os(os: &'static str) -> Result<Self, ResolveError> {
        match os {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            "freebsd" => Ok(Self::FreeBsd),
            "android" => Ok(Self::Android),
            "netbsd" | "openbsd" | "dragonfly" | "solaris" | "illumos" | "haiku" => {
                Ok(Self::OtherUnix)
            }
            _ => Err(ResolveError::PlatformNotSupported(os)),
        }
    }

    pub fn is_windows(self) -> bool {
        self == Self::Windows
    }

    /// Lower-case extensions (without the dot) treated as executable or as
    /// executable containers.
    pub fn executable_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Windows => WINDOWS_EXTENSIONS,
            Self::Linux => LINUX_EXTENSIONS,
            Self::MacOs => MACOS_EXTENSIONS,
            Self::FreeBsd | Self::OtherUnix => FREEBSD_EXTENSIONS,
            Self::Android => ANDROID_EXTENSIONS,
        }
    }

    pub fn has_executable_extension(self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy().to_ascii_lowercase();
        self.executable_extensions().contains(&ext.as_str())
    }

    /// Windows demands both the permission and the extension signal; POSIX
    /// systems accept either.
    pub fn requires_all_signals(self) -> bool {
        self.is_windows()
    }

    /// Compare two file names with the platform's case sensitivity.
    pub fn names_equal(self, left: &OsStr, right: &OsStr) -> bool {
        if self.is_windows() {
            left.to_string_lossy().to_lowercase() == right.to_string_lossy().to_lowercase()
        } else {
            left == right
        }
    }

    /// Extensions appended to bare command names during `PATH` lookup.
    ///
    /// The empty extension always comes first. On Windows the rest come from
    /// `PATHEXT` (or [`DEFAULT_PATHEXT`]); elsewhere the list is fixed.
    pub fn path_extensions(self, pathext: Option<&OsStr>) -> Vec<OsString> {
        let mut extensions = vec![OsString::new()];
        if !self.is_windows() {
            return extensions;
        }
        let raw = pathext
            .map(|value| value.to_string_lossy().into_owned())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATHEXT.to_string());
        for ext in raw.split(';').map(str::trim).filter(|ext| !ext.is_empty()) {
            let ext = if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{ext}")
            };
            extensions.push(OsString::from(ext));
        }
        extensions
    }
}
