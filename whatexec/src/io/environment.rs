//! Process environment access: `PATH`, `PATHEXT` and well-known folders.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::core::platform::Platform;
use crate::core::priority::KnownFolders;
use crate::error::ResolveError;

/// Ordered list of `PATH` directories or extensions.
///
/// Shared so cached snapshots are handed out without copying.
pub type EntryList = Arc<[OsString]>;

/// Supplies the `PATH` directory list and the extension list.
pub trait PathSource: Send + Sync {
    /// `PATH` entries in order, empty entries removed.
    fn directories(&self) -> Result<EntryList, ResolveError>;

    /// Extensions tried for bare names, the empty extension first.
    fn extensions(&self) -> EntryList;
}

impl<T: PathSource + ?Sized> PathSource for Box<T> {
    fn directories(&self) -> Result<EntryList, ResolveError> {
        (**self).directories()
    }

    fn extensions(&self) -> EntryList {
        (**self).extensions()
    }
}

impl<T: PathSource + ?Sized> PathSource for Arc<T> {
    fn directories(&self) -> Result<EntryList, ResolveError> {
        (**self).directories()
    }

    fn extensions(&self) -> EntryList {
        (**self).extensions()
    }
}

/// Reads `PATH` and `PATHEXT` from the running process on every call.
#[derive(Debug, Clone, Copy)]
pub struct ProcessEnvironment {
    platform: Platform,
}

impl ProcessEnvironment {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl PathSource for ProcessEnvironment {
    fn directories(&self) -> Result<EntryList, ResolveError> {
        let raw = env::var_os("PATH").ok_or(ResolveError::EnvironmentUnavailable)?;
        let entries: Vec<OsString> = env::split_paths(&raw)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::into_os_string)
            .collect();
        debug!(entries = entries.len(), "read PATH");
        Ok(entries.into())
    }

    fn extensions(&self) -> EntryList {
        let pathext = env::var_os("PATHEXT");
        self.platform.path_extensions(pathext.as_deref()).into()
    }
}

/// Well-known folders of the current machine for `platform`.
pub fn known_folders(platform: Platform) -> KnownFolders {
    if platform.is_windows() {
        windows_known_folders()
    } else {
        unix_known_folders(platform)
    }
}

fn windows_known_folders() -> KnownFolders {
    let var = |name: &str| env::var_os(name).map(PathBuf::from);
    let start_menu_tools = |base: Option<PathBuf>| {
        base.map(|base| {
            base.join("Microsoft")
                .join("Windows")
                .join("Start Menu")
                .join("Programs")
                .join("Administrative Tools")
        })
    };
    let windows_dir = var("SystemRoot").or_else(|| var("windir"));

    KnownFolders {
        install: [
            var("ProgramFiles"),
            var("ProgramFiles(x86)"),
            var("ProgramW6432"),
        ]
        .into_iter()
        .flatten()
        .collect(),
        system: [
            windows_dir.as_ref().map(|dir| dir.join("System32")),
            windows_dir.clone(),
        ]
        .into_iter()
        .flatten()
        .collect(),
        app_data: [var("APPDATA"), var("LOCALAPPDATA"), var("ProgramData")]
            .into_iter()
            .flatten()
            .collect(),
        admin_tools: [
            start_menu_tools(var("APPDATA")),
            start_menu_tools(var("ProgramData")),
        ]
        .into_iter()
        .flatten()
        .collect(),
        desktop: dirs::desktop_dir().into_iter().collect(),
    }
}

fn unix_known_folders(platform: Platform) -> KnownFolders {
    let mut folders = KnownFolders {
        install: ["/usr/local/bin", "/usr/bin", "/bin", "/opt", "/snap/bin"]
            .into_iter()
            .map(PathBuf::from)
            .chain(dirs::executable_dir())
            .collect(),
        system: ["/usr/sbin", "/sbin", "/usr/libexec", "/usr/lib"]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        app_data: ["/var/lib", "/usr/share"]
            .into_iter()
            .map(PathBuf::from)
            .chain(dirs::data_dir())
            .chain(dirs::data_local_dir())
            .collect(),
        admin_tools: vec![PathBuf::from("/usr/local/sbin")],
        desktop: dirs::desktop_dir().into_iter().collect(),
    };
    if platform == Platform::MacOs {
        folders.install.push(PathBuf::from("/Applications"));
        folders.system.push(PathBuf::from("/System"));
        folders.app_data.push(PathBuf::from("/Library"));
    }
    folders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_folders_rank_bin_directories_first() {
        let folders = known_folders(Platform::Linux);
        assert!(folders.install.contains(&PathBuf::from("/usr/bin")));
        assert!(folders.system.contains(&PathBuf::from("/usr/sbin")));
    }

    #[test]
    fn macos_adds_application_bundles() {
        let folders = known_folders(Platform::MacOs);
        assert!(folders.install.contains(&PathBuf::from("/Applications")));
    }

    #[test]
    fn process_extensions_start_with_empty() {
        let exts = ProcessEnvironment::new(Platform::Linux).extensions();
        assert_eq!(exts.first(), Some(&OsString::new()));
    }
}
