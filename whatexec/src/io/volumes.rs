//! Mounted volume discovery.

use std::fs;
use std::path::{Path, PathBuf};

use sysinfo::Disks;
use tracing::{debug, warn};

/// A mounted volume that can be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriveHandle {
    mount_point: PathBuf,
}

impl DriveHandle {
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Mounted and enumerable right now.
    pub fn is_ready(&self) -> bool {
        fs::read_dir(&self.mount_point).is_ok()
    }
}

/// Supplies the volumes that system-wide scans walk.
pub trait VolumeSource: Send + Sync {
    fn ready_volumes(&self) -> Vec<DriveHandle>;
}

/// Volumes reported by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

impl VolumeSource for SystemVolumes {
    fn ready_volumes(&self) -> Vec<DriveHandle> {
        let disks = Disks::new_with_refreshed_list();
        let mut drives: Vec<DriveHandle> = disks
            .list()
            .iter()
            .map(|disk| DriveHandle::new(disk.mount_point()))
            .collect();
        drives.sort();
        drives.dedup();

        let (ready, not_ready): (Vec<_>, Vec<_>) =
            drives.into_iter().partition(DriveHandle::is_ready);
        for drive in &not_ready {
            warn!(mount_point = %drive.mount_point().display(), "volume not ready, skipping");
        }
        if ready.is_empty() {
            let root = filesystem_root();
            debug!(root = %root.display(), "no volumes reported, falling back to filesystem root");
            return vec![DriveHandle::new(root)];
        }
        debug!(volumes = ready.len(), "enumerated volumes");
        ready
    }
}

/// A fixed volume list, for `--drive` and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedVolumes {
    drives: Vec<DriveHandle>,
}

impl FixedVolumes {
    pub fn new(drives: impl IntoIterator<Item = DriveHandle>) -> Self {
        Self {
            drives: drives.into_iter().collect(),
        }
    }
}

impl VolumeSource for FixedVolumes {
    fn ready_volumes(&self) -> Vec<DriveHandle> {
        self.drives
            .iter()
            .filter(|drive| drive.is_ready())
            .cloned()
            .collect()
    }
}

fn filesystem_root() -> PathBuf {
    if cfg!(windows) {
        let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
        PathBuf::from(format!("{drive}\\"))
    } else {
        PathBuf::from("/")
    }
}
