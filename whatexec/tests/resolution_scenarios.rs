//! End-to-end resolution scenarios over throwaway directory trees.
//!
//! Each test builds a fake `PATH` and/or a fake volume under a tempdir and
//! drives the public API the way an embedding application would.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use whatexec::core::platform::Platform;
use whatexec::core::priority::LocationPrioritizer;
use whatexec::core::types::{ExecutableResolver, ResolvedExecutable};
use whatexec::io::cached_resolver::{CachedPathResolver, SnapshotCache};
use whatexec::io::detector::{ExecutableDetector, PlatformDetector};
use whatexec::io::locator::{FileSystemLocator, ScanOptions};
use whatexec::io::path_resolver::PathResolver;
use whatexec::io::volumes::{DriveHandle, FixedVolumes};
use whatexec::resolve::ResolutionFacade;
use whatexec::test_support::{ManualClock, StaticPathSource, write_executable};

fn linux() -> Arc<dyn ExecutableDetector> {
    Arc::new(PlatformDetector::new(Platform::Linux))
}

#[test]
fn path_order_decides_between_duplicates() {
    let root = tempfile::tempdir().expect("tempdir");
    let usr_bin = root.path().join("usr/bin");
    let bin = root.path().join("bin");
    fs::create_dir_all(&usr_bin).expect("mkdir");
    fs::create_dir_all(&bin).expect("mkdir");
    let expected = write_executable(&usr_bin, "git").expect("write");
    write_executable(&bin, "git").expect("write");

    let source = Arc::new(StaticPathSource::new([&usr_bin, &bin], [""]));
    let resolver = PathResolver::new(source, linux());

    let resolved = resolver.resolve("git").expect("resolve");
    assert_eq!(resolved.path(), expected.as_path());
    assert_eq!(
        resolver.resolve_all("git").expect("resolve").len(),
        2,
        "both PATH entries are reported by resolve_all"
    );
}

#[test]
fn cached_second_lookup_skips_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_executable(dir.path(), "node").expect("write");
    let source = Arc::new(StaticPathSource::new([dir.path()], [""]));
    let clock = Arc::new(ManualClock::new());
    let resolver = CachedPathResolver::cached(
        source.clone(),
        Arc::new(SnapshotCache::with_clock(clock.clone())),
        linux(),
        Some(Duration::from_secs(300)),
        None,
    );

    let first = resolver.try_resolve("node").expect("resolve");
    clock.advance(Duration::from_secs(120));
    let second = resolver.try_resolve("node").expect("resolve");

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(source.directory_reads(), 1);
}

#[test]
fn windows_extension_list_finds_batch_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let expected = write_executable(dir.path(), "tool.BAT").expect("write");
    let source = Arc::new(StaticPathSource::new([dir.path()], ["", ".EXE", ".BAT"]));
    let resolver = PathResolver::new(
        source,
        Arc::new(PlatformDetector::new(Platform::Windows)),
    );

    let resolved = resolver.resolve("tool").expect("resolve");
    assert_eq!(resolved.path(), expected.as_path());
}

#[test]
fn facade_falls_back_to_volume_scan() {
    let path_dir = tempfile::tempdir().expect("tempdir");
    let volume = tempfile::tempdir().expect("tempdir");
    let install = volume.path().join("Tools/App");
    fs::create_dir_all(&install).expect("mkdir");
    let expected = write_executable(&install, "app").expect("write");

    let detector = linux();
    let locator = FileSystemLocator::new(
        Arc::clone(&detector),
        Arc::new(LocationPrioritizer::default()),
        Arc::new(FixedVolumes::new([DriveHandle::new(volume.path())])),
        ScanOptions::default(),
    );
    let resolver = PathResolver::new(
        Arc::new(StaticPathSource::new([path_dir.path()], [""])),
        detector,
    );
    let facade = ResolutionFacade::new(resolver, Arc::new(locator));

    let resolved = facade.resolve("app").expect("resolve");
    assert_eq!(resolved.path(), expected.as_path());
}

fn plain_locator() -> FileSystemLocator {
    FileSystemLocator::new(
        linux(),
        Arc::new(LocationPrioritizer::default()),
        Arc::new(FixedVolumes::default()),
        ScanOptions::default(),
    )
}

#[test]
fn unreadable_directory_does_not_abort_scan() {
    let root = tempfile::tempdir().expect("tempdir");
    let locked = root.path().join("locked");
    let open = root.path().join("open");
    fs::create_dir_all(&locked).expect("mkdir");
    fs::create_dir_all(&open).expect("mkdir");
    write_executable(&locked, "tool").expect("write");
    let expected = write_executable(&open, "tool").expect("write");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
    if fs::read_dir(&locked).is_ok() {
        // Privileged users bypass the mode bits; nothing to deny here.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod");
        return;
    }

    let locator = plain_locator();
    let instances =
        locator.locate_instances_in_directory(root.path(), "tool", &CancellationToken::new());
    let all = locator.locate_all_in_directory(root.path(), &CancellationToken::new());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod");

    let found: Vec<_> = instances
        .expect("scan succeeds")
        .into_iter()
        .map(ResolvedExecutable::into_path_buf)
        .collect();
    assert_eq!(found, vec![expected.clone()]);
    assert!(all.expect("scan succeeds").iter().any(|r| r.path() == expected));
}

#[test]
fn dangling_symlink_is_skipped() {
    let root = tempfile::tempdir().expect("tempdir");
    let broken = root.path().join("broken");
    let open = root.path().join("open");
    fs::create_dir_all(&broken).expect("mkdir");
    fs::create_dir_all(&open).expect("mkdir");
    std::os::unix::fs::symlink(root.path().join("nowhere"), broken.join("tool")).expect("symlink");
    let expected = write_executable(&open, "tool").expect("write");

    let locator = plain_locator();
    let found: Vec<_> = locator
        .locate_instances_in_directory(root.path(), "tool", &CancellationToken::new())
        .expect("scan succeeds")
        .into_iter()
        .map(ResolvedExecutable::into_path_buf)
        .collect();
    assert_eq!(found, vec![expected.clone()]);

    let single = locator
        .locate_in_directory(root.path(), "tool", &CancellationToken::new())
        .expect("scan succeeds");
    assert_eq!(single.map(ResolvedExecutable::into_path_buf), Some(expected));
}

#[test]
fn nonexistent_command_is_a_clean_miss() {
    let path_dir = tempfile::tempdir().expect("tempdir");
    let volume = tempfile::tempdir().expect("tempdir");
    let detector = linux();
    let locator = FileSystemLocator::new(
        Arc::clone(&detector),
        Arc::new(LocationPrioritizer::default()),
        Arc::new(FixedVolumes::new([DriveHandle::new(volume.path())])),
        ScanOptions::default(),
    );
    let resolver = PathResolver::new(
        Arc::new(StaticPathSource::new([path_dir.path()], [""])),
        detector,
    );
    let facade = ResolutionFacade::new(resolver, Arc::new(locator));

    assert_eq!(facade.try_resolve("nonexistent_command_xyz"), Ok(None));
    assert!(facade.resolve("nonexistent_command_xyz").is_err());
}
