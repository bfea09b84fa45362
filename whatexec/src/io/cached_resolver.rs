//! Time-bounded caching of the `PATH` directory and extension lists.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ResolveError;
use crate::io::cache::ExpiringCache;
use crate::io::detector::ExecutableDetector;
use crate::io::environment::{EntryList, PathSource};
use crate::io::path_resolver::PathResolver;

pub const DEFAULT_DIRECTORIES_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_EXTENSIONS_TTL: Duration = Duration::from_secs(5 * 60);

/// The two fixed slots of the snapshot cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotSlot {
    Directories,
    Extensions,
}

pub type SnapshotCache = ExpiringCache<SnapshotSlot, EntryList>;

/// [`PathResolver`] whose environment reads are served from a TTL cache.
pub type CachedPathResolver<S> = PathResolver<CachedPathSource<S>>;

/// Decorates a [`PathSource`] with an injected [`SnapshotCache`].
#[derive(Debug)]
pub struct CachedPathSource<S> {
    inner: S,
    cache: Arc<SnapshotCache>,
    directories_ttl: Duration,
    extensions_ttl: Duration,
}

impl<S: PathSource> CachedPathSource<S> {
    pub fn new(inner: S, cache: Arc<SnapshotCache>) -> Self {
        Self {
            inner,
            cache,
            directories_ttl: DEFAULT_DIRECTORIES_TTL,
            extensions_ttl: DEFAULT_EXTENSIONS_TTL,
        }
    }

    /// Override either TTL; `None` keeps the default.
    pub fn with_ttls(
        mut self,
        directories_ttl: Option<Duration>,
        extensions_ttl: Option<Duration>,
    ) -> Self {
        if let Some(ttl) = directories_ttl {
            self.directories_ttl = ttl;
        }
        if let Some(ttl) = extensions_ttl {
            self.extensions_ttl = ttl;
        }
        self
    }
}

impl<S: PathSource> PathSource for CachedPathSource<S> {
    fn directories(&self) -> Result<EntryList, ResolveError> {
        self.cache
            .get_or_try_insert_with(SnapshotSlot::Directories, self.directories_ttl, || {
                debug!("PATH cache miss");
                self.inner.directories()
            })
    }

    fn extensions(&self) -> EntryList {
        let Ok(extensions) = self.cache.get_or_try_insert_with(
            SnapshotSlot::Extensions,
            self.extensions_ttl,
            || {
                debug!("extension cache miss");
                Ok::<_, Infallible>(self.inner.extensions())
            },
        );
        extensions
    }
}

impl<S: PathSource> CachedPathResolver<S> {
    /// Resolver over `source` with both reads cached in `cache`.
    pub fn cached(
        source: S,
        cache: Arc<SnapshotCache>,
        detector: Arc<dyn ExecutableDetector>,
        directories_ttl: Option<Duration>,
        extensions_ttl: Option<Duration>,
    ) -> Self {
        let source = CachedPathSource::new(source, cache).with_ttls(directories_ttl, extensions_ttl);
        PathResolver::new(source, detector)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::platform::Platform;
    use crate::core::types::ExecutableResolver;
    use crate::io::detector::PlatformDetector;
    use crate::test_support::{ManualClock, StaticPathSource, write_executable};

    fn cached(
        source: Arc<StaticPathSource>,
        clock: Arc<ManualClock>,
    ) -> CachedPathResolver<Arc<StaticPathSource>> {
        let cache = Arc::new(SnapshotCache::with_clock(clock));
        CachedPathResolver::cached(
            source,
            cache,
            Arc::new(PlatformDetector::new(Platform::Linux)),
            Some(Duration::from_secs(300)),
            Some(Duration::from_secs(300)),
        )
    }

    #[test]
    fn second_call_within_ttl_does_not_reread_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_executable(temp.path(), "git").expect("write");
        let source = Arc::new(StaticPathSource::new([temp.path()], [""]));
        let clock = Arc::new(ManualClock::new());
        let resolver = cached(source.clone(), clock.clone());

        let first = resolver.try_resolve("git").expect("resolve");
        clock.advance(Duration::from_secs(120));
        let second = resolver.try_resolve("git").expect("resolve");

        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(source.directory_reads(), 1);
        assert_eq!(source.extension_reads(), 1);
    }

    #[test]
    fn expired_snapshot_is_rebuilt() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_executable(temp.path(), "git").expect("write");
        let source = Arc::new(StaticPathSource::new([temp.path()], [""]));
        let clock = Arc::new(ManualClock::new());
        let resolver = cached(source.clone(), clock.clone());

        resolver.try_resolve("git").expect("resolve");
        clock.advance(Duration::from_secs(300));
        resolver.try_resolve("git").expect("resolve");

        assert_eq!(source.directory_reads(), 2);
    }

    #[test]
    fn cached_and_uncached_agree() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_executable(temp.path(), "git").expect("write");
        let source = Arc::new(StaticPathSource::new([temp.path()], [""]));
        let plain = PathResolver::new(
            source.clone(),
            Arc::new(PlatformDetector::new(Platform::Linux)),
        );
        let resolver = cached(source, Arc::new(ManualClock::new()));

        for name in ["git", "missing", "git.exe"] {
            assert_eq!(resolver.try_resolve(name), plain.try_resolve(name));
        }
    }

    #[test]
    fn unavailable_path_is_not_cached() {
        let source = Arc::new(StaticPathSource::unavailable());
        let resolver = cached(source.clone(), Arc::new(ManualClock::new()));

        assert_eq!(resolver.try_resolve("git"), Ok(None));
        assert_eq!(resolver.try_resolve("git"), Ok(None));
        assert_eq!(source.directory_reads(), 2);
    }

    #[test]
    fn concurrent_lookups_agree() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_executable(temp.path(), "git").expect("write");
        write_executable(temp.path(), "make").expect("write");
        let source = Arc::new(StaticPathSource::new([temp.path()], [""]));
        let resolver = Arc::new(cached(source, Arc::new(ManualClock::new())));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                let name = if i % 2 == 0 { "git" } else { "make" };
                std::thread::spawn(move || (name, resolver.resolve(name)))
            })
            .collect();
        for handle in handles {
            let (name, result) = handle.join().expect("join");
            let resolved = result.expect("resolve");
            assert_eq!(resolved.file_name(), Some(std::ffi::OsStr::new(name)));
        }
    }
}
