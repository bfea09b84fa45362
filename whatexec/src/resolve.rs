//! Combined resolution: `PATH` first, then a system-wide scan.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::core::priority::LocationPrioritizer;
use crate::core::query::CommandQuery;
use crate::core::types::{ExecutableResolver, ResolvedExecutable};
use crate::error::ResolveError;
use crate::io::cached_resolver::{CachedPathSource, SnapshotCache};
use crate::io::config::WhatexecConfig;
use crate::io::detector::{ExecutableDetector, PlatformDetector};
use crate::io::environment::{PathSource, ProcessEnvironment, known_folders};
use crate::io::locator::FileSystemLocator;
use crate::io::path_resolver::PathResolver;
use crate::io::volumes::SystemVolumes;

/// Facade over the live process environment and mounted volumes.
pub type SystemFacade = ResolutionFacade<PathResolver<Box<dyn PathSource>>>;

/// Tries a `PATH` resolver and falls back to scanning every ready volume.
pub struct ResolutionFacade<R> {
    resolver: R,
    locator: Arc<FileSystemLocator>,
}

impl<R: ExecutableResolver> ResolutionFacade<R> {
    pub fn new(resolver: R, locator: Arc<FileSystemLocator>) -> Self {
        Self { resolver, locator }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// `PATH` hit or the best-ranked scan match.
    ///
    /// The volume scan only runs for bare names. Names with directory
    /// components are checked literally and a miss returns `None`; their
    /// file name is never stripped out and searched for elsewhere.
    #[instrument(skip_all, fields(name = name))]
    pub fn try_resolve_with(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        let query = CommandQuery::parse(name)?;
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        if let Some(found) = self.resolver.try_resolve(name)? {
            return Ok(Some(found));
        }
        if query.is_path_like() {
            debug!("literal path is not executable, no scan");
            return Ok(None);
        }
        debug!("PATH miss, scanning volumes");
        self.locator.locate(query.as_str(), cancel)
    }

    /// Every `PATH` match followed by every scan instance not already listed.
    #[instrument(skip_all, fields(name = name))]
    pub fn find_all_with(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        let query = CommandQuery::parse(name)?;
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let mut found = self.resolver.resolve_all(name)?;
        if query.is_path_like() {
            return Ok(found);
        }
        let mut seen: HashSet<ResolvedExecutable> = found.iter().cloned().collect();
        let scanned = self.locator.locate_instances(query.as_str(), cancel)?;
        found.extend(scanned.into_iter().filter(|item| seen.insert(item.clone())));
        Ok(found)
    }
}

impl<R: ExecutableResolver> ExecutableResolver for ResolutionFacade<R> {
    fn try_resolve(&self, name: &str) -> Result<Option<ResolvedExecutable>, ResolveError> {
        self.try_resolve_with(name, &CancellationToken::new())
    }

    fn resolve_all(&self, name: &str) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        self.find_all_with(name, &CancellationToken::new())
    }
}

/// Locator for this machine, honouring the `[search]` and `[priority]`
/// sections of `config`.
pub fn system_locator(
    config: &WhatexecConfig,
    detector: Arc<dyn ExecutableDetector>,
) -> FileSystemLocator {
    let prioritizer = if config.priority.locations.is_empty() {
        LocationPrioritizer::from_known_folders(&known_folders(detector.platform()))
    } else {
        LocationPrioritizer::new(
            config
                .priority
                .locations
                .iter()
                .map(|rule| (&rule.prefix, rule.score)),
        )
    };
    FileSystemLocator::new(
        detector,
        Arc::new(prioritizer),
        Arc::new(SystemVolumes),
        config.search.scan_options(),
    )
}

/// Facade over the running process's `PATH` and this machine's volumes.
pub fn system_facade(config: &WhatexecConfig) -> Result<SystemFacade, ResolveError> {
    let detector: Arc<dyn ExecutableDetector> = Arc::new(PlatformDetector::for_current_platform()?);
    let environment = ProcessEnvironment::new(detector.platform());
    let source: Box<dyn PathSource> = if config.cache.enabled {
        Box::new(
            CachedPathSource::new(environment, Arc::new(SnapshotCache::new())).with_ttls(
                Some(config.cache.path_ttl()),
                Some(config.cache.extensions_ttl()),
            ),
        )
    } else {
        Box::new(environment)
    };
    let locator = system_locator(config, Arc::clone(&detector));
    Ok(ResolutionFacade::new(
        PathResolver::new(source, detector),
        Arc::new(locator),
    ))
}
