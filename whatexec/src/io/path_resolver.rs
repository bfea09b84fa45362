//! `PATH`-based command resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::core::query::CommandQuery;
use crate::core::types::{ExecutableResolver, ResolvedExecutable};
use crate::error::ResolveError;
use crate::io::detector::{ExecutableDetector, verify_executable};
use crate::io::environment::{EntryList, PathSource};

/// Resolves command names against the directories of a [`PathSource`].
///
/// Wrap the source in a [`CachedPathSource`](crate::io::cached_resolver::CachedPathSource)
/// to avoid re-reading the environment on every call.
pub struct PathResolver<S> {
    source: S,
    detector: Arc<dyn ExecutableDetector>,
}

impl<S: PathSource> PathResolver<S> {
    pub fn new(source: S, detector: Arc<dyn ExecutableDetector>) -> Self {
        Self { source, detector }
    }

    /// Batch lookup: the union of every `PATH` match for every name, or
    /// `None` when nothing matched at all.
    pub fn try_resolve_many(
        &self,
        names: &[&str],
    ) -> Result<Option<Vec<ResolvedExecutable>>, ResolveError> {
        let queries = names
            .iter()
            .map(|name| CommandQuery::parse(name))
            .collect::<Result<Vec<_>, _>>()?;
        let mut found = Vec::new();
        for query in &queries {
            match self.lookup(query, false) {
                Ok(matches) => push_unique(&mut found, matches),
                Err(ResolveError::EnvironmentUnavailable) => return Ok(None),
                Err(err) => return Err(err),
            }
        }
        Ok((!found.is_empty()).then_some(found))
    }

    pub fn resolve_many(&self, names: &[&str]) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        self.try_resolve_many(names)?
            .ok_or_else(|| ResolveError::NotFound(names.join(",")))
    }

    #[instrument(skip_all, fields(name = %query, first_only = first_only))]
    fn lookup(
        &self,
        query: &CommandQuery,
        first_only: bool,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        if query.is_path_like() {
            debug!("path-like query, checking literal path");
            return Ok(verify_executable(&*self.detector, query.as_path())
                .into_iter()
                .collect());
        }

        let directories = self.source.directories()?;
        let extensions = if query.has_extension() {
            EntryList::from(vec![OsString::new()])
        } else {
            self.source.extensions()
        };

        let mut found = Vec::new();
        for candidate in candidates(query, &directories, &extensions) {
            let Some(resolved) = verify_executable(&*self.detector, &candidate) else {
                trace!(candidate = %candidate.display(), "no executable");
                continue;
            };
            debug!(path = %resolved, "resolved from PATH");
            if !found.contains(&resolved) {
                found.push(resolved);
            }
            if first_only {
                break;
            }
        }
        Ok(found)
    }
}

impl<S: PathSource> ExecutableResolver for PathResolver<S> {
    fn try_resolve(&self, name: &str) -> Result<Option<ResolvedExecutable>, ResolveError> {
        let query = CommandQuery::parse(name)?;
        match self.lookup(&query, true) {
            Ok(found) => Ok(found.into_iter().next()),
            Err(err) if err.is_miss() => {
                debug!(name, err = %err, "treating as miss");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Every match for `name` in `PATH` order, duplicates removed.
    fn resolve_all(&self, name: &str) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        let query = CommandQuery::parse(name)?;
        match self.lookup(&query, false) {
            Err(err) if err.is_miss() => {
                debug!(name, err = %err, "treating as miss");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

/// Candidate paths with the extension varying fastest and the directory
/// slowest.
fn candidates<'a>(
    query: &'a CommandQuery,
    directories: &'a [OsString],
    extensions: &'a [OsString],
) -> impl Iterator<Item = PathBuf> + 'a {
    directories.iter().flat_map(move |dir| {
        extensions.iter().map(move |ext| {
            let mut file_name = OsString::from(query.as_str());
            file_name.push(ext);
            Path::new(dir).join(file_name)
        })
    })
}

fn push_unique(found: &mut Vec<ResolvedExecutable>, matches: Vec<ResolvedExecutable>) {
    for resolved in matches {
        if !found.contains(&resolved) {
            found.push(resolved);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::platform::Platform;
    use crate::io::detector::PlatformDetector;
    use crate::test_support::{StaticPathSource, write_executable, write_plain_file};

    fn resolver(source: Arc<StaticPathSource>) -> PathResolver<Arc<StaticPathSource>> {
        PathResolver::new(source, Arc::new(PlatformDetector::new(Platform::Linux)))
    }

    #[test]
    fn first_path_directory_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        std::fs::create_dir_all(&first).expect("mkdir");
        std::fs::create_dir_all(&second).expect("mkdir");
        write_executable(&first, "tool").expect("write");
        write_executable(&second, "tool").expect("write");

        let source = Arc::new(StaticPathSource::new([&first, &second], [""]));
        let resolved = resolver(source)
            .resolve("tool")
            .expect("resolve");
        assert_eq!(resolved.path(), first.join("tool"));
    }

    #[test]
    fn non_executable_candidates_are_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        std::fs::create_dir_all(&first).expect("mkdir");
        std::fs::create_dir_all(&second).expect("mkdir");
        write_plain_file(&first, "tool").expect("write");
        write_executable(&second, "tool").expect("write");

        let source = Arc::new(StaticPathSource::new([&first, &second], [""]));
        let resolved = resolver(source).resolve("tool").expect("resolve");
        assert_eq!(resolved.path(), second.join("tool"));
    }

    #[test]
    fn extension_varies_before_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        std::fs::create_dir_all(&first).expect("mkdir");
        std::fs::create_dir_all(&second).expect("mkdir");
        write_executable(&first, "tool.bat").expect("write");
        write_executable(&second, "tool").expect("write");

        let source = Arc::new(StaticPathSource::new([&first, &second], ["", ".exe", ".bat"]));
        let resolved = resolver(source).resolve("tool").expect("resolve");
        assert_eq!(resolved.path(), first.join("tool.bat"));
    }

    #[test]
    fn names_with_extensions_skip_the_extension_list() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_executable(temp.path(), "tool.sh").expect("write");
        write_executable(temp.path(), "tool.sh.exe").expect("write");

        let source = Arc::new(StaticPathSource::new([temp.path()], [".exe"]));
        let resolved = resolver(source.clone()).resolve("tool.sh").expect("resolve");
        assert_eq!(resolved.path(), temp.path().join("tool.sh"));
        assert_eq!(source.extension_reads(), 0);
    }

    #[test]
    fn missing_path_is_a_miss_not_an_error() {
        let source = Arc::new(StaticPathSource::unavailable());
        let resolver = resolver(source);
        assert_eq!(resolver.try_resolve("tool"), Ok(None));
        assert_eq!(
            resolver.resolve("tool"),
            Err(ResolveError::NotFound("tool".to_string()))
        );
        assert_eq!(resolver.try_resolve_many(&["tool"]), Ok(None));
    }

    #[test]
    fn path_like_queries_never_read_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exe = write_executable(temp.path(), "run.sh").expect("write");
        let source = Arc::new(StaticPathSource::new([temp.path()], [""]));
        let resolver = resolver(source.clone());

        let resolved = resolver
            .resolve(exe.to_str().expect("utf8"))
            .expect("resolve");
        assert_eq!(resolved.path(), exe.as_path());
        assert_eq!(source.directory_reads(), 0);
    }

    #[test]
    fn empty_name_is_invalid_input() {
        let source = Arc::new(StaticPathSource::new(Vec::<PathBuf>::new(), [""]));
        assert_eq!(
            resolver(source).try_resolve(" "),
            Err(ResolveError::InvalidInput)
        );
    }

    #[test]
    fn batch_returns_union_of_all_matches() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        std::fs::create_dir_all(&first).expect("mkdir");
        std::fs::create_dir_all(&second).expect("mkdir");
        write_executable(&first, "a").expect("write");
        write_executable(&second, "a").expect("write");
        write_executable(&second, "b").expect("write");

        let source = Arc::new(StaticPathSource::new([&first, &second], [""]));
        let found = resolver(source)
            .resolve_many(&["a", "b", "missing"])
            .expect("resolve");
        let paths: Vec<PathBuf> = found.into_iter().map(ResolvedExecutable::into_path_buf).collect();
        assert_eq!(paths, vec![first.join("a"), second.join("a"), second.join("b")]);
    }
}
