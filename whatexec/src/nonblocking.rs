//! Async entry points that move blocking scans onto tokio's blocking pool.
//!
//! The cancellation token is checked before the worker starts, raced against
//! the worker while it runs, and handed to the worker so the scan itself
//! stops between entries.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::types::{ExecutableResolver, ResolvedExecutable};
use crate::error::ResolveError;
use crate::io::locator::FileSystemLocator;
use crate::resolve::ResolutionFacade;

/// Run `work` on the blocking pool, returning early on cancellation.
pub async fn run_blocking<T, F>(cancel: &CancellationToken, work: F) -> Result<T, ResolveError>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Result<T, ResolveError> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }
    let token = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || work(token));
    tokio::select! {
        () = cancel.cancelled() => {
            debug!("cancelled while worker was running");
            Err(ResolveError::Cancelled)
        }
        joined = handle => joined.map_err(|err| ResolveError::Worker(err.to_string()))?,
    }
}

impl FileSystemLocator {
    pub async fn locate_async(
        self: Arc<Self>,
        name: String,
        cancel: CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        run_blocking(&cancel, move |token| self.locate(&name, &token)).await
    }

    pub async fn locate_instances_async(
        self: Arc<Self>,
        name: String,
        cancel: CancellationToken,
    ) -> Result<Vec<ResolvedExecutable>, ResolveError> {
        run_blocking(&cancel, move |token| self.locate_instances(&name, &token)).await
    }
}

impl<R> ResolutionFacade<R>
where
    R: ExecutableResolver + Send + Sync + 'static,
{
    pub async fn try_resolve_async(
        self: Arc<Self>,
        name: String,
        cancel: CancellationToken,
    ) -> Result<Option<ResolvedExecutable>, ResolveError> {
        run_blocking(&cancel, move |token| self.try_resolve_with(&name, &token)).await
    }
}
