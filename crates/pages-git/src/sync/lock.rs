//! Cancellable reader/writer lock guarding a site's working tree.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use super::ShutdownSignal;
use crate::error::SiteError;

/// Shared guard held by readers while they look up and open files.
pub type TreeReadGuard = OwnedRwLockReadGuard<()>;

/// Exclusive guard held by a sync while it mutates the working tree.
pub type TreeWriteGuard = OwnedRwLockWriteGuard<()>;

/// Advisory lock over one working tree.
///
/// Acquisition gives up when the shutdown signal fires or after the
/// configured wait, so a stuck holder can neither deadlock shutdown nor
/// pile up requests forever.
#[derive(Debug, Clone)]
pub struct SiteLock {
    inner: Arc<RwLock<()>>,
    wait: Duration,
}

impl SiteLock {
    /// Creates a lock that waits at most `wait` for acquisition.
    pub fn new(wait: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(())),
            wait,
        }
    }

    /// Acquires the lock in shared mode.
    pub async fn read(&self, signal: &ShutdownSignal) -> Result<TreeReadGuard, SiteError> {
        let lock = Arc::clone(&self.inner);
        self.acquire(lock.read_owned(), signal).await
    }

    /// Acquires the lock in exclusive mode.
    pub async fn write(&self, signal: &ShutdownSignal) -> Result<TreeWriteGuard, SiteError> {
        let lock = Arc::clone(&self.inner);
        self.acquire(lock.write_owned(), signal).await
    }

    async fn acquire<G>(
        &self,
        guard: impl Future<Output = G>,
        signal: &ShutdownSignal,
    ) -> Result<G, SiteError> {
        let mut signal = signal.clone();

        tokio::select! {
            acquired = tokio::time::timeout(self.wait, guard) => {
                acquired.map_err(|_| SiteError::Timeout { seconds: self.wait.as_secs() })
            }
            _ = signal.cancelled() => Err(SiteError::Cancelled),
        }
    }
}
