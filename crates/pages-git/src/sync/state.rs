//! Per-site sync outcome tracking.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::Serialize;

/// Point-in-time view of a site's sync history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Commit currently served.
    pub commit: Option<String>,
    /// Unix seconds of the last successful load or sync.
    pub last_success: Option<u64>,
    /// Unix seconds of the last attempt, successful or not.
    pub last_attempt: Option<u64>,
    /// Message of the last failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Number of consecutive failures.
    pub failure_count: u32,
    /// True while a sync is running.
    pub syncing: bool,
}

#[derive(Debug, Default)]
struct Inner {
    commit: Option<String>,
    last_success: Option<(Instant, SystemTime)>,
    last_attempt: Option<SystemTime>,
    last_error: Option<String>,
    failure_count: u32,
    syncing: bool,
}

/// Tracks the outcome of loads and syncs for one site.
#[derive(Debug, Default)]
pub struct SyncState {
    inner: RwLock<Inner>,
}

impl SyncState {
    /// Creates a new SyncState.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current commit SHA.
    pub fn commit(&self) -> Option<String> {
        self.inner.read().commit.clone()
    }

    /// Returns the duration since the last successful sync.
    pub fn time_since_success(&self) -> Option<Duration> {
        self.inner.read().last_success.map(|(at, _)| at.elapsed())
    }

    /// Marks the start of a sync.
    pub fn begin(&self) {
        let mut inner = self.inner.write();
        inner.syncing = true;
        inner.last_attempt = Some(SystemTime::now());
    }

    /// Records a successful load or sync.
    pub fn record_success(&self, commit: impl Into<String>) {
        let mut inner = self.inner.write();

        inner.commit = Some(commit.into());
        inner.last_success = Some((Instant::now(), SystemTime::now()));
        inner.last_error = None;
        inner.failure_count = 0;
        inner.syncing = false;
    }

    /// Records a failed load or sync.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut inner = self.inner.write();

        inner.last_error = Some(error.into());
        inner.failure_count += 1;
        inner.syncing = false;
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    /// Returns the number of consecutive failures.
    pub fn failure_count(&self) -> u32 {
        self.inner.read().failure_count
    }

    /// Returns true while a sync is running.
    pub fn is_syncing(&self) -> bool {
        self.inner.read().syncing
    }

    /// Returns true once the site has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().commit.is_some()
    }

    /// Returns true if the site is loaded and the last sync succeeded.
    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.read();
        inner.commit.is_some() && inner.last_error.is_none()
    }

    /// Returns a serializable snapshot.
    pub fn status(&self) -> SyncStatus {
        let inner = self.inner.read();

        SyncStatus {
            commit: inner.commit.clone(),
            last_success: inner.last_success.map(|(_, at)| unix_secs(at)),
            last_attempt: inner.last_attempt.map(unix_secs),
            last_error: inner.last_error.clone(),
            failure_count: inner.failure_count,
            syncing: inner.syncing,
        }
    }
}

fn unix_secs(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
