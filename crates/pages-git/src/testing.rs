//! In-process [`GitClient`] for tests.
//!
//! The "remote" is a map of files plus a revision counter bumped by every
//! [`publish`](FakeGitClient::publish). Clones and staged trees are written
//! to disk so the regular [`OsTree`](crate::tree::OsTree) reads them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::SiteError;
use crate::repository::{FetchOutcome, GitClient, SiteConfig};

const REVISION_FILE: &str = ".git/revision";

/// Scriptable stand-in for a Git remote.
#[derive(Debug, Default)]
pub struct FakeGitClient {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    revision: AtomicUsize,
    failing_fetches: AtomicUsize,
    failing_clones: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    apply_delay: Mutex<Option<Duration>>,
    clones: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeGitClient {
    /// Creates an empty remote.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Writes `content` at `path` on the remote and bumps its revision.
    pub fn publish(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .insert(path.trim_start_matches('/').to_string(), content.into());
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Makes the next `n` fetches fail.
    pub fn fail_next_fetches(&self, n: usize) {
        self.failing_fetches.store(n, Ordering::SeqCst);
    }

    /// Makes every clone fail.
    pub fn fail_clones(&self) {
        self.failing_clones.store(true, Ordering::SeqCst);
    }

    /// Delays every fetch by `delay`, simulating a slow network.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Pauses every apply by `delay` after the old tree is gone and before
    /// the new one is in place.
    pub fn set_apply_delay(&self, delay: Duration) {
        *self.apply_delay.lock() = Some(delay);
    }

    /// Returns the number of clones performed.
    pub fn clones(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    /// Returns the number of fetches attempted.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Returns the commit id of the current remote revision.
    pub fn head(&self) -> String {
        commit_id(self.revision.load(Ordering::SeqCst))
    }

    fn staging(dest: &Path) -> PathBuf {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        dest.with_file_name(format!("{}.next", name))
    }

    fn materialize(&self, dest: &Path) -> Result<String, SiteError> {
        if dest.exists() {
            std::fs::remove_dir_all(dest)?;
        }

        let revision = self.revision.load(Ordering::SeqCst);
        let files = self.files.lock().clone();

        for (path, content) in files {
            let full = dest.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full, content)?;
        }

        let marker = dest.join(REVISION_FILE);
        if let Some(parent) = marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(marker, revision.to_string())?;

        Ok(commit_id(revision))
    }
}

fn commit_id(revision: usize) -> String {
    format!("{:040x}", revision)
}

#[async_trait]
impl GitClient for FakeGitClient {
    async fn clone_repo(&self, _config: &SiteConfig, dest: &Path) -> Result<String, SiteError> {
        self.clones.fetch_add(1, Ordering::SeqCst);

        if self.failing_clones.load(Ordering::SeqCst) {
            return Err(SiteError::git("clone refused by fake remote"));
        }

        self.materialize(dest)
    }

    async fn fetch(&self, _config: &SiteConfig, dest: &Path) -> Result<FetchOutcome, SiteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self.failing_fetches.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_fetches.store(failing - 1, Ordering::SeqCst);
            return Err(SiteError::git("fetch refused by fake remote"));
        }

        let served = std::fs::read_to_string(dest.join(REVISION_FILE))?;
        let remote = self.revision.load(Ordering::SeqCst);

        if served.trim() == remote.to_string() {
            return Ok(FetchOutcome::UpToDate {
                commit: commit_id(remote),
            });
        }

        let commit = self.materialize(&Self::staging(dest))?;
        Ok(FetchOutcome::Staged { commit })
    }

    async fn apply(&self, dest: &Path) -> Result<(), SiteError> {
        let staging = Self::staging(dest);

        if dest.exists() {
            std::fs::remove_dir_all(dest)?;
        }

        let delay = *self.apply_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        std::fs::rename(staging, dest)?;

        Ok(())
    }
}
