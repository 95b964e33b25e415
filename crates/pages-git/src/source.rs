//! Git-backed content source for a single site.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::error::SiteError;
use crate::repository::{FetchOutcome, GitClient, SiteConfig, short};
use crate::sync::{ShutdownSignal, SiteLock, SyncState, TreeReadGuard};
use crate::tree::{FileBridge, FileTree, OsTree};

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The working tree changed.
    Updated { commit: String },
    /// The working tree was already current.
    Unchanged { commit: String },
}

impl SyncOutcome {
    /// Returns the commit now being served.
    pub fn commit(&self) -> &str {
        match self {
            Self::Updated { commit } | Self::Unchanged { commit } => commit,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Unchanged { .. } => "unchanged",
        }
    }
}

/// Owns one site's clone and keeps it fresh.
///
/// [`load`](Self::load) must complete before the tree is readable or a
/// [`sync`](Self::sync) can run. Syncs of the same source are serialized;
/// readers and the mutating step of a sync are coordinated through the
/// site lock.
pub struct ContentSource {
    domain: String,
    config: SiteConfig,
    local_path: PathBuf,
    client: Arc<dyn GitClient>,
    tree: Arc<dyn FileTree>,
    state: SyncState,
    lock: SiteLock,
    sync_gate: tokio::sync::Mutex<()>,
    load_started: AtomicBool,
}

impl ContentSource {
    /// Creates a source that clones into `local_path`.
    pub fn new(
        domain: impl Into<String>,
        config: SiteConfig,
        local_path: impl Into<PathBuf>,
        client: Arc<dyn GitClient>,
        lock_wait: Duration,
    ) -> Self {
        let local_path = local_path.into();

        Self {
            domain: domain.into(),
            config,
            tree: Arc::new(OsTree::new(local_path.clone())),
            local_path,
            client,
            state: SyncState::new(),
            lock: SiteLock::new(lock_wait),
            sync_gate: tokio::sync::Mutex::new(()),
            load_started: AtomicBool::new(false),
        }
    }

    /// Returns the domain this source serves.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the site configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Returns the directory of the working tree.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Returns the sync state.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Performs the initial clone. Can only be called once.
    pub async fn load(&self, signal: &ShutdownSignal) -> Result<String, SiteError> {
        if self.load_started.swap(true, Ordering::SeqCst) {
            return Err(SiteError::unavailable(format!(
                "site {} is already loaded",
                self.domain
            )));
        }

        info!(domain = %self.domain, url = self.config.url(), "Cloning site");

        let mut cancel = signal.clone();
        let result = tokio::select! {
            result = self.client.clone_repo(&self.config, &self.local_path) => result,
            _ = cancel.cancelled() => Err(SiteError::Cancelled),
        };

        match result {
            Ok(commit) => {
                self.state.record_success(&commit);
                info!(domain = %self.domain, "Site loaded at commit {}", short(&commit));
                Ok(commit)
            },
            Err(e) => {
                self.state.record_failure(e.to_string());
                Err(e)
            },
        }
    }

    /// Brings the working tree up to date with the configured ref.
    ///
    /// Failures are recorded and logged; the tree keeps serving its last
    /// good state.
    pub async fn sync(&self, signal: &ShutdownSignal) -> Result<SyncOutcome, SiteError> {
        if !self.state.is_loaded() {
            return Err(SiteError::NotLoaded(self.domain.clone()));
        }

        let mut cancel = signal.clone();
        let _gate = tokio::select! {
            gate = self.sync_gate.lock() => gate,
            _ = cancel.cancelled() => return Err(SiteError::Cancelled),
        };

        info!(domain = %self.domain, url = self.config.url(), "Synchronizing site");

        let start = Instant::now();
        self.state.begin();

        let result = self.pull(signal).await;

        histogram!("pages_sync_duration_seconds", "domain" => self.domain.clone())
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                self.state.record_success(outcome.commit());
                counter!(
                    "pages_sync_total",
                    "domain" => self.domain.clone(),
                    "outcome" => outcome.label()
                )
                .increment(1);

                match outcome {
                    SyncOutcome::Updated { commit } => {
                        info!(domain = %self.domain, "Site updated to commit {}", short(commit))
                    },
                    SyncOutcome::Unchanged { .. } => {
                        debug!(domain = %self.domain, "Site already up to date")
                    },
                }
            },
            Err(e) => {
                self.state.record_failure(e.to_string());
                counter!(
                    "pages_sync_total",
                    "domain" => self.domain.clone(),
                    "outcome" => "failed"
                )
                .increment(1);
                warn!(domain = %self.domain, "Sync failed: {}", e);
            },
        }

        result
    }

    /// Fetches and, when the remote moved, swaps the new tree in.
    ///
    /// Cancellation is observed while fetching and while waiting for the
    /// write lock. Once the swap starts it runs to completion.
    async fn pull(&self, signal: &ShutdownSignal) -> Result<SyncOutcome, SiteError> {
        let mut cancel = signal.clone();
        let fetched = tokio::select! {
            fetched = self.client.fetch(&self.config, &self.local_path) => fetched?,
            _ = cancel.cancelled() => return Err(SiteError::Cancelled),
        };

        match fetched {
            FetchOutcome::UpToDate { commit } => Ok(SyncOutcome::Unchanged { commit }),
            FetchOutcome::Staged { commit } => {
                let _guard = self.lock.write(signal).await?;
                self.client.apply(&self.local_path).await?;
                Ok(SyncOutcome::Updated { commit })
            },
        }
    }

    /// Returns the working tree.
    pub fn tree(&self) -> Result<Arc<dyn FileTree>, SiteError> {
        if !self.state.is_loaded() {
            return Err(SiteError::NotLoaded(self.domain.clone()));
        }

        Ok(Arc::clone(&self.tree))
    }

    /// Returns a bridge over the working tree.
    pub fn bridge(&self) -> Result<FileBridge, SiteError> {
        Ok(FileBridge::new(self.tree()?))
    }

    /// Acquires the tree in shared mode for the duration of a read.
    pub async fn read_guard(&self, signal: &ShutdownSignal) -> Result<TreeReadGuard, SiteError> {
        self.lock.read(signal).await
    }
}

impl std::fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSource")
            .field("domain", &self.domain)
            .field("url", &self.config.url())
            .field("local_path", &self.local_path)
            .field("commit", &self.state.commit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Shutdown;
    use crate::testing::FakeGitClient;

    fn source(client: Arc<FakeGitClient>, dir: &Path) -> ContentSource {
        let config = SiteConfig::builder()
            .url("https://git.example.com/site.git")
            .build()
            .unwrap();

        ContentSource::new(
            "site.example",
            config,
            dir.join("site"),
            client,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_tree_requires_load() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(FakeGitClient::new(), dir.path());

        assert!(matches!(source.tree(), Err(SiteError::NotLoaded(_))));
        let shutdown = Shutdown::new();
        assert!(matches!(
            source.sync(&shutdown.signal()).await,
            Err(SiteError::NotLoaded(_))
        ));
    }

    #[tokio::test]
    async fn test_load_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeGitClient::new();
        client.publish("index.html", "<h1>v1</h1>");
        let source = source(client, dir.path());
        let shutdown = Shutdown::new();

        source.load(&shutdown.signal()).await.unwrap();

        let info = source.bridge().unwrap().stat("/index.html").unwrap();
        assert_eq!(info.size(), 11);
        assert!(source.state().is_healthy());
    }

    #[tokio::test]
    async fn test_load_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(FakeGitClient::new(), dir.path());
        let shutdown = Shutdown::new();

        source.load(&shutdown.signal()).await.unwrap();
        assert!(source.load(&shutdown.signal()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeGitClient::new();
        client.fail_clones();
        let source = source(client, dir.path());
        let shutdown = Shutdown::new();

        assert!(source.load(&shutdown.signal()).await.is_err());
        assert!(!source.state().is_loaded());
    }

    #[tokio::test]
    async fn test_sync_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeGitClient::new();
        client.publish("index.html", "v1");
        let source = source(client.clone(), dir.path());
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();

        source.load(&signal).await.unwrap();
        let outcome = source.sync(&signal).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Unchanged { .. }));

        client.publish("index.html", "version 2");
        let outcome = source.sync(&signal).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Updated { .. }));
        assert_eq!(source.state().commit().as_deref(), Some(outcome.commit()));

        let content = std::fs::read_to_string(source.local_path().join("index.html")).unwrap();
        assert_eq!(content, "version 2");
    }

    #[tokio::test]
    async fn test_failed_sync_keeps_last_good_tree() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeGitClient::new();
        client.publish("index.html", "v1");
        let source = source(client.clone(), dir.path());
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();

        let commit = source.load(&signal).await.unwrap();
        client.publish("index.html", "v2");
        client.fail_next_fetches(1);

        assert!(source.sync(&signal).await.is_err());
        assert_eq!(source.state().commit(), Some(commit));
        assert_eq!(source.state().failure_count(), 1);

        let content = std::fs::read_to_string(source.local_path().join("index.html")).unwrap();
        assert_eq!(content, "v1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_swap_keeps_tree() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeGitClient::new();
        client.publish("index.html", "v1");
        let source = Arc::new(source(client.clone(), dir.path()));
        let shutdown = Shutdown::new();

        source.load(&shutdown.signal()).await.unwrap();
        client.publish("index.html", "v2");
        client.set_apply_delay(Duration::from_millis(100));

        let syncing = Arc::clone(&source);
        let signal = shutdown.signal();
        let task = tokio::spawn(async move { syncing.sync(&signal).await });

        // Lands between removing the old tree and moving the new one in
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, SyncOutcome::Updated { .. }));

        let content = std::fs::read_to_string(source.local_path().join("index.html")).unwrap();
        assert_eq!(content, "v2");
    }

    #[tokio::test]
    async fn test_sync_waits_for_readers() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeGitClient::new();
        client.publish("index.html", "v1");
        let source = ContentSource::new(
            "site.example",
            SiteConfig::builder()
                .url("https://git.example.com/site.git")
                .build()
                .unwrap(),
            dir.path().join("site"),
            client.clone(),
            Duration::from_millis(50),
        );
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();

        source.load(&signal).await.unwrap();
        client.publish("index.html", "v2");

        let reader = source.read_guard(&signal).await.unwrap();
        let err = source.sync(&signal).await.unwrap_err();
        assert!(matches!(err, SiteError::Timeout { .. }));
        drop(reader);

        assert!(matches!(
            source.sync(&signal).await.unwrap(),
            SyncOutcome::Updated { .. }
        ));
    }
}
