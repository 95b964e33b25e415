//! Git operations using gix (pure Rust).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gix::remote::fetch::Shallow;
use tracing::{debug, info, warn};

use super::{FetchOutcome, GitClient, RefSelector, SiteConfig};
use crate::error::SiteError;

/// Identity recorded in the reflog entries gix writes when refs move.
/// Hosts running the server usually have no Git identity configured.
const CONFIG_OVERRIDES: [&str; 2] = ["committer.name=pages", "committer.email=pages@localhost"];

fn open_options() -> gix::open::Options {
    gix::open::Options::default().config_overrides(CONFIG_OVERRIDES)
}

/// [`GitClient`] backed by gix.
///
/// Clones are shallow (depth 1). New content found by a fetch is cloned into
/// a staging directory next to the working tree and renamed into place by
/// [`apply`](GitClient::apply).
#[derive(Debug, Default, Clone)]
pub struct GixClient;

impl GixClient {
    /// Creates a new client.
    pub fn new() -> Self {
        Self
    }

    /// Returns the directory new content is staged in for `dest`.
    pub fn staging_path(dest: &Path) -> PathBuf {
        Self::sibling(dest, "next")
    }

    fn sibling(dest: &Path, suffix: &str) -> PathBuf {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tree".to_string());
        dest.with_file_name(format!("{}.{}", name, suffix))
    }

    /// Runs a blocking gix operation on the blocking pool, interrupting it
    /// once `timeout` elapses.
    async fn run_blocking<T, F>(timeout: Duration, op: F) -> Result<T, SiteError>
    where
        T: Send + 'static,
        F: FnOnce(&AtomicBool) -> Result<T, SiteError> + Send + 'static,
    {
        let interrupt = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupt);

        let task = tokio::task::spawn_blocking(move || op(&flag));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined.map_err(|e| SiteError::git(format!("Git task failed: {}", e)))?,
            Err(_) => {
                interrupt.store(true, Ordering::SeqCst);
                Err(SiteError::Timeout {
                    seconds: timeout.as_secs(),
                })
            },
        }
    }

    /// Blocking clone operation using gix.
    fn clone_blocking(
        url: &str,
        selector: &RefSelector,
        local_path: &Path,
        interrupt: &AtomicBool,
    ) -> Result<String, SiteError> {
        // Working trees are scratch state, a leftover from a previous run is discarded
        if local_path.exists() {
            std::fs::remove_dir_all(local_path)?;
        }
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = gix::url::parse(url.into())
            .map_err(|e| SiteError::git(format!("Invalid URL: {}", e)))?;

        let mut prepare = gix::clone::PrepareFetch::new(
            url,
            local_path,
            gix::create::Kind::WithWorktree,
            gix::create::Options::default(),
            open_options(),
        )
        .map_err(|e| SiteError::git(format!("Failed to prepare clone: {}", e)))?;

        if let Some(full_ref) = selector.full_ref() {
            prepare = prepare
                .with_ref_name(Some(full_ref.as_str()))
                .map_err(|e| SiteError::git(format!("Invalid ref {}: {}", selector, e)))?;
        }

        let depth = std::num::NonZeroU32::new(1).ok_or_else(|| SiteError::git("invalid depth"))?;
        prepare = prepare.with_shallow(Shallow::DepthAtRemote(depth));

        let (mut checkout, _outcome) = prepare
            .fetch_then_checkout(gix::progress::Discard, interrupt)
            .map_err(|e| SiteError::git(format!("Clone failed: {}", e)))?;

        let (repo, _outcome) = checkout
            .main_worktree(gix::progress::Discard, interrupt)
            .map_err(|e| SiteError::git(format!("Checkout failed: {}", e)))?;

        let mut head = repo
            .head()
            .map_err(|e| SiteError::git(format!("Failed to get HEAD: {}", e)))?;
        let commit = head
            .peel_to_commit_in_place()
            .map_err(|e| SiteError::git(format!("Failed to peel HEAD: {}", e)))?;

        Ok(commit.id.to_string())
    }

    /// Blocking fetch operation using gix. Returns the current HEAD commit
    /// and the commit the configured ref points at after the fetch.
    fn fetch_blocking(
        local_path: &Path,
        selector: &RefSelector,
        interrupt: &AtomicBool,
    ) -> Result<(String, String), SiteError> {
        let repo = gix::open_opts(local_path, open_options())
            .map_err(|e| SiteError::git(format!("Failed to open repo: {}", e)))?;

        let mut remote = repo
            .find_default_remote(gix::remote::Direction::Fetch)
            .ok_or_else(|| SiteError::git("No default remote found"))?
            .map_err(|e| SiteError::git(format!("Failed to find remote: {}", e)))?;

        if let Some(refspec) = selector.fetch_refspec() {
            remote = remote
                .with_refspecs([refspec.as_str()], gix::remote::Direction::Fetch)
                .map_err(|e| SiteError::git(format!("Invalid refspec {}: {}", refspec, e)))?;
        }

        let depth = std::num::NonZeroU32::new(1).ok_or_else(|| SiteError::git("invalid depth"))?;

        remote
            .connect(gix::remote::Direction::Fetch)
            .map_err(|e| SiteError::git(format!("Failed to connect: {}", e)))?
            .prepare_fetch(gix::progress::Discard, Default::default())
            .map_err(|e| SiteError::git(format!("Failed to prepare fetch: {}", e)))?
            .with_shallow(Shallow::DepthAtRemote(depth))
            .receive(gix::progress::Discard, interrupt)
            .map_err(|e| SiteError::git(format!("Fetch failed: {}", e)))?;

        let head = {
            let mut head = repo
                .head()
                .map_err(|e| SiteError::git(format!("Failed to get HEAD: {}", e)))?;
            head.peel_to_commit_in_place()
                .map_err(|e| SiteError::git(format!("Failed to peel HEAD: {}", e)))?
                .id
                .to_string()
        };

        let tracking = selector.tracking_ref();
        let remote_id = repo
            .find_reference(tracking.as_str())
            .map_err(|_| SiteError::git(format!("Reference not found: {}", tracking)))?
            .into_fully_peeled_id()
            .map_err(|e| SiteError::git(format!("Failed to peel reference: {}", e)))?;

        Ok((head, remote_id.to_string()))
    }

    /// Renames the staged tree over `dest`, restoring the old tree if the
    /// second rename fails.
    fn swap(dest: &Path) -> Result<(), SiteError> {
        let staging = Self::staging_path(dest);
        let previous = Self::sibling(dest, "prev");

        if !staging.exists() {
            return Err(SiteError::git(format!("nothing staged for {:?}", dest)));
        }

        if previous.exists() {
            std::fs::remove_dir_all(&previous)?;
        }

        std::fs::rename(dest, &previous)?;
        if let Err(e) = std::fs::rename(&staging, dest) {
            warn!("Failed to move staged tree into place: {}", e);
            std::fs::rename(&previous, dest)?;
            return Err(e.into());
        }

        // Open files of the previous tree stay readable after removal
        if let Err(e) = std::fs::remove_dir_all(&previous) {
            warn!("Failed to remove previous tree {:?}: {}", previous, e);
        }

        Ok(())
    }

    /// Rebuilds a URL with basic auth credentials in its user info.
    fn authenticated_url(config: &SiteConfig) -> String {
        let Some((user, pass)) = config.credentials() else {
            return config.url().to_string();
        };

        match config.url().split_once("://") {
            Some((scheme, rest)) if scheme.starts_with("http") => format!(
                "{}://{}:{}@{}",
                scheme,
                encode_userinfo(user),
                encode_userinfo(pass),
                rest
            ),
            _ => config.url().to_string(),
        }
    }
}

fn encode_userinfo(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

#[async_trait]
impl GitClient for GixClient {
    async fn clone_repo(&self, config: &SiteConfig, dest: &Path) -> Result<String, SiteError> {
        let url = Self::authenticated_url(config);
        let selector = config.selector();
        let local_path = dest.to_path_buf();

        info!(url = config.url(), reference = %selector, "Cloning repository into {:?}", dest);

        let commit = Self::run_blocking(config.clone_timeout(), move |interrupt| {
            Self::clone_blocking(&url, &selector, &local_path, interrupt)
        })
        .await?;

        info!(url = config.url(), "Repository cloned at commit {}", short(&commit));
        Ok(commit)
    }

    async fn fetch(&self, config: &SiteConfig, dest: &Path) -> Result<FetchOutcome, SiteError> {
        let selector = config.selector();
        let local_path = dest.to_path_buf();

        debug!(url = config.url(), "Fetching updates for {:?}", dest);

        let fetch_selector = selector.clone();
        let (head, remote) = Self::run_blocking(config.fetch_timeout(), move |interrupt| {
            Self::fetch_blocking(&local_path, &fetch_selector, interrupt)
        })
        .await?;

        if head == remote {
            return Ok(FetchOutcome::UpToDate { commit: head });
        }

        debug!(
            url = config.url(),
            "Remote moved from {} to {}, staging new tree",
            short(&head),
            short(&remote)
        );

        let url = Self::authenticated_url(config);
        let staging = Self::staging_path(dest);
        let commit = Self::run_blocking(config.clone_timeout(), move |interrupt| {
            Self::clone_blocking(&url, &selector, &staging, interrupt)
        })
        .await?;

        Ok(FetchOutcome::Staged { commit })
    }

    async fn apply(&self, dest: &Path) -> Result<(), SiteError> {
        let dest = dest.to_path_buf();

        // Blocking tasks outlive a dropped caller, so a started swap always
        // finishes
        tokio::task::spawn_blocking(move || Self::swap(&dest))
            .await
            .map_err(|e| SiteError::git(format!("Swap task failed: {}", e)))?
    }
}

/// Shortens a commit id for log output.
pub(crate) fn short(commit: &str) -> &str {
    &commit[..8.min(commit.len())]
}
