//! The Git capability consumed by content sources.

use std::path::Path;

use async_trait::async_trait;

use super::SiteConfig;
use crate::error::SiteError;

/// Result of checking the remote for new content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The working tree already matches the configured ref.
    UpToDate { commit: String },
    /// New content has been prepared and is waiting for [`GitClient::apply`].
    Staged { commit: String },
}

impl FetchOutcome {
    /// Returns the commit the outcome refers to.
    pub fn commit(&self) -> &str {
        match self {
            Self::UpToDate { commit } | Self::Staged { commit } => commit,
        }
    }
}

/// Clone and pull operations against a remote repository.
///
/// A pull is split in two: [`fetch`](GitClient::fetch) performs all network
/// I/O without touching the files being served, [`apply`](GitClient::apply)
/// mutates the working tree. Callers hold the site lock exclusively only
/// around `apply`.
#[async_trait]
pub trait GitClient: Send + Sync {
    /// Clones the configured ref into `dest` and returns the checked out commit.
    async fn clone_repo(&self, config: &SiteConfig, dest: &Path) -> Result<String, SiteError>;

    /// Fetches the configured ref for the clone at `dest`.
    async fn fetch(&self, config: &SiteConfig, dest: &Path) -> Result<FetchOutcome, SiteError>;

    /// Moves content staged by a previous fetch into the working tree at `dest`.
    async fn apply(&self, dest: &Path) -> Result<(), SiteError>;
}
