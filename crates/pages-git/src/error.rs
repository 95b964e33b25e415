//! Error types for content sources.

/// Errors that can occur while loading, syncing or reading a site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A Git operation failed.
    #[error("git error: {0}")]
    Git(String),

    /// Invalid site configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The site has not completed its initial load.
    #[error("site {0} has not been loaded")]
    NotLoaded(String),

    /// No site is registered under the given domain.
    #[error("unknown site: {0}")]
    UnknownSite(String),

    /// The site is not available right now.
    #[error("source unavailable: {reason}")]
    Unavailable { reason: String },

    /// A timeout occurred while waiting for an operation.
    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The operation was abandoned because the endpoint is shutting down.
    #[error("operation cancelled")]
    Cancelled,
}

impl SiteError {
    /// Creates a new Git error.
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a new source unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Timeout { .. } | Self::Git(_)
        )
    }
}
