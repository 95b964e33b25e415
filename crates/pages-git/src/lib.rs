//! # Pages Git
//!
//! Git-backed content sources for the pages static hosting endpoint.
//!
//! This crate clones one repository per hosted site, keeps each working
//! tree current on a schedule and exposes the tree as a read-only,
//! lazily opened file hierarchy.
//!
//! ## Features
//!
//! - Pure Rust Git operations via `gix`, shallow and ref-pinned
//! - Network fetches staged outside the site lock, applied atomically
//! - Per-site sync intervals with bounded concurrency
//! - Cancellable readers/writer coordination and graceful shutdown
//!
//! ## Example
//!
//! ```ignore
//! use pages_git::{GixClient, Registry, RegistryOptions, SiteConfig, Shutdown};
//!
//! let site = SiteConfig::builder()
//!     .url("https://github.com/org/site.git")
//!     .branch("gh-pages")
//!     .build()?;
//!
//! let shutdown = Shutdown::new();
//! let registry = Registry::load(
//!     [("*".to_string(), site)].into(),
//!     &RegistryOptions::default(),
//!     Arc::new(GixClient::new()),
//!     &shutdown.signal(),
//! )
//! .await?;
//! ```

pub mod error;
pub mod registry;
pub mod repository;
pub mod source;
pub mod sync;
pub mod tree;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use error::SiteError;
pub use registry::{Registry, RegistryOptions, WILDCARD};
pub use repository::{FetchOutcome, GitClient, GixClient, RefSelector, SiteConfig, SiteConfigBuilder};
pub use source::{ContentSource, SyncOutcome};
pub use sync::{
    SchedulerConfig, SchedulerHandle, Shutdown, ShutdownSignal, SiteLock, SyncScheduler,
    SyncState, SyncStatus, SyncTrigger, TreeReadGuard,
};
pub use tree::{FileBridge, FileInfo, FileTree, LazyFile, OsTree, ReadSeek};
