//! Site configuration and Git repository operations.

mod client;
mod config;
mod git_ops;
mod refs;

pub use client::{FetchOutcome, GitClient};
pub use config::{SiteConfig, SiteConfigBuilder};
pub use git_ops::GixClient;
pub(crate) use git_ops::short;
pub use refs::RefSelector;
