//! The set of hosted sites, keyed by domain.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::SiteError;
use crate::repository::{GitClient, SiteConfig};
use crate::source::ContentSource;
use crate::sync::ShutdownSignal;

/// Domain key of the site that serves every hostname.
pub const WILDCARD: &str = "*";

/// Options shared by every site of a registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Directory the working trees are cloned under.
    pub workdir: PathBuf,
    /// Maximum wait for a site lock.
    pub lock_wait: Duration,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            workdir: std::env::temp_dir().join("pages"),
            lock_wait: Duration::from_secs(10),
        }
    }
}

/// Loaded content sources, read-only once built.
#[derive(Debug, Default)]
pub struct Registry {
    sites: HashMap<String, Arc<ContentSource>>,
}

impl Registry {
    /// Clones every configured site.
    ///
    /// Any failure aborts the whole registry: there is no partially
    /// available set of sites.
    pub async fn load(
        sites: BTreeMap<String, SiteConfig>,
        options: &RegistryOptions,
        client: Arc<dyn GitClient>,
        signal: &ShutdownSignal,
    ) -> Result<Self, SiteError> {
        if sites.is_empty() {
            return Err(SiteError::invalid("no sites configured"));
        }

        let mut registry = Self::default();

        for (domain, config) in sites {
            config.validate()?;

            info!(
                domain = %domain,
                branch = config.branch().unwrap_or_default(),
                tag = config.tag().unwrap_or_default(),
                sync_interval = ?config.sync_interval(),
                "Loading site"
            );

            let source = ContentSource::new(
                domain.clone(),
                config,
                options.workdir.join(dir_name(&domain)),
                Arc::clone(&client),
                options.lock_wait,
            );
            source.load(signal).await?;

            registry.sites.insert(domain, Arc::new(source));
        }

        Ok(registry)
    }

    /// Builds a registry from already loaded sources.
    pub fn from_sources(sources: impl IntoIterator<Item = Arc<ContentSource>>) -> Self {
        Self {
            sites: sources
                .into_iter()
                .map(|s| (s.domain().to_string(), s))
                .collect(),
        }
    }

    /// Returns the source registered for `domain`.
    pub fn get(&self, domain: &str) -> Option<&Arc<ContentSource>> {
        self.sites.get(domain)
    }

    /// Returns the wildcard source when it is the only site.
    pub fn single_wildcard(&self) -> Option<&Arc<ContentSource>> {
        if self.sites.len() == 1 {
            self.sites.get(WILDCARD)
        } else {
            None
        }
    }

    /// Returns the wildcard source, if one is registered.
    pub fn wildcard(&self) -> Option<&Arc<ContentSource>> {
        self.sites.get(WILDCARD)
    }

    /// Returns the number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if no site is registered.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Iterates over `(domain, source)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ContentSource>)> {
        self.sites.iter().map(|(d, s)| (d.as_str(), s))
    }
}

/// Maps a domain to a directory name that is safe on any filesystem.
fn dir_name(domain: &str) -> String {
    if domain == WILDCARD {
        return "_wildcard".to_string();
    }

    domain
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
