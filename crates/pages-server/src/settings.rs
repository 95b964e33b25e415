//! Process configuration.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional file named by `PAGES_CONFIG`, then `PAGES_*` environment
//! variables (`__` separates nested keys, e.g. `PAGES_SYNC__MAX_CONCURRENT`).

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use pages_git::{RegistryOptions, SchedulerConfig, SiteConfig, WILDCARD};
use serde::Deserialize;

/// Environment variable naming the optional configuration file.
pub const CONFIG_FILE_ENV: &str = "PAGES_CONFIG";

/// Complete process configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub public: BindSettings,
    pub private: BindSettings,
    pub admin: AdminSettings,
    pub workdir: PathBuf,
    pub sync: SyncSettings,
    /// Single site served for every hostname when no site file is given.
    #[serde(default)]
    pub git: Option<SiteConfig>,
    /// File holding a `sites` map of domain to site configuration.
    #[serde(default)]
    pub site_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BindSettings {
    pub address: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    pub prefix: String,
}

/// Scheduler and lock tuning, durations in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub max_concurrent: usize,
    pub shutdown_grace: u64,
    pub lock_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct SiteFile {
    sites: BTreeMap<String, SiteConfig>,
}

impl Settings {
    /// Loads settings from the file named by `PAGES_CONFIG`, if any, and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(file.as_deref(), Environment::with_prefix("PAGES"))
    }

    /// Loads settings from an explicit file and environment source.
    pub fn load_from(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let workdir = std::env::temp_dir().join("pages");

        let mut builder = Config::builder()
            .set_default("public.address", "0.0.0.0:8080")?
            .set_default("private.address", "0.0.0.0:8081")?
            .set_default("admin.prefix", "/_admin")?
            .set_default("workdir", workdir.to_string_lossy().into_owned())?
            .set_default("sync.max_concurrent", 4)?
            .set_default("sync.shutdown_grace", 30)?
            .set_default("sync.lock_timeout", 10)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let settings: Self = builder
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.admin.prefix.starts_with('/') || self.admin.prefix.len() < 2 {
            return Err(ConfigError::Message(format!(
                "admin.prefix must be an absolute path, got {:?}",
                self.admin.prefix
            )));
        }

        if self.sync.max_concurrent == 0 {
            return Err(ConfigError::Message(
                "sync.max_concurrent must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the admin prefix without a trailing slash.
    pub fn admin_prefix(&self) -> &str {
        self.admin.prefix.trim_end_matches('/')
    }

    /// Resolves the configured sites.
    ///
    /// A site file takes precedence; otherwise the single `git` configuration
    /// is registered under the wildcard domain.
    pub fn sites(&self) -> Result<BTreeMap<String, SiteConfig>, ConfigError> {
        if let Some(path) = &self.site_file {
            let file: SiteFile = Config::builder()
                .add_source(File::from(path.as_path()))
                .build()?
                .try_deserialize()?;

            return Ok(file
                .sites
                .into_iter()
                .map(|(domain, site)| (domain.to_ascii_lowercase(), site))
                .collect());
        }

        match &self.git {
            Some(site) => Ok(BTreeMap::from([(WILDCARD.to_string(), site.clone())])),
            None => Err(ConfigError::Message(
                "either git.url or site_file must be configured".to_string(),
            )),
        }
    }

    /// Options for building the site registry.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            workdir: self.workdir.clone(),
            lock_wait: Duration::from_secs(self.sync.lock_timeout),
        }
    }

    /// Options for the sync scheduler.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            max_concurrent: self.sync.max_concurrent,
            shutdown_grace: Duration::from_secs(self.sync.shutdown_grace),
        }
    }
}
