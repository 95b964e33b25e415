//! Site configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RefSelector;
use crate::error::SiteError;

/// Configuration for a single hosted site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// The Git repository URL (HTTPS or file).
    url: String,

    /// The branch to clone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,

    /// The tag to clone. Takes priority over `branch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,

    /// Username for authentication (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,

    /// Password or token for authentication (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,

    /// Interval between periodic syncs. Zero disables periodic sync.
    #[serde(default = "default_sync_interval", with = "duration_secs")]
    sync_interval: Duration,

    /// Clone timeout duration.
    #[serde(default = "default_clone_timeout", with = "duration_secs")]
    clone_timeout: Duration,

    /// Fetch timeout duration.
    #[serde(default = "default_fetch_timeout", with = "duration_secs")]
    fetch_timeout: Duration,
}

fn default_sync_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_clone_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

impl SiteConfig {
    /// Creates a new builder for SiteConfig.
    pub fn builder() -> SiteConfigBuilder {
        SiteConfigBuilder::default()
    }

    /// Returns the repository URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the configured branch.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Returns the configured tag.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns the effective ref selector.
    pub fn selector(&self) -> RefSelector {
        RefSelector::from_parts(self.branch(), self.tag())
    }

    /// Returns the username for authentication.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the password/token for authentication.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns the basic auth pair, only when both halves are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username(), self.password()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Returns the periodic sync interval.
    pub fn sync_interval(&self) -> Duration {
        self.sync_interval
    }

    /// Returns true if the site should be refreshed on a schedule.
    pub fn periodic_sync(&self) -> bool {
        !self.sync_interval.is_zero()
    }

    /// Returns the clone timeout.
    pub fn clone_timeout(&self) -> Duration {
        self.clone_timeout
    }

    /// Returns the fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Checks the configuration for values that can never clone.
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.url.trim().is_empty() {
            return Err(SiteError::invalid("url is required"));
        }

        self.selector()
            .validate()
            .map_err(|e| SiteError::invalid(format!("{}: {}", self.selector(), e)))
    }
}

/// Builder for SiteConfig.
#[derive(Debug, Default)]
pub struct SiteConfigBuilder {
    url: Option<String>,
    branch: Option<String>,
    tag: Option<String>,
    username: Option<String>,
    password: Option<String>,
    sync_interval: Option<Duration>,
    clone_timeout: Option<Duration>,
    fetch_timeout: Option<Duration>,
}

impl SiteConfigBuilder {
    /// Sets the Git repository URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the branch to track.
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the tag to track.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets basic authentication credentials.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the periodic sync interval.
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Sets the clone timeout.
    pub fn clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = Some(timeout);
        self
    }

    /// Sets the fetch timeout.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the url is missing or the ref name is invalid.
    pub fn build(self) -> Result<SiteConfig, SiteError> {
        let url = self.url.ok_or_else(|| SiteError::invalid("url is required"))?;

        let config = SiteConfig {
            url,
            branch: self.branch,
            tag: self.tag,
            username: self.username,
            password: self.password,
            sync_interval: self.sync_interval.unwrap_or_else(default_sync_interval),
            clone_timeout: self.clone_timeout.unwrap_or_else(default_clone_timeout),
            fetch_timeout: self.fetch_timeout.unwrap_or_else(default_fetch_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let config = SiteConfig::builder()
            .url("https://github.com/org/site.git")
            .build()
            .unwrap();

        assert_eq!(config.url(), "https://github.com/org/site.git");
        assert_eq!(config.selector(), RefSelector::Default);
        assert_eq!(config.sync_interval(), Duration::from_secs(300));
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_builder_full() {
        let config = SiteConfig::builder()
            .url("https://github.com/org/site.git")
            .branch("gh-pages")
            .sync_interval(Duration::from_secs(60))
            .clone_timeout(Duration::from_secs(60))
            .fetch_timeout(Duration::from_secs(15))
            .basic_auth("user", "token")
            .build()
            .unwrap();

        assert_eq!(config.selector(), RefSelector::branch("gh-pages"));
        assert_eq!(config.sync_interval(), Duration::from_secs(60));
        assert_eq!(config.clone_timeout(), Duration::from_secs(60));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.credentials(), Some(("user", "token")));
    }

    #[test]
    fn test_builder_missing_url() {
        let result = SiteConfig::builder().branch("main").build();

        assert!(matches!(result, Err(SiteError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_bad_ref() {
        let result = SiteConfig::builder()
            .url("https://github.com/org/site.git")
            .tag("v1..2")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let config: SiteConfig =
            serde_json::from_str(r#"{"url": "https://example.com/a.git", "username": "bot"}"#)
                .unwrap();

        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SiteConfig = serde_json::from_str(
            r#"{"url": "https://example.com/a.git", "tag": "v2", "sync_interval": 0}"#,
        )
        .unwrap();

        assert_eq!(config.selector(), RefSelector::tag("v2"));
        assert!(!config.periodic_sync());
        assert_eq!(config.clone_timeout(), Duration::from_secs(120));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }
}

mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
