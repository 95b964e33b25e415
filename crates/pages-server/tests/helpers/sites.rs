//! Fixtures: sites backed by in-process Git remotes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use pages_git::testing::FakeGitClient;
use pages_git::{ContentSource, Registry, Shutdown, SiteConfig};
use pages_server::{AppState, create_private_router, create_router};
use tempfile::TempDir;

use super::TestClient;

pub const ADMIN_PREFIX: &str = "/_admin";

/// A loaded registry whose sites each have their own fake remote.
pub struct TestSites {
    dir: TempDir,
    shutdown: Shutdown,
    remotes: HashMap<String, Arc<FakeGitClient>>,
    registry: Arc<Registry>,
}

impl TestSites {
    /// Publishes `files` on one remote per domain and loads every site.
    pub async fn new(sites: &[(&str, &[(&str, &str)])]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = Shutdown::new();
        let mut remotes = HashMap::new();
        let mut sources = Vec::new();

        for (i, (domain, files)) in sites.iter().enumerate() {
            let remote = FakeGitClient::new();
            for (path, content) in files.iter() {
                remote.publish(path, *content);
            }

            let config = SiteConfig::builder()
                .url(format!("https://git.example.com/{}.git", i))
                .sync_interval(Duration::ZERO)
                .build()
                .unwrap();

            let source = ContentSource::new(
                *domain,
                config,
                dir.path().join(format!("site-{}", i)),
                remote.clone(),
                Duration::from_secs(5),
            );
            source.load(&shutdown.signal()).await.unwrap();

            remotes.insert(domain.to_string(), remote);
            sources.push(Arc::new(source));
        }

        Self {
            dir,
            shutdown,
            remotes,
            registry: Arc::new(Registry::from_sources(sources)),
        }
    }

    /// A single wildcard site serving `files`.
    pub async fn wildcard(files: &[(&str, &str)]) -> Self {
        Self::new(&[("*", files)]).await
    }

    /// Returns the fake remote of `domain`.
    pub fn remote(&self, domain: &str) -> &Arc<FakeGitClient> {
        &self.remotes[domain]
    }

    /// Returns the working tree directory of `domain`.
    pub fn local_path(&self, domain: &str) -> PathBuf {
        self.registry
            .get(domain)
            .map(|s| s.local_path().to_path_buf())
            .unwrap()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn state(&self) -> AppState {
        AppState::new(Arc::clone(&self.registry), self.shutdown.signal())
    }

    /// Public router with the default admin prefix.
    pub fn router(&self) -> Router {
        create_router(self.state(), ADMIN_PREFIX)
    }

    /// Private router with a recorder that is not installed globally.
    pub fn private_router(&self) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_private_router(self.state(), handle)
    }

    pub fn client(&self) -> TestClient {
        TestClient::new(self.router())
    }

    pub fn private_client(&self) -> TestClient {
        TestClient::new(self.private_router())
    }

    pub fn temp_dir(&self) -> &TempDir {
        &self.dir
    }
}
