//! Pages binary: hosts static sites synchronized from Git.

use std::sync::Arc;

use anyhow::Context;
use pages_git::{GixClient, Registry, Shutdown, SyncScheduler};
use pages_server::{
    AppState, Settings, create_private_router, create_router, metrics::init_metrics, run_servers,
    shutdown_signal,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load configuration")?;
    let sites = settings.sites().context("failed to load site configuration")?;

    tracing::info!("Starting pages v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Working trees: {}", settings.workdir.display());

    let prometheus_handle = init_metrics().context("failed to initialize metrics")?;

    let shutdown = Shutdown::new();

    // Every site must clone before anything is served
    let registry = Registry::load(
        sites,
        &settings.registry_options(),
        Arc::new(GixClient::new()),
        &shutdown.signal(),
    )
    .await
    .context("failed to load sites")?;
    let registry = Arc::new(registry);

    tracing::info!("Loaded {} site(s)", registry.len());

    let scheduler = SyncScheduler::new(Arc::clone(&registry), settings.scheduler_config())
        .start(shutdown.signal());

    let state = AppState::new(registry, shutdown.signal());
    let public = create_router(state.clone(), settings.admin_prefix());
    let private = create_private_router(state, prometheus_handle);

    let mut servers = tokio::spawn(run_servers(
        settings.public.address,
        public,
        settings.private.address,
        private,
        shutdown.signal(),
    ));

    let served = tokio::select! {
        _ = shutdown_signal() => None,
        result = &mut servers => Some(result),
    };

    shutdown.trigger();

    let grace = settings.scheduler_config().shutdown_grace;
    let served = match served {
        Some(result) => result,
        None => match tokio::time::timeout(grace, servers).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Connections still open after {:?}, exiting", grace);
                Ok(Ok(()))
            },
        },
    };

    scheduler.join().await;
    tracing::info!("Shutdown complete");

    served.context("server task panicked")??;
    Ok(())
}
