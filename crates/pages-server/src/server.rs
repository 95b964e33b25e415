use std::net::SocketAddr;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use pages_git::ShutdownSignal;
use tower::ServiceBuilder;

use crate::handlers::{
    content::serve_content, health::health_check, metrics::metrics_handler, sites::list_sites,
    sync::trigger_sync,
};
use crate::metrics::http::http_metrics_middleware;
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::resolve::resolve_site;
use crate::state::AppState;

/// Creates the public router: site content plus the admin routes under
/// `admin_prefix`.
pub fn create_router(state: AppState, admin_prefix: &str) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    let admin_router = Router::new()
        .route("/sync", post(trigger_sync))
        .route("/sites", get(list_sites));

    // GET routes answer HEAD as well
    Router::new()
        .nest(admin_prefix, admin_router)
        .route("/", get(serve_content))
        .route("/{*path}", get(serve_content))
        .layer(middleware::from_fn_with_state(
            state.resolver().clone(),
            resolve_site,
        ))
        .with_state(state)
        // HTTP metrics middleware
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware_stack)
}

/// Creates the private router: health and Prometheus metrics.
pub fn create_private_router(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    // Router for metrics endpoint (different state)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware_stack)
}

/// Serves both routers until `signal` fires, then drains open connections.
pub async fn run_servers(
    public_addr: SocketAddr,
    public: Router,
    private_addr: SocketAddr,
    private: Router,
    signal: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let public_listener = tokio::net::TcpListener::bind(public_addr).await?;
    let private_listener = tokio::net::TcpListener::bind(private_addr).await?;

    tracing::info!(
        public = %public_listener.local_addr()?,
        private = %private_listener.local_addr()?,
        "Serving"
    );

    let public_signal = signal.clone();
    let public_server = axum::serve(public_listener, public)
        .with_graceful_shutdown(async move { wait_for(public_signal).await });

    let private_server = axum::serve(private_listener, private)
        .with_graceful_shutdown(async move { wait_for(signal).await });

    tokio::try_join!(
        async { public_server.await },
        async { private_server.await }
    )?;

    Ok(())
}

async fn wait_for(mut signal: ShutdownSignal) {
    signal.cancelled().await;
}

/// Completes on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
