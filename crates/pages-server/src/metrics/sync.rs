//! Sync metric descriptions. Values are recorded by `pages-git`.

use metrics::Unit;

/// Registra las metricas de sincronizacion de sitios.
pub fn register_sync_metrics() {
    metrics::describe_counter!(
        "pages_sync_total",
        "Site syncs by domain and outcome (updated, unchanged, failed)"
    );
    metrics::describe_histogram!(
        "pages_sync_duration_seconds",
        Unit::Seconds,
        "Duration of site syncs in seconds"
    );
}
