//! Metrics setup and initialization.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

use super::http::register_http_metrics;
use super::sync::register_sync_metrics;

/// Buckets de histogramas en segundos, desde requests rapidas hasta clones.
const BUCKETS: &[f64] = &[
    0.0005, // 500 microsegundos
    0.001,  // 1 milisegundo
    0.005,  // 5 milisegundos
    0.01,   // 10 milisegundos
    0.05,   // 50 milisegundos
    0.1,    // 100 milisegundos
    0.5,    // 500 milisegundos
    1.0,    // 1 segundo
    5.0,    // 5 segundos
    10.0,   // 10 segundos
    30.0,   // 30 segundos
    120.0,  // 2 minutos
];

/// Inicializa el sistema de metricas y retorna el handle para el endpoint.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(BUCKETS)?
        .install_recorder()?;

    register_http_metrics();
    register_sync_metrics();

    info!("Metrics system initialized");
    Ok(handle)
}
