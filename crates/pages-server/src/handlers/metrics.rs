//! Metrics endpoint handler.

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler para el endpoint /metrics del listener privado.
pub async fn metrics_handler(State(prometheus): State<PrometheusHandle>) -> String {
    prometheus.run_upkeep();
    prometheus.render()
}
