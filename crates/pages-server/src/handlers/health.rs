use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sites: usize,
    /// Sitios cuyo ultimo sync fallo; siguen sirviendo el ultimo contenido.
    pub failing: usize,
}

/// Handler para /health. Todos los sitios cargaron al arrancar, por lo que
/// el endpoint siempre esta UP.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.registry();
    let failing = registry
        .iter()
        .filter(|(_, source)| source.state().failure_count() > 0)
        .count();

    Json(HealthResponse {
        status: "UP".to_string(),
        sites: registry.len(),
        failing,
    })
}
