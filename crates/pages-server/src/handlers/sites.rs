//! Site status handler.

use axum::{Json, extract::State};
use pages_git::SyncStatus;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub domain: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Segundos entre syncs periodicos, 0 si esta deshabilitado.
    pub sync_interval: u64,
    #[serde(flatten)]
    pub status: SyncStatus,
}

/// Handler for GET {admin}/sites, sorted by domain.
pub async fn list_sites(State(state): State<AppState>) -> Json<Vec<SiteResponse>> {
    let mut sites: Vec<SiteResponse> = state
        .registry()
        .iter()
        .map(|(domain, source)| {
            let config = source.config();
            SiteResponse {
                domain: domain.to_string(),
                url: config.url().to_string(),
                branch: config.branch().map(String::from),
                tag: config.tag().map(String::from),
                sync_interval: config.sync_interval().as_secs(),
                status: source.state().status(),
            }
        })
        .collect();

    sites.sort_by(|a, b| a.domain.cmp(&b.domain));
    Json(sites)
}
