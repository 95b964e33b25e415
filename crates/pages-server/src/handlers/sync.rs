//! On-demand sync handler.

use axum::{Extension, Json, extract::State};
use pages_git::SyncOutcome;
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::resolve::Resolution;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub domain: String,
    pub commit: String,
    pub updated: bool,
}

/// Handler for POST {admin}/sync.
///
/// Syncs the site resolved from the request host and waits for the outcome.
/// An unresolvable host is a bad request; a failed sync is an internal error.
#[instrument(skip_all)]
pub async fn trigger_sync(
    State(state): State<AppState>,
    Extension(Resolution(resolution)): Extension<Resolution>,
) -> Result<Json<SyncResponse>, AppError> {
    let site = resolution.map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = state
        .trigger()
        .sync_now(&site)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(SyncResponse {
        domain: site.domain().to_string(),
        commit: outcome.commit().to_string(),
        updated: matches!(outcome, SyncOutcome::Updated { .. }),
    }))
}
