//! Site content handler.

use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::{RequestPath, VanityMarker};
use crate::files::{self, FileRequest};
use crate::resolve::Resolution;
use crate::state::AppState;

/// Handler for GET/HEAD on any path of the resolved site.
///
/// Requests carrying the `go-get=1` marker are answered with
/// `<path>/index.html` when that file exists, bypassing redirects and
/// directory listings.
#[instrument(skip_all, fields(path = %path.as_str()))]
pub async fn serve_content(
    State(state): State<AppState>,
    Extension(Resolution(resolution)): Extension<Resolution>,
    VanityMarker(vanity): VanityMarker,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path: RequestPath,
) -> Result<Response, AppError> {
    let site = resolution?;

    // Held while files are looked up and opened, not while bodies stream
    let _guard = site.read_guard(state.signal()).await?;
    let bridge = site.bridge()?;

    let request = FileRequest {
        method: &method,
        path: path.as_str(),
        query: uri.query(),
        headers: &headers,
    };

    if vanity {
        let index = format!("{}/index.html", path.as_str().trim_end_matches('/'));

        if let Ok(info) = bridge.stat(&index)
            && !info.is_dir()
        {
            tracing::debug!(domain = site.domain(), "Serving vanity index {}", index);
            return files::serve_file(&bridge, &index, &info, &request);
        }
    }

    files::serve(&bridge, &request)
}
