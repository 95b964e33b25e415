//! Maps inbound requests onto hosted sites.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderName, Request, Uri,
        header::HOST,
        uri::Authority,
    },
    middleware::Next,
    response::Response,
};
use pages_git::{ContentSource, Registry};
use tracing::debug;

/// Header set by reverse proxies carrying the client-facing host.
pub static FORWARDED_HOST_HEADER: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Why a request could not be mapped onto a site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No site serves the requested host.
    #[error("no site configured for host {0:?}")]
    NotFound(String),

    /// The host could not be parsed.
    #[error("malformed host: {0}")]
    BadRequest(String),
}

/// Outcome of site resolution, attached to every public request as an
/// extension.
#[derive(Debug, Clone)]
pub struct Resolution(pub Result<Arc<ContentSource>, ResolveError>);

/// Resolves the site responsible for a request.
///
/// A registry holding only the wildcard site answers every request. Otherwise
/// the host is taken from `X-Forwarded-Host`, then `Host`, then the request
/// URI; the first non-empty value wins. Ports are ignored and hosts compare
/// case-insensitively. A wildcard site registered next to named sites serves
/// every host that matches none of them.
#[derive(Debug, Clone)]
pub struct DomainResolver {
    registry: Arc<Registry>,
}

impl DomainResolver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn resolve(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
    ) -> Result<Arc<ContentSource>, ResolveError> {
        if let Some(site) = self.registry.single_wildcard() {
            return Ok(Arc::clone(site));
        }

        let host = request_host(headers, uri)?;

        self.registry
            .get(&host)
            .or_else(|| self.registry.wildcard())
            .cloned()
            .ok_or(ResolveError::NotFound(host))
    }
}

/// Extracts the normalized candidate host of a request.
fn request_host(headers: &HeaderMap, uri: &Uri) -> Result<String, ResolveError> {
    for name in [&FORWARDED_HOST_HEADER, &HOST] {
        let Some(value) = headers.get(name) else {
            continue;
        };

        let value = value
            .to_str()
            .map_err(|_| ResolveError::BadRequest(format!("non-ASCII {} header", name)))?;

        // Proxies chain forwarded hosts; the first one is the client's
        let value = value.split(',').next().unwrap_or_default().trim();
        if value.is_empty() {
            continue;
        }

        return normalize(value);
    }

    match uri.host() {
        Some(host) if !host.is_empty() => normalize(host),
        _ => Err(ResolveError::NotFound(String::new())),
    }
}

fn normalize(value: &str) -> Result<String, ResolveError> {
    let authority: Authority = value
        .parse()
        .map_err(|_| ResolveError::BadRequest(value.to_string()))?;

    if authority.as_str().contains('@') {
        return Err(ResolveError::BadRequest(value.to_string()));
    }

    let host = authority.host().trim_end_matches('.');
    if host.is_empty() {
        return Err(ResolveError::BadRequest(value.to_string()));
    }

    Ok(host.to_ascii_lowercase())
}

/// Middleware que resuelve el sitio y lo adjunta a la request.
pub async fn resolve_site(
    State(resolver): State<DomainResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let resolution = resolver.resolve(request.headers(), request.uri());

    match &resolution {
        Ok(site) => debug!(domain = site.domain(), "Resolved site"),
        Err(e) => debug!("Site resolution failed: {}", e),
    }

    request.extensions_mut().insert(Resolution(resolution));
    next.run(request).await
}
