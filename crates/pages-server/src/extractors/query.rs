use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

/// Query parameters opcionales para rutas de contenido.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ContentQuery {
    /// Marcador de `go get` para vanity import paths.
    #[serde(rename = "go-get")]
    pub go_get: Option<String>,
}

impl ContentQuery {
    /// True cuando la request viene de `go get`.
    pub fn is_vanity(&self) -> bool {
        self.go_get.as_deref() == Some("1")
    }
}

/// Extractor que detecta el marcador `go-get=1`.
///
/// Un query string invalido se trata como ausencia del marcador.
pub struct VanityMarker(pub bool);

impl<S> FromRequestParts<S> for VanityMarker
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let vanity = Query::<ContentQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q.is_vanity())
            .unwrap_or(false);

        Ok(VanityMarker(vanity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn marker(uri: &str) -> bool {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        VanityMarker::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn test_vanity_marker() {
        assert!(marker("/pkg?go-get=1").await);
        assert!(marker("/pkg?v=2&go-get=1").await);
        assert!(!marker("/pkg?go-get=0").await);
        assert!(!marker("/pkg").await);
    }
}
