use axum::{extract::FromRequestParts, http::request::Parts};
use pages_git::tree::clean_path;

use crate::error::AppError;

/// Extractor para el path decodificado de la request.
///
/// Rechaza paths que no son UTF-8 valido o que salen del arbol (`..`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath(pub String);

impl RequestPath {
    /// Parsea y valida un path crudo de URI.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let decoded = urlencoding::decode(raw)
            .map_err(|_| AppError::BadRequest("path is not valid UTF-8".to_string()))?;

        clean_path(&decoded).map_err(|e| AppError::BadRequest(e.to_string()))?;

        if decoded.starts_with('/') {
            Ok(RequestPath(decoded.into_owned()))
        } else {
            Ok(RequestPath(format!("/{}", decoded)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::parse(parts.uri.path())
    }
}
