use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pages_git::SiteError;
use serde::Serialize;

use crate::resolve::ResolveError;

#[derive(Debug)]
pub enum AppError {
    /// No site or no file for the request
    NotFound(String),

    /// Malformed host or path
    BadRequest(String),

    /// Error interno
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl AppError {
    /// Returns the HTTP status the error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match self {
            AppError::NotFound(msg) => ("Not Found", msg),
            AppError::BadRequest(msg) => ("Bad Request", msg),
            AppError::Internal(msg) => ("Internal Server Error", msg),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(_) => AppError::NotFound(err.to_string()),
            ResolveError::BadRequest(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<SiteError> for AppError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::UnknownSite(_) => AppError::NotFound(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                AppError::NotFound("file not found".to_string())
            },
            std::io::ErrorKind::InvalidInput => AppError::BadRequest(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
