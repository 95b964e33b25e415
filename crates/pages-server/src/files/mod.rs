//! Static file responses over a site's working tree.
//!
//! Este modulo implementa la semantica de un file server estatico:
//! - `GET` / `HEAD` con `Content-Type`, `Content-Length` y `Last-Modified`
//! - `If-Modified-Since` y rangos simples (`Range: bytes=`)
//! - redirects canonicos para directorios e `index.html`
//! - listado HTML de directorios sin `index.html`

mod body;
mod listing;
mod mime;
mod range;

pub use mime::content_type;
pub use range::{ByteRange, RangeRequest, http_date, not_modified_since, parse_range};

use std::io::{self, Seek, SeekFrom};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use pages_git::{FileBridge, FileInfo};

use crate::error::AppError;

const INDEX_PAGE: &str = "index.html";

/// A request for a path inside one site.
#[derive(Debug)]
pub struct FileRequest<'a> {
    pub method: &'a Method,
    /// Decoded request path, always starting with `/`.
    pub path: &'a str,
    /// Raw query string, preserved across redirects.
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
}

/// Serves `request.path` from `bridge`.
///
/// Every file access happens before this returns: the body streams from a
/// file that is already open, so callers may release the site read lock as
/// soon as they have the response.
pub fn serve(bridge: &FileBridge, request: &FileRequest<'_>) -> Result<Response, AppError> {
    let info = bridge.stat(request.path)?;

    if info.is_dir() {
        if !request.path.ends_with('/') {
            return Ok(redirect(&format!("{}/", request.path), request.query));
        }

        let index = format!("{}{}", request.path, INDEX_PAGE);
        return match bridge.stat(&index) {
            Ok(index_info) if !index_info.is_dir() => {
                serve_file(bridge, &index, &index_info, request)
            },
            Ok(_) => list(bridge, request),
            Err(e) if e.kind() == io::ErrorKind::NotFound => list(bridge, request),
            Err(e) => Err(e.into()),
        };
    }

    if let Some(dir) = request.path.strip_suffix(INDEX_PAGE)
        && dir.ends_with('/')
    {
        return Ok(redirect(dir, request.query));
    }

    serve_file(bridge, request.path, &info, request)
}

/// Serves the file at `path`, whose metadata is `info`.
pub fn serve_file(
    bridge: &FileBridge,
    path: &str,
    info: &FileInfo,
    request: &FileRequest<'_>,
) -> Result<Response, AppError> {
    let size = info.size();
    let last_modified = http_date(info.modified());

    let if_modified_since = header_str(request.headers, header::IF_MODIFIED_SINCE);
    if not_modified_since(if_modified_since, info.modified()) {
        return Ok((
            StatusCode::NOT_MODIFIED,
            [(header::LAST_MODIFIED, last_modified)],
        )
            .into_response());
    }

    let (status, offset, len, content_range) =
        match parse_range(header_str(request.headers, header::RANGE), size) {
            RangeRequest::Full => (StatusCode::OK, 0, size, None),
            RangeRequest::Partial(range) => (
                StatusCode::PARTIAL_CONTENT,
                range.start,
                range.len(),
                Some(range.content_range(size)),
            ),
            RangeRequest::Unsatisfiable => {
                return Ok((
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                )
                    .into_response());
            },
        };

    let mut file = bridge.open(path)?;

    let body = if *request.method == Method::HEAD {
        Body::empty()
    } else {
        // Opens the stream; it stays readable if a sync swaps the tree later
        file.seek(SeekFrom::Start(offset))?;
        Body::from_stream(body::stream(file, len))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;

    let headers = response.headers_mut();
    insert(headers, header::CONTENT_TYPE, &content_type(path));
    insert(headers, header::CONTENT_LENGTH, &len.to_string());
    insert(headers, header::LAST_MODIFIED, &last_modified);
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Some(content_range) = content_range {
        insert(headers, header::CONTENT_RANGE, &content_range);
    }

    Ok(response)
}

fn list(bridge: &FileBridge, request: &FileRequest<'_>) -> Result<Response, AppError> {
    let entries = bridge.read_dir(request.path)?;
    let html = listing::render(&entries);

    let mut response = (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response();

    if *request.method == Method::HEAD {
        *response.body_mut() = Body::empty();
    }

    Ok(response)
}

fn redirect(location: &str, query: Option<&str>) -> Response {
    let location = match query {
        Some(q) if !q.is_empty() => format!("{}?{}", encode_path(location), q),
        _ => encode_path(location),
    };

    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, location)],
    )
        .into_response()
}

/// Percent-encodes each segment of a decoded path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn insert(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}
