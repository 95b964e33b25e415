//! `Range` and `If-Modified-Since` request headers.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Byte range requested by a client, inclusive of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Interpretation of a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// Serve the whole file.
    Full,
    /// Serve a single range.
    Partial(ByteRange),
    /// No requested byte exists in the file.
    Unsatisfiable,
}

/// Parses a `Range` header.
///
/// Only single `bytes=` ranges are honoured. Multiple ranges, other units and
/// malformed values fall back to the full file.
pub fn parse_range(header: Option<&str>, size: u64) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };

    if spec.contains(',') {
        return RangeRequest::Full;
    }

    let Some((start, end)) = spec.trim().split_once('-') else {
        return RangeRequest::Full;
    };

    let (start, end) = (start.trim(), end.trim());

    let range = if start.is_empty() {
        // Suffix range: the last `n` bytes
        let Ok(suffix) = end.parse::<u64>() else {
            return RangeRequest::Full;
        };
        if suffix == 0 || size == 0 {
            return RangeRequest::Unsatisfiable;
        }
        ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        }
    } else {
        let Ok(start) = start.parse::<u64>() else {
            return RangeRequest::Full;
        };
        let end = if end.is_empty() {
            u64::MAX
        } else {
            match end.parse::<u64>() {
                Ok(end) if end >= start => end,
                _ => return RangeRequest::Full,
            }
        };
        if start >= size {
            return RangeRequest::Unsatisfiable;
        }
        ByteRange {
            start,
            end: end.min(size - 1),
        }
    };

    RangeRequest::Partial(range)
}

/// Formats a timestamp as an HTTP date.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Returns true if a resource modified at `modified` is unchanged since the
/// `If-Modified-Since` value. HTTP dates carry whole seconds only.
pub fn not_modified_since(header: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = header.and_then(|h| DateTime::parse_from_rfc2822(h.trim()).ok()) else {
        return false;
    };

    let Ok(modified) = modified.duration_since(UNIX_EPOCH) else {
        return false;
    };

    let modified = modified.as_secs() as i64;
    modified > 0 && modified <= since.timestamp()
}
