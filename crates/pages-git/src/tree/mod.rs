//! Abstract file trees and the bridge that makes them streamable.
//!
//! A [`FileTree`] is the read side of a working tree: stat, open and list
//! with slash-separated paths relative to the tree root. [`FileBridge`] wraps
//! a tree with the semantics a static-file server relies on.

mod bridge;
mod os;

use std::io::{self, Read, Seek};
use std::time::SystemTime;

pub use bridge::{FileBridge, LazyFile};
pub use os::OsTree;

/// Metadata for one entry of a file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    name: String,
    size: u64,
    modified: SystemTime,
    is_dir: bool,
}

impl FileInfo {
    /// Creates a new FileInfo.
    pub fn new(name: impl Into<String>, size: u64, modified: SystemTime, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            size,
            modified,
            is_dir,
        }
    }

    /// Returns the base name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the modification time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Returns true for directories.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// A readable, seekable byte stream.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Read access to a hierarchical file tree.
///
/// Missing paths fail with [`io::ErrorKind::NotFound`].
pub trait FileTree: Send + Sync {
    /// Returns metadata for `path` without opening it.
    fn stat(&self, path: &str) -> io::Result<FileInfo>;

    /// Opens `path` for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn ReadSeek>>;

    /// Lists the entries of the directory at `path`, sorted by name.
    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>>;
}

/// Normalizes a request path into tree-relative segments.
///
/// Empty and `.` segments are dropped; `..` is rejected so a path can never
/// leave the tree.
pub fn clean_path(path: &str) -> io::Result<Vec<&str>> {
    let mut segments = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "path escapes the tree root",
                ));
            },
            s if s.contains('\\') || s.contains('\0') => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "invalid character in path",
                ));
            },
            s => segments.push(s),
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/").unwrap(), Vec::<&str>::new());
        assert_eq!(clean_path("/docs//guide/./index.html").unwrap(), vec![
            "docs",
            "guide",
            "index.html"
        ]);
        assert_eq!(clean_path("css/site.css").unwrap(), vec!["css", "site.css"]);
    }

    #[test]
    fn test_clean_path_rejects_parent() {
        let err = clean_path("/docs/../../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
