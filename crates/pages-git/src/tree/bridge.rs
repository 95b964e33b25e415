//! Lazy file handles over a [`FileTree`].

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use super::{FileInfo, FileTree, ReadSeek};

/// Presents a [`FileTree`] the way a static-file server consumes it.
///
/// `stat` and `open` only ever look at metadata; the underlying stream is
/// opened by the first `read` or `seek` on the returned [`LazyFile`]. HEAD
/// requests and existence checks therefore never pay for an open.
#[derive(Clone)]
pub struct FileBridge {
    tree: Arc<dyn FileTree>,
}

impl FileBridge {
    /// Creates a bridge over `tree`.
    pub fn new(tree: Arc<dyn FileTree>) -> Self {
        Self { tree }
    }

    /// Returns size, modification time and kind of `path`.
    pub fn stat(&self, path: &str) -> io::Result<FileInfo> {
        self.tree.stat(path)
    }

    /// Returns a handle for `path` once it is known to exist.
    pub fn open(&self, path: &str) -> io::Result<LazyFile> {
        let info = self.tree.stat(path)?;

        Ok(LazyFile {
            tree: Arc::clone(&self.tree),
            path: path.to_string(),
            info,
            stream: None,
            closed: false,
        })
    }

    /// Lists the directory at `path`.
    pub fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        self.tree.read_dir(path)
    }
}

impl std::fmt::Debug for FileBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBridge").finish_non_exhaustive()
    }
}

/// A file handle whose stream is opened on first use, exactly once.
pub struct LazyFile {
    tree: Arc<dyn FileTree>,
    path: String,
    info: FileInfo,
    stream: Option<Box<dyn ReadSeek>>,
    closed: bool,
}

impl LazyFile {
    /// Returns the metadata captured when the handle was opened.
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Returns the tree-relative path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true once the underlying stream has been opened.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Releases the underlying stream. Closing an unread or already closed
    /// handle is a no-op.
    pub fn close(&mut self) {
        self.stream = None;
        self.closed = true;
    }

    fn stream(&mut self) -> io::Result<&mut Box<dyn ReadSeek>> {
        if self.closed {
            return Err(io::Error::other("file already closed"));
        }

        if self.stream.is_none() {
            self.stream = Some(self.tree.open(&self.path)?);
        }

        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::other("stream unavailable"))
    }
}

impl Read for LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream()?.read(buf)
    }
}

impl Seek for LazyFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.stream()?.seek(pos)
    }
}

impl std::fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFile")
            .field("path", &self.path)
            .field("size", &self.info.size())
            .field("open", &self.is_open())
            .finish()
    }
}
