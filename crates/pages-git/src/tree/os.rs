//! File tree rooted at a directory on the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{FileInfo, FileTree, ReadSeek, clean_path};

/// Name of the repository metadata directory, never exposed to readers.
const GIT_DIR: &str = ".git";

/// A [`FileTree`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct OsTree {
    root: PathBuf,
}

impl OsTree {
    /// Creates a tree rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a tree-relative path onto the filesystem.
    ///
    /// Symlinks are followed only while they stay inside the root and out
    /// of the repository metadata.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let segments = clean_path(path)?;

        if segments.iter().any(|s| *s == GIT_DIR) {
            return Err(not_found());
        }

        let mut full = self.root.clone();
        full.extend(segments);

        let root = fs::canonicalize(&self.root).map_err(missing)?;
        let real = fs::canonicalize(&full).map_err(missing)?;

        match real.strip_prefix(&root) {
            Ok(rest) if !rest.components().any(|c| c.as_os_str() == GIT_DIR) => Ok(full),
            _ => Err(not_found()),
        }
    }

    fn info(name: String, metadata: &fs::Metadata) -> FileInfo {
        FileInfo::new(
            name,
            metadata.len(),
            metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            metadata.is_dir(),
        )
    }
}

fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "not found")
}

/// Treats a path that runs through a regular file as missing.
fn missing(e: io::Error) -> io::Error {
    if e.kind() == io::ErrorKind::NotADirectory {
        io::Error::new(io::ErrorKind::NotFound, e)
    } else {
        e
    }
}

impl FileTree for OsTree {
    fn stat(&self, path: &str) -> io::Result<FileInfo> {
        let full = self.resolve(path)?;
        let metadata = fs::metadata(&full).map_err(missing)?;
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self::info(name, &metadata))
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn ReadSeek>> {
        let full = self.resolve(path)?;
        Ok(Box::new(fs::File::open(full).map_err(missing)?))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        let full = self.resolve(path)?;
        let mut entries = Vec::new();

        for entry in fs::read_dir(full).map_err(missing)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == GIT_DIR {
                continue;
            }
            entries.push(Self::info(name, &entry.metadata()?));
        }

        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }
}
