//! Filesystem access capability used by the leaf collector
//!
//! The collector only sees the [`FileSystem`] trait, so callers can swap the
//! local disk for any other source of files (tests use in-memory and gated
//! implementations).

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Kind of a filesystem path at the time it is inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    /// Sockets, devices, dangling links and the like
    Other,
}

/// Result of listing the files under a directory
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Regular files found, sorted by path
    pub files: Vec<PathBuf>,
    /// Entries that could not be inspected, with the reason
    pub errors: Vec<(PathBuf, String)>,
}

/// Filesystem access capability
pub trait FileSystem: Send + Sync {
    /// Classify a path. `NotFound` is reported as an error.
    fn kind(&self, path: &Path) -> io::Result<PathKind>;

    /// Read the full contents of a regular file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List regular files under `dir`
    ///
    /// With `recursive = false` only files directly inside `dir` are returned;
    /// nested directories are skipped entirely.
    fn list_files(&self, dir: &Path, recursive: bool) -> Listing;
}

/// Walker configuration
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links while descending (default: false)
    pub follow_symlinks: bool,
}

/// Local disk implementation backed by `walkdir`
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    config: WalkerConfig,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WalkerConfig) -> Self {
        Self { config }
    }
}

impl FileSystem for LocalFileSystem {
    fn kind(&self, path: &Path) -> io::Result<PathKind> {
        let metadata = std::fs::metadata(path)?;
        Ok(if metadata.is_file() {
            PathKind::File
        } else if metadata.is_dir() {
            PathKind::Directory
        } else {
            PathKind::Other
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn list_files(&self, dir: &Path, recursive: bool) -> Listing {
        let mut listing = Listing::default();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        listing.files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| dir.to_path_buf());
                    listing.errors.push((path, e.to_string()));
                }
            }
        }

        listing.files.sort();
        listing
    }
}
