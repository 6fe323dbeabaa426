//! Leaf collector: turns a tracked-set snapshot into a flat set of leaf digests

use crate::registry::TrackedEntry;
use crate::tree::hasher;
use crate::tree::walker::{FileSystem, PathKind};
use crate::types::Hash;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// A path that contributed no leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Output of one collection pass
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// One digest per regular file read, across all entries
    pub leaves: Vec<Hash>,
    /// Unreadable, vanished or unsupported paths
    pub skipped: Vec<SkippedFile>,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Collect leaf digests for every entry in `snapshot`
///
/// Path kinds are resolved now, not at registration time. A single
/// unreadable file never aborts the pass.
#[instrument(skip_all, fields(entries = snapshot.len()))]
pub fn collect_leaves(fs: &dyn FileSystem, snapshot: &[TrackedEntry]) -> Collection {
    let mut collection = Collection::default();

    for entry in snapshot {
        match fs.kind(&entry.path) {
            Ok(PathKind::File) => hash_into(fs, &entry.path, &mut collection),
            Ok(PathKind::Directory) => {
                let listing = fs.list_files(&entry.path, entry.recursive);
                for (path, reason) in listing.errors {
                    skip(&mut collection, path, reason);
                }
                for file in &listing.files {
                    hash_into(fs, file, &mut collection);
                }
            }
            Ok(PathKind::Other) => skip(
                &mut collection,
                entry.path.clone(),
                "not a regular file or directory".to_string(),
            ),
            Err(e) => skip(&mut collection, entry.path.clone(), e.to_string()),
        }
    }

    debug!(
        leaves = collection.leaves.len(),
        skipped = collection.skipped.len(),
        "Collected leaves"
    );
    collection
}

fn hash_into(fs: &dyn FileSystem, path: &Path, collection: &mut Collection) {
    match fs.read(path) {
        Ok(content) => collection
            .leaves
            .push(hasher::compute_content_hash(&content)),
        Err(e) => skip(collection, path.to_path_buf(), e.to_string()),
    }
}

fn skip(collection: &mut Collection, path: PathBuf, reason: String) {
    warn!(path = %path.display(), %reason, "Skipping unreadable path");
    collection.skipped.push(SkippedFile { path, reason });
}
