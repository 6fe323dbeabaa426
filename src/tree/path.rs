//! Path normalization for tracked-set keys

use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path for use as a registry key
///
/// Existing paths are canonicalized (resolves symlinks, `..`, `.`) before
/// Unicode normalization. Paths that do not exist are normalized textually
/// so that a vanished root can still be looked up and removed.
pub fn normalize_tracked_path(path: &Path) -> PathBuf {
    match dunce::canonicalize(path) {
        Ok(canonical) => PathBuf::from(normalize_path_string(&canonical.to_string_lossy())),
        Err(_) => textual_key(path),
    }
}

/// Normalize a path without resolving symlinks
///
/// Relative paths are anchored at the current directory. This is the key a
/// caller's own spelling of a root maps to once the root no longer exists.
pub fn textual_key(path: &Path) -> PathBuf {
    let anchored = if path.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    };
    PathBuf::from(normalize_path_string(&anchored.to_string_lossy()))
}

/// Normalize a path string (without filesystem access)
///
/// Normalizes Unicode to NFC and removes trailing separators (except root).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.len() > 1 && (result.ends_with('/') || result.ends_with('\\')) {
            result.pop();
        }
    }
    result
}
