//! Shared fixtures for integration tests

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Content of the `i`-th fixture file; identical across layouts
pub fn content(i: usize) -> String {
    format!("fixture content {}", i)
}

/// Directory with `n` files and no subdirectories
pub fn flat_dir(n: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..n {
        fs::write(temp_dir.path().join(format!("file{:02}.txt", i)), content(i)).unwrap();
    }
    temp_dir
}

fn write_range(dir: &Path, range: std::ops::Range<usize>) {
    fs::create_dir_all(dir).unwrap();
    for i in range {
        fs::write(dir.join(format!("file{:02}.txt", i)), content(i)).unwrap();
    }
}

/// Eight files: four at the top, four in one subdirectory
pub fn nested_four_and_four() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_range(temp_dir.path(), 0..4);
    write_range(&temp_dir.path().join("sub"), 4..8);
    temp_dir
}

/// The same eight files: two at the top, six spread over two nested levels
pub fn nested_two_and_six() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_range(temp_dir.path(), 0..2);
    write_range(&temp_dir.path().join("a"), 2..5);
    write_range(&temp_dir.path().join("a").join("deep"), 5..8);
    temp_dir
}
