//! Integration tests for root hash determinism

use super::test_utils::{flat_dir, nested_four_and_four, nested_two_and_six};
use provebit::api::ProofApi;
use provebit::types::Hash;
use std::fs;
use std::path::Path;

fn root_of(paths: &[&Path], recursive: bool) -> Hash {
    let api = ProofApi::new();
    for path in paths {
        api.add_file_to_tree(path, recursive).unwrap();
    }
    api.build_once().unwrap().root_hash()
}

/// Test that the same filesystem produces the same root hash
#[test]
fn test_same_filesystem_same_root() {
    let dir = flat_dir(5);
    assert_eq!(root_of(&[dir.path()], false), root_of(&[dir.path()], false));
}

/// Test that layouts with the same content multiset share a root
#[test]
fn test_layout_independent_root() {
    let a = nested_four_and_four();
    let b = nested_two_and_six();
    assert_eq!(root_of(&[a.path()], true), root_of(&[b.path()], true));
    assert_ne!(root_of(&[a.path()], false), root_of(&[b.path()], false));
}

/// Test that file names do not contribute to the root
#[test]
fn test_renaming_keeps_root() {
    let dir = flat_dir(3);
    let before = root_of(&[dir.path()], false);
    fs::rename(dir.path().join("file00.txt"), dir.path().join("renamed.txt")).unwrap();
    assert_eq!(before, root_of(&[dir.path()], false));
}

/// Test that file content changes produce different root hashes
#[test]
fn test_file_content_change_different_root() {
    let dir = flat_dir(3);
    let before = root_of(&[dir.path()], false);
    fs::write(dir.path().join("file01.txt"), "changed").unwrap();
    assert_ne!(before, root_of(&[dir.path()], false));
}

/// Test that tracking order does not matter
#[test]
fn test_tracking_order_irrelevant() {
    let a = flat_dir(2);
    let b = nested_four_and_four();
    assert_eq!(
        root_of(&[a.path(), b.path()], true),
        root_of(&[b.path(), a.path()], true)
    );
}

/// Test that duplicate content is kept as separate leaves
#[test]
fn test_duplicate_content_counts_twice() {
    let dir = flat_dir(2);
    fs::write(dir.path().join("copy.txt"), super::test_utils::content(0)).unwrap();

    let api = ProofApi::new();
    api.add_file_to_tree(dir.path(), false).unwrap();
    assert_eq!(api.build_once().unwrap().leaf_count(), 3);
}
