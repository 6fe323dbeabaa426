//! Integration tests for tree shape over real directories

use super::test_utils::{flat_dir, nested_four_and_four, nested_two_and_six};
use provebit::api::ProofApi;
use provebit::tree::builder::MerkleTree;
use provebit::types::HASH_LEN;
use std::path::Path;

fn prove(path: &Path, recursive: bool) -> MerkleTree {
    let api = ProofApi::new();
    api.add_file_to_tree(path, recursive).unwrap();
    api.build_once().unwrap()
}

/// Test a complete tree: 8 files fill the leaf level exactly
#[test]
fn test_complete_tree_shape() {
    let dir = flat_dir(8);
    let tree = prove(dir.path(), false);

    assert_eq!(tree.height(), 3);
    assert_eq!(tree.leaf_count(), 8);
    assert_eq!(tree.tree_size(), 15);
    assert!(tree.nodes().iter().all(Option::is_some));
}

/// Test an incomplete tree: 14 files leave one internal slot vacant
#[test]
fn test_incomplete_tree_shape() {
    let dir = flat_dir(14);
    let tree = prove(dir.path(), false);

    assert_eq!(tree.height(), 4);
    assert_eq!(tree.leaf_count(), 14);
    assert_eq!(tree.tree_size(), 29);
    // Node 14 would parent slots 29 and 30, both past the last leaf
    assert!(tree.node_at(14).is_none());
    assert!(tree.node_at(13).is_some());
    assert!(tree.node_at(6).is_some());
}

/// Test that leaves occupy the tail of the array, sorted and full-width
#[test]
fn test_leaves_sorted_and_fixed_width() {
    let dir = flat_dir(11);
    let tree = prove(dir.path(), false);

    let leaves: Vec<_> = tree.leaves().collect();
    assert_eq!(leaves.len(), 11);
    assert!(leaves.iter().all(|leaf| leaf.len() == HASH_LEN));
    assert!(leaves.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(tree.first_leaf_index() + 11, tree.tree_size());
}

/// Test the recursive flag on a layout with one nested level
#[test]
fn test_recursive_versus_flat_one_level() {
    let dir = nested_four_and_four();
    assert_eq!(prove(dir.path(), true).leaf_count(), 8);
    assert_eq!(prove(dir.path(), false).leaf_count(), 4);
}

/// Test the recursive flag on a layout with two nested levels
#[test]
fn test_recursive_versus_flat_two_levels() {
    let dir = nested_two_and_six();
    assert_eq!(prove(dir.path(), true).leaf_count(), 8);
    assert_eq!(prove(dir.path(), false).leaf_count(), 2);
}

/// Test that a single tracked file yields a height-0 tree
#[test]
fn test_single_file_tree() {
    let dir = flat_dir(1);
    let tree = prove(&dir.path().join("file00.txt"), false);

    assert_eq!(tree.height(), 0);
    assert_eq!(tree.tree_size(), 1);
    assert_eq!(tree.node_at(0), tree.leaves().next());
}
