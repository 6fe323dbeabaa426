//! Property-based tests for tree invariants

use provebit::tree::builder::{height_for, verify_proof, MerkleTree, OddNodePolicy};
use provebit::tree::hasher::compute_content_hash;
use provebit::types::Hash;
use proptest::prelude::*;

fn leaves_from(contents: &[Vec<u8>]) -> Vec<Hash> {
    contents.iter().map(|c| compute_content_hash(c)).collect()
}

fn policy() -> impl Strategy<Value = OddNodePolicy> {
    prop_oneof![Just(OddNodePolicy::SelfPair), Just(OddNodePolicy::Promote)]
}

proptest! {
    /// Shape follows the leaf count alone
    #[test]
    fn prop_shape_matches_leaf_count(contents in prop::collection::vec(any::<Vec<u8>>(), 1..64)) {
        let tree = MerkleTree::build(leaves_from(&contents)).unwrap();
        let n = contents.len();
        let height = height_for(n);

        prop_assert_eq!(tree.leaf_count(), n);
        prop_assert_eq!(tree.height(), height);
        prop_assert_eq!(tree.tree_size(), n + (1usize << height) - 1);
        prop_assert!((1usize << height) >= n);
        if height > 0 {
            prop_assert!((1usize << (height - 1)) < n);
        }
    }

    /// Any permutation of the leaves yields the same root
    #[test]
    fn prop_root_is_order_independent(
        contents in prop::collection::vec(any::<Vec<u8>>(), 1..32),
        policy in policy(),
    ) {
        let forward = leaves_from(&contents);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = MerkleTree::build_with_policy(forward, policy).unwrap();
        let b = MerkleTree::build_with_policy(reversed, policy).unwrap();
        prop_assert_eq!(a.root_hash(), b.root_hash());
    }

    /// Every leaf has a proof that verifies against the root
    #[test]
    fn prop_every_leaf_proves(
        contents in prop::collection::vec(any::<Vec<u8>>(), 1..40),
        policy in policy(),
    ) {
        let tree = MerkleTree::build_with_policy(leaves_from(&contents), policy).unwrap();
        let root = tree.root_hash();
        let leaves: Vec<Hash> = tree.leaves().copied().collect();

        for (position, leaf) in leaves.iter().enumerate() {
            let steps = tree.proof(position).unwrap();
            prop_assert_eq!(steps.len(), tree.height() as usize);
            prop_assert!(verify_proof(leaf, &steps, &root, policy));
        }
    }
}
