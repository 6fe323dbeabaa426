//! Merkle tree builder over sorted leaf digests
//!
//! Nodes live in a dense array using heap numbering: the root is index 0 and
//! the children of `i` are `2i + 1` and `2i + 2`. Internal nodes occupy
//! `[0, 2^height - 1)` and the sorted leaves follow immediately, without
//! padding to a power of two. Internal slots whose whole subtree lies past
//! the last leaf are vacant.

use crate::error::TreeError;
use crate::tree::hasher;
use crate::types::{to_hex, Hash};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

/// Rule for an internal node that has a left child but no right child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddNodePolicy {
    /// parent = hash(child || child)
    #[default]
    SelfPair,
    /// parent = child, carried up unhashed
    Promote,
}

/// What to do when a build is requested with no leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTreePolicy {
    /// Produce no tree (`TreeError::EmptyLeafSet`)
    #[default]
    Skip,
    /// Produce a one-slot tree whose root is the digest of the empty input
    EmptyRoot,
}

/// Which side of its parent a sibling sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// One step of an inclusion proof, from the leaf towards the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofStep {
    /// Combine with this sibling digest, which sits on `side`
    Sibling { side: Side, hash: Hash },
    /// No sibling at this level; apply the odd-node policy
    Lone,
}

/// Immutable, array-indexed Merkle tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    height: u32,
    leaf_count: usize,
    nodes: Vec<Option<Hash>>,
    odd_node_policy: OddNodePolicy,
}

impl MerkleTree {
    /// Build a tree with the default odd-node policy
    pub fn build(leaves: Vec<Hash>) -> Result<Self, TreeError> {
        Self::build_with_policy(leaves, OddNodePolicy::default())
    }

    /// Build a tree from a non-empty multiset of leaf digests
    #[instrument(skip(leaves), fields(leaf_count = leaves.len()))]
    pub fn build_with_policy(
        mut leaves: Vec<Hash>,
        odd_node_policy: OddNodePolicy,
    ) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::EmptyLeafSet);
        }
        let start = Instant::now();

        leaves.sort_unstable();
        let leaf_count = leaves.len();
        let height = height_for(leaf_count);
        let first_leaf = (1usize << height) - 1;
        let tree_size = leaf_count + first_leaf;

        let mut nodes: Vec<Option<Hash>> = vec![None; tree_size];
        for (offset, leaf) in leaves.into_iter().enumerate() {
            nodes[first_leaf + offset] = Some(leaf);
        }

        // Bottom-up: every internal index is below its children, so a
        // descending sweep visits each level after the one beneath it.
        for i in (0..first_leaf).rev() {
            let left = nodes.get(2 * i + 1).copied().flatten();
            let right = nodes.get(2 * i + 2).copied().flatten();
            nodes[i] = match (left, right) {
                (Some(l), Some(r)) => Some(hasher::combine(&l, &r)),
                (Some(l), None) => Some(lone_parent(&l, odd_node_policy)),
                _ => None,
            };
        }

        debug!(
            height,
            tree_size,
            duration_us = start.elapsed().as_micros() as u64,
            "Merkle tree built"
        );

        Ok(Self {
            height,
            leaf_count,
            nodes,
            odd_node_policy,
        })
    }

    /// The one-slot tree used by [`EmptyTreePolicy::EmptyRoot`]
    pub fn empty_root() -> Self {
        Self {
            height: 0,
            leaf_count: 0,
            nodes: vec![Some(hasher::compute_content_hash(&[]))],
            odd_node_policy: OddNodePolicy::default(),
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Total number of slots: `leaf_count + 2^height - 1`
    pub fn tree_size(&self) -> usize {
        self.nodes.len()
    }

    /// Index of the first leaf slot
    pub fn first_leaf_index(&self) -> usize {
        if self.leaf_count == 0 {
            0
        } else {
            (1usize << self.height) - 1
        }
    }

    /// Digest at `index`, or `None` for a vacant or out-of-range slot
    pub fn node_at(&self, index: usize) -> Option<&Hash> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    /// The full node array
    pub fn nodes(&self) -> &[Option<Hash>] {
        &self.nodes
    }

    /// Sorted leaf digests
    pub fn leaves(&self) -> impl Iterator<Item = &Hash> + '_ {
        self.nodes[self.first_leaf_index()..]
            .iter()
            .filter_map(Option::as_ref)
            .take(self.leaf_count)
    }

    pub fn root_hash(&self) -> Hash {
        // Index 0 is populated for every tree that can be constructed.
        self.nodes[0].unwrap_or_default()
    }

    pub fn root_hex(&self) -> String {
        to_hex(&self.root_hash())
    }

    pub fn odd_node_policy(&self) -> OddNodePolicy {
        self.odd_node_policy
    }

    /// Inclusion proof for the leaf at `position` within the sorted leaves
    pub fn proof(&self, position: usize) -> Option<Vec<ProofStep>> {
        if position >= self.leaf_count {
            return None;
        }
        let mut steps = Vec::with_capacity(self.height as usize);
        let mut index = self.first_leaf_index() + position;
        while index > 0 {
            let is_left = index % 2 == 1;
            let sibling = if is_left { index + 1 } else { index - 1 };
            steps.push(match self.node_at(sibling) {
                Some(hash) => ProofStep::Sibling {
                    side: if is_left { Side::Right } else { Side::Left },
                    hash: *hash,
                },
                None => ProofStep::Lone,
            });
            index = (index - 1) / 2;
        }
        Some(steps)
    }
}

/// Smallest `h` with `2^h >= leaf_count`; 0 for a single leaf
pub fn height_for(leaf_count: usize) -> u32 {
    if leaf_count <= 1 {
        0
    } else {
        usize::BITS - (leaf_count - 1).leading_zeros()
    }
}

/// Check an inclusion proof produced by [`MerkleTree::proof`]
pub fn verify_proof(leaf: &Hash, steps: &[ProofStep], root: &Hash, policy: OddNodePolicy) -> bool {
    let computed = steps.iter().fold(*leaf, |acc, step| match step {
        ProofStep::Sibling {
            side: Side::Right,
            hash,
        } => hasher::combine(&acc, hash),
        ProofStep::Sibling {
            side: Side::Left,
            hash,
        } => hasher::combine(hash, &acc),
        ProofStep::Lone => lone_parent(&acc, policy),
    });
    &computed == root
}

fn lone_parent(child: &Hash, policy: OddNodePolicy) -> Hash {
    match policy {
        OddNodePolicy::SelfPair => hasher::combine(child, child),
        OddNodePolicy::Promote => *child,
    }
}

/// Tree builder carrying the odd-node and empty-set policies
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder {
    odd_node_policy: OddNodePolicy,
    empty_tree_policy: EmptyTreePolicy,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_odd_node_policy(mut self, policy: OddNodePolicy) -> Self {
        self.odd_node_policy = policy;
        self
    }

    pub fn with_empty_tree_policy(mut self, policy: EmptyTreePolicy) -> Self {
        self.empty_tree_policy = policy;
        self
    }

    pub fn empty_tree_policy(&self) -> EmptyTreePolicy {
        self.empty_tree_policy
    }

    /// Build a brand-new tree; no state carries over between builds
    pub fn build(&self, leaves: Vec<Hash>) -> Result<MerkleTree, TreeError> {
        if leaves.is_empty() && self.empty_tree_policy == EmptyTreePolicy::EmptyRoot {
            return Ok(MerkleTree::empty_root());
        }
        MerkleTree::build_with_policy(leaves, self.odd_node_policy)
    }
}
