//! Proof-of-existence Merkle tree
//!
//! Leaf digests are collected from the tracked set, sorted, and folded into
//! an array-indexed binary tree whose root commits to the multiset of file
//! contents.

pub mod builder;
pub mod collector;
pub mod hasher;
pub mod path;
pub mod walker;

pub use builder::{EmptyTreePolicy, MerkleTree, OddNodePolicy, TreeBuilder};
pub use collector::{collect_leaves, Collection, SkippedFile};
pub use walker::{FileSystem, LocalFileSystem, PathKind};
