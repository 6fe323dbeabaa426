//! Provebit: Periodic Proof-of-Existence
//!
//! Tracks a set of files and directories, folds their contents into a
//! sorted-leaf Merkle tree on a timer, and publishes the evolving root hash
//! and an activity log to any observer.

pub mod api;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod tree;
pub mod types;
