//! Digest function for leaf content and internal nodes using BLAKE3

use crate::types::Hash;
use blake3::Hasher;

/// Compute content hash for file bytes
///
/// Uses BLAKE3 to hash file content deterministically.
pub fn compute_content_hash(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Combine two child digests into their parent digest
///
/// parent = hash(left || right)
///
/// Self-pairing is `combine(child, child)`.
pub fn combine(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}
