//! Core type aliases shared across the crate.

/// 32-byte digest produced by the digest function.
pub type Hash = [u8; 32];

/// Length in bytes of every [`Hash`].
pub const HASH_LEN: usize = 32;

/// Encode a hash as lowercase hex.
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}
