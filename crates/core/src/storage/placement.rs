//! Rendezvous-style shard placement.
//!
//! An identifier belongs to the shard whose hashed index is closest to the
//! hashed identifier by XOR distance. Both hashes are the first eight bytes
//! of a SHA-256 digest read as a big-endian u64, so placement is a pure
//! function of `(id, shard_count)`: deterministic, independent of insertion
//! order, and stable as long as membership does not change.

use sha2::{Digest, Sha256};

/// Returns the index of the shard owning `id` among `node_count` shards.
///
/// Ties on XOR distance resolve to the smaller shard index.
pub fn node_index(id: &str, node_count: usize) -> usize {
    debug_assert!(node_count > 0, "placement requires at least one shard");

    let id_hash = hash64(id.as_bytes());
    let mut best = 0;
    let mut min_distance = u64::MAX;
    for i in 0..node_count {
        let node_hash = hash64(&(i as u64).to_be_bytes());
        let distance = id_hash ^ node_hash;
        if distance < min_distance {
            best = i;
            min_distance = distance;
        }
    }
    best
}

/// First eight bytes of the SHA-256 digest as a big-endian u64.
fn hash64(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}
