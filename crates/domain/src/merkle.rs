//! Sparse Merkle map hashing.
//!
//! Leaves sit at the position given by `SHA-256(domain)`. A proof of depth
//! `d` uses the top `d` bits of that index, most significant bit first,
//! with bit `d - 1` choosing the side at the leaf level.

use crate::errors::CodecError;
use crate::proof::MapLeaf;
use sha2::{Digest, Sha256};

pub const HASH_LEN: usize = 32;
pub const MAX_DEPTH: usize = HASH_LEN * 8;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

pub type Hash = [u8; HASH_LEN];

/// Map position for a domain.
pub fn leaf_index(domain: &str) -> Hash {
    Sha256::digest(domain.as_bytes()).into()
}

pub fn leaf_hash(tree_id: i64, index: &Hash, leaf: &MapLeaf) -> Result<Hash, CodecError> {
    let value_hash = Sha256::digest(leaf.canonical_bytes()?);

    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(tree_id.to_be_bytes());
    hasher.update(index);
    hasher.update(value_hash);
    Ok(hasher.finalize().into())
}

pub fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// True when the node at `level` (0 = leaf) on the path to `index` is a
/// right child, for a tree of the given depth.
pub fn is_right_child(index: &Hash, depth: usize, level: usize) -> bool {
    let bit = depth - 1 - level;
    (index[bit / 8] >> (7 - bit % 8)) & 1 == 1
}

/// Folds the audit path into a root. Returns `None` when the path is empty
/// or deeper than the index has bits.
pub fn compute_root(leaf_hash: Hash, index: &Hash, audit_path: &[Hash]) -> Option<Hash> {
    let depth = audit_path.len();
    if depth == 0 || depth > MAX_DEPTH {
        return None;
    }

    let mut current = leaf_hash;
    for (level, sibling) in audit_path.iter().enumerate() {
        current = if is_right_child(index, depth, level) {
            node_hash(sibling, &current)
        } else {
            node_hash(&current, sibling)
        };
    }

    Some(current)
}
