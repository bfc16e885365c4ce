//! Node hashing.
//!
//! - Leaf nodes:     `blake3(0x00 || address bytes)`
//! - Internal nodes: `blake3(0x01 || min(a, b) || max(a, b))`
//!
//! The 0x00/0x01 tags keep a leaf preimage from colliding with an internal
//! merge.

use appendtree_storage::Digest;

use crate::{Result, address::parse_address};

const LEAF_TAG: u8 = 0x00;
const INTERNAL_TAG: u8 = 0x01;

/// Hash raw leaf bytes.
pub fn leaf_hash(value: &[u8]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_TAG]);
    hasher.update(value);
    Digest::new(*hasher.finalize().as_bytes())
}

/// Validate an address and hash its decoded bytes.
pub fn leaf_digest(value: &str) -> Result<Digest> {
    Ok(leaf_hash(&parse_address(value)?))
}

/// Combine two sibling digests. The pair is ordered before hashing, so
/// `branch_hash(a, b) == branch_hash(b, a)`.
pub fn branch_hash(a: &Digest, b: &Digest) -> Digest {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[INTERNAL_TAG]);
    hasher.update(low.as_bytes());
    hasher.update(high.as_bytes());
    Digest::new(*hasher.finalize().as_bytes())
}
