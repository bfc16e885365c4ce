//! Append-only Merkle tree maintained incrementally over stored nodes.
//!
//! Every append writes one leaf and touches only the nodes on the path from
//! that leaf to the root; the tree is never rebuilt. A node without a
//! sibling is carried upward unchanged until a later append supplies one,
//! and the tree grows one level at a time when the path runs out of room.
//!
//! # Core types
//!
//! - [`TreeManager`]: binds one shared [`NodeStorage`] to any number of
//!   independently addressed trees.
//! - [`MerkleTree`]: append, root lookup, proof generation and
//!   verification for one tree id.
//! - [`verify_proof`]: check a proof against a known root without storage.
//!
//! # Hashing
//!
//! Blake3 with domain separation: leaves are `blake3(0x00 || address)`,
//! internal nodes `blake3(0x01 || min(a, b) || max(a, b))`. Ordering the
//! pair makes the combination independent of which side a sibling is on,
//! which is what lets a proof be a bare list of sibling digests.
//!
//! # Concurrency
//!
//! Appends are a read-then-write sequence against the storage and are not
//! atomic. Keep one writer per tree id.

#![warn(missing_docs)]

mod address;
mod error;
mod hash;
mod manager;
mod position;
mod proof;
mod tree;
pub mod visualize;

#[cfg(test)]
mod tests;

pub use address::{ADDRESS_LEN, is_address, parse_address};
pub use appendtree_storage::{
    Digest, KeyValueStore, KvStorage, KvStorageConfig, MemoryKv, MemoryStorage, NodeMap,
    NodePosition, NodeStorage, OptionalExt, StorageError, TreeNode,
};
#[cfg(feature = "redis")]
pub use appendtree_storage::RedisKv;
pub use error::{Error, Result};
pub use hash::{branch_hash, leaf_digest, leaf_hash};
pub use manager::TreeManager;
pub use position::sibling_chain;
pub use proof::{compute_root, verify_proof};
pub use tree::{MerkleTree, TreeSnapshot};
