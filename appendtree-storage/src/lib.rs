//! Storage layer for the appendtree incremental Merkle tree.
//!
//! Tree nodes are persisted one by one and addressed either by
//! `(tree_id, level, index)` or, for leaves, by `(tree_id, value)`. The
//! [`NodeStorage`] trait is the only thing the tree engine talks to; this
//! crate ships two implementations of it:
//!
//! - [`MemoryStorage`]: in-process maps, one repository object shared by
//!   every tree that uses it.
//! - [`KvStorage`]: any flat string key space behind [`KeyValueStore`]
//!   ([`MemoryKv`], or `RedisKv` with the `redis` feature).

#![warn(missing_docs)]

mod error;
pub mod kv;
mod memory;
mod node;
mod storage;

pub use error::{OptionalExt, StorageError};
#[cfg(feature = "redis")]
pub use kv::RedisKv;
pub use kv::{KeyValueStore, KvStorage, KvStorageConfig, MemoryKv};
pub use memory::MemoryStorage;
pub use node::{DIGEST_LEN, Digest, NodePosition, TreeNode};
pub use storage::{NodeMap, NodeStorage};
