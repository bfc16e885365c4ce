//! Node storage over a flat string key space.
//!
//! Every node is written under its position key; leaves are additionally
//! written under their value key so idempotent appends can find them without
//! a scan. Two per-tree counters (largest leaf index, highest level) are kept
//! next to the nodes so the max-leaf and root lookups cost one read and at
//! most one scan of the top level. Level scans go through
//! [`KeyValueStore::scan_prefix`].

pub mod keys;
mod memory;
#[cfg(feature = "redis")]
mod redis_kv;

pub use memory::MemoryKv;
#[cfg(feature = "redis")]
pub use redis_kv::RedisKv;

use tracing::trace;

use crate::{NodeMap, NodePosition, NodeStorage, StorageError, TreeNode};

/// Minimal key/value contract the keyed backend needs.
pub trait KeyValueStore {
    /// The bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    /// Every key starting with `prefix`, in no particular order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Settings for [`KvStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvStorageConfig {
    /// First key segment, separating this data from anything else sharing
    /// the key space.
    pub namespace: String,
}

impl Default for KvStorageConfig {
    fn default() -> Self {
        KvStorageConfig {
            namespace: "merkletree".to_string(),
        }
    }
}

/// [`NodeStorage`] over any [`KeyValueStore`].
///
/// Updates overwrite unconditionally; an update of a node that was never
/// inserted simply creates it.
///
/// Each write also raises the tree's `max_leaf` / `top_level` counters,
/// a read and possibly a write per counter. Trees written without the
/// counters fall back to scanning every level.
#[derive(Debug)]
pub struct KvStorage<K> {
    kv: K,
    config: KvStorageConfig,
}

impl<K: KeyValueStore> KvStorage<K> {
    /// Keyed storage with the default namespace.
    pub fn new(kv: K) -> Self {
        Self::with_config(kv, KvStorageConfig::default())
    }

    /// Keyed storage with explicit settings.
    pub fn with_config(kv: K, config: KvStorageConfig) -> Self {
        KvStorage { kv, config }
    }

    /// The underlying key/value store.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Active settings.
    pub fn config(&self) -> &KvStorageConfig {
        &self.config
    }

    fn namespace(&self) -> &str {
        &self.config.namespace
    }

    fn read_node(&self, key: &str) -> Result<Option<TreeNode>, StorageError> {
        self.kv
            .get(key)?
            .map(|bytes| TreeNode::decode(&bytes))
            .transpose()
    }

    fn write_node(&self, node: &TreeNode) -> Result<(), StorageError> {
        let bytes = node.encode()?;
        let ns = self.namespace();
        self.kv
            .set(&keys::node_key(ns, &node.tree_id, node.position()), &bytes)?;
        if let Some(value) = &node.value {
            self.kv
                .set(&keys::leaf_value_key(ns, &node.tree_id, value), &bytes)?;
        }
        if node.is_leaf() {
            self.raise_counter(&keys::max_leaf_key(ns, &node.tree_id), node.index)?;
        }
        self.raise_counter(
            &keys::top_level_key(ns, &node.tree_id),
            u64::from(node.level),
        )
    }

    fn read_counter(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let Some(bytes) = self.kv.get(key)? else {
            return Ok(None);
        };
        let raw: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| StorageError::Codec(format!("counter {key} is {} bytes", bytes.len())))?;
        Ok(Some(u64::from_be_bytes(raw)))
    }

    fn raise_counter(&self, key: &str, value: u64) -> Result<(), StorageError> {
        match self.read_counter(key)? {
            Some(current) if current >= value => Ok(()),
            _ => self.kv.set(key, &value.to_be_bytes()),
        }
    }

    /// Highest populated level, found by scanning upward from the leaves.
    fn scan_top_level(&self, tree_id: &str) -> Result<Option<u32>, StorageError> {
        let mut top = None;
        let mut level = 0;
        while !self.level_indices(tree_id, level)?.is_empty() {
            top = Some(level);
            level += 1;
        }
        Ok(top)
    }

    /// Sorted indices present on `level`.
    fn level_indices(&self, tree_id: &str, level: u32) -> Result<Vec<u64>, StorageError> {
        let ns = self.namespace();
        let prefix = keys::level_prefix(ns, tree_id, level);
        let found = self.kv.scan_prefix(&prefix)?;
        trace!(%prefix, keys = found.len(), "scanned level");

        let mut indices = Vec::with_capacity(found.len());
        for key in found {
            // Keys of a tree whose id extends ours (`{tree_id}:level:{level}:no:…`)
            // share the prefix; ours end in a bare index.
            let foreign = key
                .strip_prefix(prefix.as_str())
                .is_none_or(|rest| rest.contains(':'));
            if foreign {
                continue;
            }
            let (_, position) = keys::parse_node_key(ns, &key)?;
            indices.push(position.index);
        }
        indices.sort_unstable();
        Ok(indices)
    }
}

impl<K: KeyValueStore> NodeStorage for KvStorage<K> {
    fn insert(&self, node: &TreeNode) -> Result<(), StorageError> {
        self.write_node(node)
    }

    fn update(&self, node: &TreeNode) -> Result<(), StorageError> {
        self.write_node(node)
    }

    fn find_root(&self, tree_id: &str) -> Result<TreeNode, StorageError> {
        let top = match self.read_counter(&keys::top_level_key(self.namespace(), tree_id))? {
            Some(level) => Some(u32::try_from(level).map_err(|_| {
                StorageError::Codec(format!("top level {level} of tree {tree_id} out of range"))
            })?),
            None => self.scan_top_level(tree_id)?,
        };
        let level = top.ok_or(StorageError::NotFound)?;
        let index = *self
            .level_indices(tree_id, level)?
            .first()
            .ok_or(StorageError::NotFound)?;
        self.read_node(&keys::node_key(
            self.namespace(),
            tree_id,
            NodePosition::new(level, index),
        ))?
        .ok_or(StorageError::NotFound)
    }

    fn find_max_leaf_index(&self, tree_id: &str) -> Result<u64, StorageError> {
        if let Some(max) = self.read_counter(&keys::max_leaf_key(self.namespace(), tree_id))? {
            return Ok(max);
        }
        self.level_indices(tree_id, 0)?
            .last()
            .copied()
            .ok_or(StorageError::NotFound)
    }

    fn find_leaf_by_value(&self, tree_id: &str, value: &str) -> Result<TreeNode, StorageError> {
        self.read_node(&keys::leaf_value_key(self.namespace(), tree_id, value))?
            .ok_or(StorageError::NotFound)
    }

    fn find_nodes(
        &self,
        tree_id: &str,
        positions: &[NodePosition],
    ) -> Result<NodeMap, StorageError> {
        let mut found = NodeMap::new();
        for position in positions {
            if let Some(node) =
                self.read_node(&keys::node_key(self.namespace(), tree_id, *position))?
            {
                found.insert(*position, node);
            }
        }
        if found.is_empty() {
            return Err(StorageError::NotFound);
        }
        Ok(found)
    }

    fn find_nodes_by_level(
        &self,
        tree_id: &str,
        level: u32,
    ) -> Result<Vec<TreeNode>, StorageError> {
        let mut nodes = Vec::new();
        for index in self.level_indices(tree_id, level)? {
            let key = keys::node_key(self.namespace(), tree_id, NodePosition::new(level, index));
            if let Some(node) = self.read_node(&key)? {
                nodes.push(node);
            }
        }
        if nodes.is_empty() {
            return Err(StorageError::NotFound);
        }
        Ok(nodes)
    }
}
