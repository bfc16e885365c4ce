mod test_proof;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use appendtree_storage::{
    Digest, MemoryStorage, NodeMap, NodePosition, NodeStorage, StorageError, TreeNode,
};

use crate::{MerkleTree, TreeManager, branch_hash, leaf_digest};

pub(crate) const A: &str = "0x8b1b201E91966957f18bBcDDB520c53c521bF5cd";
pub(crate) const B: &str = "0x6B1A3bb5f5E25Af83bD7B0D8ef3c5C7f1Dc4bd37";
pub(crate) const C: &str = "0x2a8C60eE96DA1e29e6e3dD1Eb8Ba3A8dB6E2F5c1";
pub(crate) const D: &str = "0x5cFa8e2B1d05E2B6DD2a8D47a1F5bD0B4c8e9f37";
pub(crate) const E: &str = "0x0dC51D7A0A5A35dD2a1F9E6b4a0D8Fd3b2A1C7e4";

/// Deterministic address for leaf number `i`.
pub(crate) fn address(i: u64) -> String {
    format!("0x{i:040x}")
}

pub(crate) fn memory_tree(tree_id: &str) -> MerkleTree<MemoryStorage> {
    TreeManager::in_memory()
        .create_tree(tree_id)
        .expect("valid tree id")
}

pub(crate) fn digest_of(value: &str) -> Digest {
    leaf_digest(value).expect("valid address")
}

/// Root computed from scratch: pair neighbours level by level and carry an
/// unpaired last node up unchanged.
pub(crate) fn reference_root(values: &[String]) -> Option<Digest> {
    let mut level: Vec<Digest> = values.iter().map(|v| digest_of(v)).collect();
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => branch_hash(left, right),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level.first().copied()
}

/// Memory storage that starts failing writes once its budget is spent.
pub(crate) struct FailingStorage {
    inner: MemoryStorage,
    writes_left: AtomicUsize,
}

impl FailingStorage {
    pub(crate) fn new(writes: usize) -> Arc<Self> {
        Arc::new(FailingStorage {
            inner: MemoryStorage::new(),
            writes_left: AtomicUsize::new(writes),
        })
    }

    fn spend(&self) -> Result<(), StorageError> {
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StorageError::Backend("write budget exhausted".to_owned()))
    }
}

impl NodeStorage for FailingStorage {
    fn insert(&self, node: &TreeNode) -> Result<(), StorageError> {
        self.spend()?;
        self.inner.insert(node)
    }

    fn update(&self, node: &TreeNode) -> Result<(), StorageError> {
        self.spend()?;
        self.inner.update(node)
    }

    fn find_root(&self, tree_id: &str) -> Result<TreeNode, StorageError> {
        self.inner.find_root(tree_id)
    }

    fn find_max_leaf_index(&self, tree_id: &str) -> Result<u64, StorageError> {
        self.inner.find_max_leaf_index(tree_id)
    }

    fn find_leaf_by_value(&self, tree_id: &str, value: &str) -> Result<TreeNode, StorageError> {
        self.inner.find_leaf_by_value(tree_id, value)
    }

    fn find_nodes(
        &self,
        tree_id: &str,
        positions: &[NodePosition],
    ) -> Result<NodeMap, StorageError> {
        self.inner.find_nodes(tree_id, positions)
    }

    fn find_nodes_by_level(&self, tree_id: &str, level: u32) -> Result<Vec<TreeNode>, StorageError> {
        self.inner.find_nodes_by_level(tree_id, level)
    }
}
