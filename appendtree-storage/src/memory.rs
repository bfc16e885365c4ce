//! In-process node storage.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{PoisonError, RwLock},
};

use crate::{NodeMap, NodePosition, NodeStorage, StorageError, TreeNode};

/// Nodes of one tree: one ordered map per level, plus the leaf value index.
#[derive(Default, Debug)]
struct TreeState {
    levels: Vec<BTreeMap<u64, TreeNode>>,
    leaves_by_value: HashMap<String, u64>,
}

impl TreeState {
    fn get(&self, position: NodePosition) -> Option<&TreeNode> {
        self.levels
            .get(position.level as usize)
            .and_then(|level| level.get(&position.index))
    }

    fn top_level(&self) -> Option<&BTreeMap<u64, TreeNode>> {
        self.levels.iter().rev().find(|level| !level.is_empty())
    }
}

/// Node storage held entirely in memory.
///
/// One instance can back any number of trees; they are partitioned by tree
/// id. Cloning a tree handle never clones this store, share it through an
/// `Arc` (or a plain reference) instead.
#[derive(Default, Debug)]
pub struct MemoryStorage {
    trees: RwLock<HashMap<String, TreeState>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Backend("memory storage lock poisoned".into())
}

impl MemoryStorage {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every tree that has at least one node.
    pub fn tree_ids(&self) -> Result<Vec<String>, StorageError> {
        let trees = self.trees.read().map_err(poisoned)?;
        let mut ids: Vec<String> = trees.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Total number of nodes stored for `tree_id`.
    pub fn node_count(&self, tree_id: &str) -> Result<usize, StorageError> {
        let trees = self.trees.read().map_err(poisoned)?;
        Ok(trees
            .get(tree_id)
            .map_or(0, |tree| tree.levels.iter().map(BTreeMap::len).sum()))
    }
}

impl NodeStorage for MemoryStorage {
    fn insert(&self, node: &TreeNode) -> Result<(), StorageError> {
        let mut trees = self.trees.write().map_err(poisoned)?;
        let tree = trees.entry(node.tree_id.clone()).or_default();
        let level = node.level as usize;
        if tree.levels.len() <= level {
            tree.levels.resize_with(level + 1, BTreeMap::new);
        }
        if let Some(value) = &node.value {
            tree.leaves_by_value.insert(value.clone(), node.index);
        }
        tree.levels[level].insert(node.index, node.clone());
        Ok(())
    }

    fn update(&self, node: &TreeNode) -> Result<(), StorageError> {
        let mut trees = self.trees.write().map_err(poisoned)?;
        let stored = trees
            .get_mut(&node.tree_id)
            .and_then(|tree| tree.levels.get_mut(node.level as usize))
            .and_then(|level| level.get_mut(&node.index))
            .ok_or(StorageError::NotFound)?;
        stored.digest = node.digest;
        Ok(())
    }

    fn find_root(&self, tree_id: &str) -> Result<TreeNode, StorageError> {
        let trees = self.trees.read().map_err(poisoned)?;
        trees
            .get(tree_id)
            .and_then(TreeState::top_level)
            .and_then(|level| level.values().next())
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn find_max_leaf_index(&self, tree_id: &str) -> Result<u64, StorageError> {
        let trees = self.trees.read().map_err(poisoned)?;
        trees
            .get(tree_id)
            .and_then(|tree| tree.levels.first())
            .and_then(|leaves| leaves.keys().next_back())
            .copied()
            .ok_or(StorageError::NotFound)
    }

    fn find_leaf_by_value(&self, tree_id: &str, value: &str) -> Result<TreeNode, StorageError> {
        let trees = self.trees.read().map_err(poisoned)?;
        let tree = trees.get(tree_id).ok_or(StorageError::NotFound)?;
        let index = tree
            .leaves_by_value
            .get(value)
            .ok_or(StorageError::NotFound)?;
        tree.get(NodePosition::new(0, *index))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn find_nodes(
        &self,
        tree_id: &str,
        positions: &[NodePosition],
    ) -> Result<NodeMap, StorageError> {
        let trees = self.trees.read().map_err(poisoned)?;
        let tree = trees.get(tree_id).ok_or(StorageError::NotFound)?;
        let found: NodeMap = positions
            .iter()
            .filter_map(|position| tree.get(*position).map(|node| (*position, node.clone())))
            .collect();
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
        let trees = self.trees.read().map_err(poisoned)?;
        let nodes: Vec<TreeNode> = trees
            .get(tree_id)
            .and_then(|tree| tree.levels.get(level as usize))
            .map(|level| level.values().cloned().collect())
            .unwrap_or_default();
        if nodes.is_empty() {
            return Err(StorageError::NotFound);
        }
        Ok(nodes)
    }
}
