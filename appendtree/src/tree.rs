//! Tree handle and incremental append.

use std::sync::Arc;

use appendtree_storage::{Digest, NodeMap, NodeStorage, OptionalExt, TreeNode};
use tracing::{debug, instrument, trace};

use crate::{
    Error, Result,
    hash::{branch_hash, leaf_digest},
    position::sibling_chain,
};

/// One append-only Merkle tree, addressed by `tree_id` inside a shared
/// [`NodeStorage`].
///
/// The handle holds no tree state of its own; every call reads what it
/// needs from storage.
pub struct MerkleTree<S: ?Sized> {
    tree_id: String,
    storage: Arc<S>,
}

impl<S: ?Sized> Clone for MerkleTree<S> {
    fn clone(&self) -> Self {
        MerkleTree {
            tree_id: self.tree_id.clone(),
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for MerkleTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleTree")
            .field("tree_id", &self.tree_id)
            .finish_non_exhaustive()
    }
}

/// All stored nodes of a tree, grouped by level. `levels[0]` holds the
/// leaves; the last entry holds the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    /// Tree the nodes belong to.
    pub tree_id: String,
    /// Nodes per level, each level sorted by index.
    pub levels: Vec<Vec<TreeNode>>,
}

impl<S: NodeStorage + ?Sized> MerkleTree<S> {
    /// Bind `tree_id` to a shared storage. Nothing is written until the
    /// first append.
    pub fn new(storage: Arc<S>, tree_id: impl Into<String>) -> Self {
        MerkleTree {
            tree_id: tree_id.into(),
            storage,
        }
    }

    /// The tree id this handle addresses.
    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    /// The backing storage.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Current root node, `None` for an empty tree.
    pub fn root(&self) -> Result<Option<TreeNode>> {
        Ok(self.storage.find_root(&self.tree_id).optional()?)
    }

    /// Level of the current root.
    pub fn root_level(&self) -> Result<Option<u32>> {
        Ok(self.root()?.map(|root| root.level))
    }

    /// Digest of the current root.
    pub fn root_digest(&self) -> Result<Option<Digest>> {
        Ok(self.root()?.map(|root| root.digest))
    }

    /// Number of leaves appended so far.
    pub fn leaf_count(&self) -> Result<u64> {
        Ok(self
            .storage
            .find_max_leaf_index(&self.tree_id)
            .optional()?
            .map_or(0, |max| max + 1))
    }

    /// The leaf holding `value`, if it was appended.
    pub fn get_leaf(&self, value: &str) -> Result<Option<TreeNode>> {
        Ok(self
            .storage
            .find_leaf_by_value(&self.tree_id, value)
            .optional()?)
    }

    /// Append `value` as the next leaf and refresh every node on its path
    /// to the root. Appending a value that is already present is a no-op.
    ///
    /// Returns [`Error::InvalidInput`] without touching storage when
    /// `value` is not a `0x`-prefixed 40-digit hex address.
    #[instrument(skip(self), fields(tree_id = %self.tree_id))]
    pub fn append_leaf(&self, value: &str) -> Result<()> {
        let digest = leaf_digest(value)?;
        if self.get_leaf(value)?.is_some() {
            debug!("value already present");
            return Ok(());
        }

        let index = self.leaf_count()?;
        let leaf = TreeNode::leaf(self.tree_id.as_str(), value, index, digest);
        self.storage.insert(&leaf)?;
        debug!(index, %digest, "inserted leaf");

        // The first leaf of an empty tree is its own root at this point.
        let root_level = self.root_level()?.ok_or_else(|| {
            Error::InconsistentTree(format!(
                "tree {} has no root after inserting leaf {index}",
                self.tree_id
            ))
        })?;
        let nodes = self.load_path(index, root_level)?;

        let mut position = leaf.position();
        let mut hash = digest;
        let mut grow_root = true;

        if position.is_right_child()
            && let Some(left) = nodes.get(&position.sibling())
        {
            hash = branch_hash(&left.digest, &digest);
        }

        for level in 1..=root_level {
            position = position.parent();
            let node_digest = hash;
            match nodes.get(&position) {
                Some(existing) => {
                    let mut updated = existing.clone();
                    updated.digest = node_digest;
                    self.storage.update(&updated)?;
                    debug!(%position, digest = %node_digest, "updated node");
                }
                None => {
                    let created = TreeNode::internal(self.tree_id.as_str(), position, node_digest);
                    self.storage.insert(&created)?;
                    debug!(%position, digest = %node_digest, "created node");
                }
            }

            let sibling = nodes.get(&position.sibling());
            if position.is_right_child() {
                if let Some(left) = sibling {
                    hash = branch_hash(&left.digest, &node_digest);
                }
            } else if let Some(right) = sibling {
                hash = branch_hash(&node_digest, &right.digest);
            } else if level == root_level && position.index == 0 {
                // Leftmost node of the root level with nothing to its right:
                // this node is still the root.
                grow_root = false;
            }
        }

        if grow_root {
            let new_root = TreeNode::internal(self.tree_id.as_str(), position.parent(), hash);
            self.storage.insert(&new_root)?;
            debug!(level = new_root.level, digest = %hash, "tree grew");
        }
        Ok(())
    }

    /// Every stored node of this tree, level by level.
    pub fn snapshot(&self) -> Result<TreeSnapshot> {
        let mut levels = Vec::new();
        if let Some(root_level) = self.root_level()? {
            for level in 0..=root_level {
                levels.push(
                    self.storage
                        .find_nodes_by_level(&self.tree_id, level)
                        .optional()?
                        .unwrap_or_default(),
                );
            }
        }
        Ok(TreeSnapshot {
            tree_id: self.tree_id.clone(),
            levels,
        })
    }

    /// Fetch the path of `leaf_index` and its siblings up to `root_level`.
    /// Positions that are not stored yet are simply absent from the map.
    pub(crate) fn load_path(&self, leaf_index: u64, root_level: u32) -> Result<NodeMap> {
        let positions = sibling_chain(leaf_index, root_level);
        let nodes = self
            .storage
            .find_nodes(&self.tree_id, &positions)
            .optional()?
            .unwrap_or_default();
        trace!(
            tree_id = %self.tree_id,
            requested = positions.len(),
            found = nodes.len(),
            "loaded path"
        );
        Ok(nodes)
    }
}
