//! The node storage port.

use std::{collections::BTreeMap, sync::Arc};

use crate::{NodePosition, StorageError, TreeNode};

/// Nodes returned by a multi-position lookup, keyed by where they sit.
pub type NodeMap = BTreeMap<NodePosition, TreeNode>;

/// Key/value contract over tree nodes.
///
/// Takes `&self` everywhere so one backend can be shared by many trees;
/// implementations use interior mutability. "Absent" is reported as
/// [`StorageError::NotFound`], never as an empty success, except for
/// [`NodeStorage::find_nodes`] which only fails with `NotFound` when none of
/// the requested positions exist.
///
/// No operation is atomic across calls. Callers must keep a single writer
/// per tree id.
pub trait NodeStorage {
    /// Persist a new node, overwriting whatever was stored under the same
    /// `(tree_id, level, index)` or, for leaves, `(tree_id, value)`.
    fn insert(&self, node: &TreeNode) -> Result<(), StorageError>;

    /// Replace the digest of an existing node. Backends may reject updates
    /// of absent nodes with `NotFound`.
    fn update(&self, node: &TreeNode) -> Result<(), StorageError>;

    /// The node on the highest populated level of `tree_id`.
    fn find_root(&self, tree_id: &str) -> Result<TreeNode, StorageError>;

    /// The largest index among the leaves of `tree_id`.
    fn find_max_leaf_index(&self, tree_id: &str) -> Result<u64, StorageError>;

    /// The leaf holding `value`.
    fn find_leaf_by_value(&self, tree_id: &str, value: &str) -> Result<TreeNode, StorageError>;

    /// Whichever of `positions` exist.
    fn find_nodes(&self, tree_id: &str, positions: &[NodePosition])
    -> Result<NodeMap, StorageError>;

    /// Every node on `level`, in ascending index order.
    fn find_nodes_by_level(&self, tree_id: &str, level: u32)
    -> Result<Vec<TreeNode>, StorageError>;
}

macro_rules! forward_node_storage {
    ($($ptr:ty),*) => {
        $(
            impl<S: NodeStorage + ?Sized> NodeStorage for $ptr {
                fn insert(&self, node: &TreeNode) -> Result<(), StorageError> {
                    (**self).insert(node)
                }

                fn update(&self, node: &TreeNode) -> Result<(), StorageError> {
                    (**self).update(node)
                }

                fn find_root(&self, tree_id: &str) -> Result<TreeNode, StorageError> {
                    (**self).find_root(tree_id)
                }

                fn find_max_leaf_index(&self, tree_id: &str) -> Result<u64, StorageError> {
                    (**self).find_max_leaf_index(tree_id)
                }

                fn find_leaf_by_value(
                    &self,
                    tree_id: &str,
                    value: &str,
                ) -> Result<TreeNode, StorageError> {
                    (**self).find_leaf_by_value(tree_id, value)
                }

                fn find_nodes(
                    &self,
                    tree_id: &str,
                    positions: &[NodePosition],
                ) -> Result<NodeMap, StorageError> {
                    (**self).find_nodes(tree_id, positions)
                }

                fn find_nodes_by_level(
                    &self,
                    tree_id: &str,
                    level: u32,
                ) -> Result<Vec<TreeNode>, StorageError> {
                    (**self).find_nodes_by_level(tree_id, level)
                }
            }
        )*
    };
}

forward_node_storage!(&S, Box<S>, Arc<S>);
