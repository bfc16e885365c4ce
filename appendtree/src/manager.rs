//! Entry point binding a storage backend to tree handles.

use std::sync::Arc;

use appendtree_storage::{MemoryStorage, NodeStorage};
use tracing::debug;

use crate::{Error, Result, tree::MerkleTree};

/// Hands out [`MerkleTree`] handles that all share one storage backend.
///
/// Trees are partitioned by id inside the backend; creating a handle
/// writes nothing, so "creating" an id that already holds nodes simply
/// reopens that tree.
pub struct TreeManager<S: ?Sized> {
    storage: Arc<S>,
}

impl<S: ?Sized> Clone for TreeManager<S> {
    fn clone(&self) -> Self {
        TreeManager {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl TreeManager<MemoryStorage> {
    /// Manager over a fresh in-process store.
    pub fn in_memory() -> Self {
        TreeManager::new(MemoryStorage::new())
    }
}

impl<S: NodeStorage> TreeManager<S> {
    /// Take ownership of `storage`.
    pub fn new(storage: S) -> Self {
        TreeManager {
            storage: Arc::new(storage),
        }
    }
}

impl<S: NodeStorage + ?Sized> TreeManager<S> {
    /// Use a storage that is already shared elsewhere, including trait
    /// objects such as `Arc<dyn NodeStorage + Send + Sync>`.
    pub fn from_shared(storage: Arc<S>) -> Self {
        TreeManager { storage }
    }

    /// The shared backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Handle for the tree named `tree_id`.
    ///
    /// Ids must be non-empty.
    pub fn create_tree(&self, tree_id: impl Into<String>) -> Result<MerkleTree<S>> {
        let tree_id = tree_id.into();
        if tree_id.is_empty() {
            return Err(Error::InvalidInput("tree id must not be empty".to_owned()));
        }
        debug!(%tree_id, "opened tree");
        Ok(MerkleTree::new(Arc::clone(&self.storage), tree_id))
    }
}
