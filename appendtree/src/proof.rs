//! Membership proofs.
//!
//! A proof is the list of sibling digests met on the way from a leaf to the
//! root, lowest level first. Levels where the path node had no sibling
//! contribute nothing. Because [`branch_hash`] ignores argument order, the
//! verifier does not need to know which side each sibling was on.

use appendtree_storage::{Digest, NodeStorage};
use tracing::{debug, instrument};

use crate::{
    Result,
    hash::{branch_hash, leaf_digest},
    tree::MerkleTree,
};

/// Fold `proof` into the leaf digest of `value`. `None` when `value` is not
/// a valid address.
pub fn compute_root(proof: &[Digest], value: &str) -> Option<Digest> {
    let leaf = leaf_digest(value).ok()?;
    Some(
        proof
            .iter()
            .fold(leaf, |running, sibling| branch_hash(&running, sibling)),
    )
}

/// Check `proof` for `value` against a root digest obtained elsewhere.
pub fn verify_proof(proof: &[Digest], value: &str, root: &Digest) -> bool {
    compute_root(proof, value).is_some_and(|computed| &computed == root)
}

impl<S: NodeStorage + ?Sized> MerkleTree<S> {
    /// Sibling digests proving that `value` is a leaf of this tree.
    ///
    /// Empty when `value` was never appended. A single-leaf tree also yields
    /// an empty proof, which still verifies.
    #[instrument(skip(self), fields(tree_id = %self.tree_id()))]
    pub fn generate_proof(&self, value: &str) -> Result<Vec<Digest>> {
        let Some(leaf) = self.get_leaf(value)? else {
            debug!("value not in tree");
            return Ok(Vec::new());
        };
        let Some(root_level) = self.root_level()? else {
            return Ok(Vec::new());
        };

        let nodes = self.load_path(leaf.index, root_level)?;
        let mut proof = Vec::with_capacity(root_level as usize + 1);
        let mut position = leaf.position();
        loop {
            if let Some(sibling) = nodes.get(&position.sibling()) {
                proof.push(sibling.digest);
            }
            if position.level >= root_level {
                break;
            }
            position = position.parent();
        }
        debug!(index = leaf.index, len = proof.len(), "generated proof");
        Ok(proof)
    }

    /// Whether `proof` leads from `value` to the current root.
    ///
    /// `false` for a malformed value or an empty tree; only storage failures
    /// are errors.
    #[instrument(skip(self, proof), fields(tree_id = %self.tree_id(), proof_len = proof.len()))]
    pub fn verify(&self, proof: &[Digest], value: &str) -> Result<bool> {
        let Some(computed) = compute_root(proof, value) else {
            return Ok(false);
        };
        Ok(self.root_digest()? == Some(computed))
    }
}
