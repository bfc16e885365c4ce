//! Which stored nodes an append or a proof walk has to look at.

use appendtree_storage::NodePosition;

/// Positions of the path from leaf `leaf_index` up to `root_level`, each
/// followed by its sibling:
///
/// `[(0, i), sib(0, i), (1, i/2), sib(1, i/2), …, (root_level, i >> root_level), sib]`
///
/// Level 0 is always included, even for a tree whose root is a leaf.
/// Siblings are listed whether or not they exist yet.
pub fn sibling_chain(leaf_index: u64, root_level: u32) -> Vec<NodePosition> {
    let mut chain = Vec::with_capacity(2 * (root_level as usize + 1));
    let mut position = NodePosition::new(0, leaf_index);
    loop {
        chain.push(position);
        chain.push(position.sibling());
        if position.level >= root_level {
            break;
        }
        position = position.parent();
    }
    chain
}
