//! The persisted tree node record and its addressing types.

use std::fmt;

use bincode::{Decode, Encode};

use crate::StorageError;

/// Length in bytes of a node digest.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte node hash.
///
/// Rendered as lowercase hex (no `0x` prefix) by `Display`; persisted as raw
/// bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Digest(bytes))
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Address of a node inside one tree: level 0 holds the leaves, indices run
/// left to right from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePosition {
    /// Distance from the leaves.
    pub level: u32,
    /// Position within the level.
    pub index: u64,
}

impl NodePosition {
    /// Create a position.
    pub const fn new(level: u32, index: u64) -> Self {
        NodePosition { level, index }
    }

    /// Whether this node is the right child of its parent.
    pub fn is_right_child(&self) -> bool {
        self.index % 2 == 1
    }

    /// The other child of the same parent: `index - 1` for odd indices,
    /// `index + 1` for even ones.
    pub fn sibling(&self) -> NodePosition {
        if self.is_right_child() {
            NodePosition::new(self.level, self.index - 1)
        } else {
            NodePosition::new(self.level, self.index + 1)
        }
    }

    /// The position one level up that covers this node.
    pub fn parent(&self) -> NodePosition {
        NodePosition::new(self.level + 1, self.index / 2)
    }
}

impl fmt::Display for NodePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.level, self.index)
    }
}

/// A persisted tree node.
///
/// Leaves (level 0) carry the raw value they were appended with and are
/// never modified after creation. Internal nodes carry no value and have
/// their digest recomputed in place by later appends.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct TreeNode {
    /// The tree this node belongs to.
    pub tree_id: String,
    /// Raw leaf payload; `None` for internal and root nodes.
    pub value: Option<String>,
    /// The node hash.
    pub digest: Digest,
    /// 0 for leaves, increasing toward the root.
    pub level: u32,
    /// Position within the level.
    pub index: u64,
}

impl TreeNode {
    /// A level-0 node holding `value`.
    pub fn leaf(
        tree_id: impl Into<String>,
        value: impl Into<String>,
        index: u64,
        digest: Digest,
    ) -> Self {
        TreeNode {
            tree_id: tree_id.into(),
            value: Some(value.into()),
            digest,
            level: 0,
            index,
        }
    }

    /// A value-less node above the leaves.
    pub fn internal(tree_id: impl Into<String>, position: NodePosition, digest: Digest) -> Self {
        TreeNode {
            tree_id: tree_id.into(),
            value: None,
            digest,
            level: position.level,
            index: position.index,
        }
    }

    /// Where this node sits in its tree.
    pub fn position(&self) -> NodePosition {
        NodePosition::new(self.level, self.index)
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Encode as a flat bincode record.
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| StorageError::Codec(format!("encode node {}: {}", self.position(), e)))
    }

    /// Decode a record written by [`TreeNode::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let (node, read): (TreeNode, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| StorageError::Codec(format!("decode node: {}", e)))?;
        if read != bytes.len() {
            return Err(StorageError::Codec(format!(
                "decode node: {} trailing bytes",
                bytes.len() - read
            )));
        }
        Ok(node)
    }
}
