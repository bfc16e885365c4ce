//! Key layout for keyed node storage.
//!
//! - node:  `{namespace}:tree:{tree_id}:level:{level}:no:{index}`
//! - leaf:  `{namespace}:tree:{tree_id}:node:{value}`
//! - counters: `{namespace}:tree:{tree_id}:meta:max_leaf` and
//!   `{namespace}:tree:{tree_id}:meta:top_level`, big-endian `u64`
//!
//! Tree ids may contain `:`; keys are parsed from the right.

use crate::{NodePosition, StorageError};

/// Key of the node at `position`.
pub fn node_key(namespace: &str, tree_id: &str, position: NodePosition) -> String {
    format!(
        "{}{}",
        level_prefix(namespace, tree_id, position.level),
        position.index
    )
}

/// Common prefix of every node key on `level`.
pub fn level_prefix(namespace: &str, tree_id: &str, level: u32) -> String {
    format!("{namespace}:tree:{tree_id}:level:{level}:no:")
}

/// Key of the leaf holding `value`.
pub fn leaf_value_key(namespace: &str, tree_id: &str, value: &str) -> String {
    format!("{namespace}:tree:{tree_id}:node:{value}")
}

/// Key of the largest leaf index written to `tree_id`.
pub fn max_leaf_key(namespace: &str, tree_id: &str) -> String {
    format!("{namespace}:tree:{tree_id}:meta:max_leaf")
}

/// Key of the highest level written to `tree_id`.
pub fn top_level_key(namespace: &str, tree_id: &str) -> String {
    format!("{namespace}:tree:{tree_id}:meta:top_level")
}

/// Split a node key back into its tree id and position.
pub fn parse_node_key(namespace: &str, key: &str) -> Result<(String, NodePosition), StorageError> {
    let malformed = || StorageError::KeyFormat(key.to_string());

    let rest = key
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix(":tree:"))
        .ok_or_else(malformed)?;

    let mut parts = rest.rsplitn(5, ':');
    let index = parts.next().ok_or_else(malformed)?;
    let no_tag = parts.next().ok_or_else(malformed)?;
    let level = parts.next().ok_or_else(malformed)?;
    let level_tag = parts.next().ok_or_else(malformed)?;
    let tree_id = parts.next().ok_or_else(malformed)?;
    if no_tag != "no" || level_tag != "level" || tree_id.is_empty() {
        return Err(malformed());
    }

    let level: u32 = level.parse().map_err(|_| malformed())?;
    let index: u64 = index.parse().map_err(|_| malformed())?;
    Ok((tree_id.to_string(), NodePosition::new(level, index)))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn node_keys_parse_back() {
        let key = node_key("merkletree", "1637704523306766336", NodePosition::new(10, 11));
        assert_eq!(key, "merkletree:tree:1637704523306766336:level:10:no:11");
        assert_eq!(
            parse_node_key("merkletree", &key).expect("parse"),
            (
                "1637704523306766336".to_string(),
                NodePosition::new(10, 11)
            )
        );
    }

    #[test]
    fn tree_ids_with_separators_survive() {
        let key = node_key("ns", "org:team:7", NodePosition::new(0, 3));
        assert_eq!(
            parse_node_key("ns", &key).expect("parse"),
            ("org:team:7".to_string(), NodePosition::new(0, 3))
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for key in [
            "other:tree:t:level:0:no:1",
            "ns:tree:t:level:x:no:1",
            "ns:tree:t:level:0:no:-1",
            "ns:tree:t:lvl:0:no:1",
            "ns:tree::level:0:no:1",
            "ns:tree:t:node:0xabc",
            "ns:tree:level:0",
        ] {
            assert_matches!(
                parse_node_key("ns", key),
                Err(StorageError::KeyFormat(k)) if k == key,
                "{key}"
            );
        }
    }

    #[test]
    fn level_prefix_does_not_cover_longer_levels() {
        let prefix = level_prefix("ns", "t", 1);
        assert!(node_key("ns", "t", NodePosition::new(1, 4)).starts_with(&prefix));
        assert!(!node_key("ns", "t", NodePosition::new(10, 4)).starts_with(&prefix));
    }
}
