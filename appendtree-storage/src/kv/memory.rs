use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use super::KeyValueStore;
use crate::StorageError;

/// Ordered in-memory key space.
///
/// Stands in for a remote key/value server in tests and ephemeral runs.
#[derive(Default, Debug)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Backend("memory key space lock poisoned".into())
}

impl MemoryKv {
    /// An empty key space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key currently stored, in ascending order.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect())
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_prefix_stops_at_prefix_boundary() {
        let kv = MemoryKv::new();
        for key in ["a:1", "a:2", "a:10", "ab:1", "b:1"] {
            kv.set(key, key.as_bytes()).expect("set");
        }
        assert_eq!(
            kv.scan_prefix("a:").expect("scan"),
            vec!["a:1", "a:10", "a:2"]
        );
        assert!(kv.scan_prefix("c").expect("scan").is_empty());
        assert_eq!(kv.get("ab:1").expect("get"), Some(b"ab:1".to_vec()));
        assert_eq!(kv.get("zz").expect("get"), None);
    }
}
