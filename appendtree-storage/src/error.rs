//! Error types for node storage backends.

use thiserror::Error;

/// Errors returned by [`NodeStorage`](crate::NodeStorage) implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No such node, leaf or tree. Expected and benign; callers branch on it.
    #[error("not found")]
    NotFound,
    /// A stored key could not be parsed back into `(tree_id, level, index)`.
    #[error("malformed storage key: {0}")]
    KeyFormat(String),
    /// A stored record could not be encoded or decoded.
    #[error("node codec error: {0}")]
    Codec(String),
    /// Any other backend failure (I/O, connectivity, lock poisoning).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether this is the benign [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}

/// Turns a `NotFound` outcome into `Ok(None)`, leaving real failures alone.
pub trait OptionalExt<T> {
    /// `Ok(v)` → `Ok(Some(v))`, `Err(NotFound)` → `Ok(None)`, other errors
    /// pass through.
    fn optional(self) -> Result<Option<T>, StorageError>;
}

impl<T> OptionalExt<T> for Result<T, StorageError> {
    fn optional(self) -> Result<Option<T>, StorageError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn optional_maps_only_not_found() {
        let found: Result<u8, StorageError> = Ok(3);
        assert_matches!(found.optional(), Ok(Some(3)));

        let missing: Result<u8, StorageError> = Err(StorageError::NotFound);
        assert_matches!(missing.optional(), Ok(None));

        let broken: Result<u8, StorageError> = Err(StorageError::Backend("down".into()));
        assert_matches!(broken.optional(), Err(StorageError::Backend(msg)) if msg == "down");
    }
}
