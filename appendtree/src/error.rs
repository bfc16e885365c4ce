use appendtree_storage::StorageError;
use thiserror::Error;

/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by tree operations.
///
/// Benign "not found" outcomes never reach this type: they become empty
/// proofs, `false` verifications or `None` lookups.
#[derive(Debug, Error)]
pub enum Error {
    /// The value failed format validation; nothing was written.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A storage failure, passed through unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Stored nodes contradict each other.
    #[error("inconsistent tree: {0}")]
    InconsistentTree(String),
}
