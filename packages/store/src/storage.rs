//! The storage seam every persistence backend implements.

use thiserror::Error;

/// Errors raised by a [`ClientStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached (no `window`, storage disabled, quota).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Synchronous string key/value storage that survives reloads.
///
/// Session teardown completes before any navigation, so every call returns
/// immediately.
pub trait ClientStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
