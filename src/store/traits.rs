//! store::traits
//!
//! Key-value storage trait definition.
//!
//! # Design
//!
//! `KeyValueStore` models the host's local storage: flat string keys mapped
//! to string values. The credential record and the session flag both live
//! here. Values are often JSON documents; the store never interprets them.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log or include stored values in error messages (they carry tokens)
//! - Be thread-safe (Send + Sync)
//!
//! # Example
//!
//! ```
//! use sso_bridge::store::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set("pin_validated", "true").unwrap();
//! assert!(store.exists("pin_validated").unwrap());
//! store.remove("pin_validated").unwrap();
//! assert!(store.get("pin_validated").unwrap().is_none());
//! ```

use thiserror::Error;

/// Errors from storage operations.
///
/// Note: Error messages intentionally do not include stored values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read from storage.
    #[error("failed to read store: {0}")]
    ReadError(String),

    /// Failed to write to storage.
    #[error("failed to write store: {0}")]
    WriteError(String),

    /// Failed to acquire the store's write lock.
    #[error("store is locked: {0}")]
    Locked(String),

    /// Provider not available or not configured.
    #[error("store provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Trait for host key-value storage.
///
/// Keys are stored as-is without interpretation.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value, overwriting any existing value for the key.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key.
    ///
    /// Returns `Ok(())` even if the key did not exist.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StoreError::ReadError("disk full".into());
        assert!(err.to_string().contains("read"));

        let err = StoreError::WriteError("permission denied".into());
        assert!(err.to_string().contains("write"));

        let err = StoreError::Locked("held by pid 42".into());
        assert!(err.to_string().contains("locked"));

        let err = StoreError::ProviderNotAvailable("indexeddb".into());
        assert!(err.to_string().contains("provider"));
    }
}
