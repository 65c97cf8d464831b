//! store
//!
//! Host key-value storage abstraction.
//!
//! # Architecture
//!
//! The credential record and the session flag are read and written through
//! the [`KeyValueStore`] trait, which stands in for the host page's local
//! storage. Implementations:
//!
//! - [`MemoryStore`]: process memory (headless host, tests)
//! - [`FileStore`]: JSON file on disk, atomic writes, 0600 on Unix
//!
//! # Provider Selection
//!
//! ```
//! use sso_bridge::store::create_store;
//!
//! let store = create_store("memory", None).unwrap();
//! assert!(store.get("anything").unwrap().is_none());
//! ```

mod file_store;
mod memory;
mod traits;

use std::path::Path;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, StoreError};

/// The default store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Valid provider names, for config validation.
pub const PROVIDERS: &[&str] = &["file", "memory"];

/// Create a store based on the provider name.
///
/// `path` overrides the default location for the `file` provider and is
/// ignored by `memory`.
pub fn create_store(
    provider: &str,
    path: Option<&Path>,
) -> Result<Box<dyn KeyValueStore>, StoreError> {
    match provider {
        "file" => match path {
            Some(p) => Ok(Box::new(FileStore::with_path(p.to_path_buf()))),
            None => Ok(Box::new(FileStore::new()?)),
        },
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => Err(StoreError::ProviderNotAvailable(format!(
            "unknown store provider: '{}' (valid: {})",
            other,
            PROVIDERS.join(", ")
        ))),
    }
}
