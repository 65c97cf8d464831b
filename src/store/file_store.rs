//! store::file_store
//!
//! File-backed key-value storage.
//!
//! # Security
//!
//! - Entries are stored as a JSON object at the configured path
//!   (default `~/.sso-bridge/storage.json`)
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - Read-modify-write cycles hold an exclusive lock on a sibling `.lock` file
//! - Values are NEVER logged, printed, or included in error messages
//!
//! # Example
//!
//! ```no_run
//! use sso_bridge::store::{FileStore, KeyValueStore};
//!
//! let store = FileStore::new().unwrap();
//! store.set("pin_validated", "true").unwrap();
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use fs2::FileExt;

use super::traits::{KeyValueStore, StoreError};

/// File-backed key-value store.
#[derive(Debug)]
pub struct FileStore {
    /// Path to the storage file
    path: PathBuf,
}

impl FileStore {
    /// Create a file store at the default location, `~/.sso-bridge/storage.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, StoreError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StoreError::ReadError("cannot determine home directory".into()))?;
        Ok(Self {
            path: home.join(".sso-bridge").join("storage.json"),
        })
    }

    /// Create a file store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the path to the storage file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::ReadError(format!("cannot read store file: {}", e)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| StoreError::ReadError(format!("cannot parse store file: {}", e)))
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::WriteError(format!("cannot serialize store: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| StoreError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict permissions before any content lands on disk
            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    StoreError::WriteError(format!("cannot set permissions: {}", e))
                })?;
            }

            file.write_all(content.as_bytes())
                .map_err(|e| StoreError::WriteError(format!("cannot write store: {}", e)))?;
            file.sync_all()
                .map_err(|e| StoreError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| StoreError::WriteError(format!("cannot rename temp file: {}", e)))
    }

    /// Run a read-modify-write cycle under the exclusive lock file.
    fn modify<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let lock = File::create(self.lock_path())
            .map_err(|e| StoreError::Locked(format!("cannot open lock file: {}", e)))?;
        lock.lock_exclusive()
            .map_err(|e| StoreError::Locked(format!("cannot acquire lock: {}", e)))?;

        let result = self.read_entries().and_then(|mut entries| {
            f(&mut entries);
            self.write_entries(&entries)
        });

        // Unlock errors are not actionable; the lock drops with the handle anyway.
        let _ = lock.unlock();
        result
    }

    /// Verify file permissions are 0600 (Unix only).
    ///
    /// Returns true if the file doesn't exist yet.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(true);
        }
        let metadata = fs::metadata(&self.path)
            .map_err(|e| StoreError::ReadError(format!("cannot read file metadata: {}", e)))?;
        Ok(metadata.permissions().mode() & 0o777 == 0o600)
    }

    /// Verify file permissions (non-Unix always returns true).
    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileStore::with_path(temp.path().join("storage.json"));
        (temp, store)
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get("nonexistent").expect("get").is_none());
    }

    #[test]
    fn set_and_get() {
        let (_temp, store) = create_test_store();
        store.set("servercredentials3", r#"{"Servers":[]}"#).expect("set");
        assert_eq!(
            store.get("servercredentials3").expect("get"),
            Some(r#"{"Servers":[]}"#.to_string())
        );
    }

    #[test]
    fn remove_existing_and_missing() {
        let (_temp, store) = create_test_store();
        store.set("pin_validated", "true").expect("set");
        store.remove("pin_validated").expect("remove");
        assert!(store.get("pin_validated").expect("get").is_none());

        store.remove("pin_validated").expect("remove missing");
    }

    #[test]
    fn creates_directory_if_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nested").join("storage.json");
        let store = FileStore::with_path(path.clone());

        store.set("key", "value").expect("set");
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_0600_on_unix() {
        let (_temp, store) = create_test_store();
        assert!(store.verify_permissions().expect("verify before write"));

        store.set("key", "value").expect("set");

        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(store.verify_permissions().expect("verify after write"));
    }

    #[test]
    fn malformed_file_is_a_read_error() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), "{ not json").expect("write garbage");

        let err = store.get("key").unwrap_err();
        assert!(matches!(err, StoreError::ReadError(_)));
        assert!(err.to_string().contains("cannot parse"));
    }

    #[test]
    fn persistence_across_instances() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("storage.json");

        FileStore::with_path(path.clone())
            .set("key", "value")
            .expect("set");

        let reopened = FileStore::with_path(path);
        assert_eq!(reopened.get("key").expect("get"), Some("value".to_string()));
    }
}
