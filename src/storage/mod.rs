//! Key-value storage backing the persisted client state
//!
//! The client keeps everything under a handful of string keys holding
//! JSON text, the same shape browser local storage gave the web
//! front-end. `SledStore` is the on-disk implementation; `MemoryStore`
//! keeps values in memory and can be told to refuse writes.

use crate::error::{MyAiError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub mod memory;
pub use memory::MemoryStore;

/// Environment variable overriding the on-disk store location
pub const STORAGE_PATH_ENV: &str = "MYAI_STORAGE_DB";

/// String-keyed storage of JSON text
pub trait KeyValueStore: Send {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// On-disk store using an embedded `sled` database
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Open the store at the default location
    ///
    /// Uses `MYAI_STORAGE_DB` when set, otherwise `state.db` in the
    /// user's data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STORAGE_PATH_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "myai", "myai")
            .ok_or_else(|| MyAiError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("state.db"))
    }

    /// Open (or create) the store at `path`
    ///
    /// # Examples
    ///
    /// ```
    /// use myai::storage::{KeyValueStore, SledStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledStore::new_with_path(dir.path().join("state.db")).unwrap();
    /// store.set("greeting", "\"hi\"").unwrap();
    /// assert_eq!(store.get("greeting").unwrap().as_deref(), Some("\"hi\""));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MyAiError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let db = sled::open(&path)
            .map_err(|e| MyAiError::Storage(format!("Failed to open storage: {}", e)))?;

        tracing::debug!("Opened state store at {}", path.display());
        Ok(Self { db, path })
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key)
            .map_err(|e| MyAiError::Storage(format!("Failed to read {}: {}", key, e)))?;

        match value {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    MyAiError::Storage(format!("Stored value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key, value.as_bytes())
            .map_err(|e| MyAiError::Storage(format!("Failed to write {}: {}", key, e)))?;
        self.db
            .flush()
            .map_err(|e| MyAiError::Storage(format!("Failed to flush storage: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key)
            .map_err(|e| MyAiError::Storage(format!("Failed to remove {}: {}", key, e)))?;
        Ok(())
    }
}
