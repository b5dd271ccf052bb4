//! Durable client-side key-value storage.
//!
//! Plays the role a browser's local storage plays for a web client: string
//! keys mapped to string values, surviving restarts. The file-backed store
//! keeps everything in a single JSON object:
//!
//! ```text
//! <DATA_DIR>/storage.json
//! {
//!   "shoppingList": "[{\"name\":\"Flour\", ...}]",
//!   "checkedIngredients/<recipe-id>": "[\"Flour\"]",
//!   "token": "...",
//!   "user": "{...}"
//! }
//! ```
//!
//! Storage is best-effort. A missing or corrupt file reads as empty; write
//! failures are reported to the caller, who decides whether they matter.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when writing client storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    #[error("failed to encode storage: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;
}

/// Store backed by one JSON file.
///
/// Every operation goes back to disk, so several handles on the same file
/// (a session and a shopping list, or two CLI invocations) see each
/// other's writes. Concurrent writers are last-writer-wins per file write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub const FILENAME: &'static str = "storage.json";

    /// Opens the store inside `data_dir`. The file is created lazily.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt storage file {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Io(parent.to_path_buf(), e))?;
        }

        let contents = serde_json::to_string_pretty(map)?;

        // Replace the file atomically
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| StorageError::Io(tmp.clone(), e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(self.path.clone(), e))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map();
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map)
    }

    fn keys(&self) -> Vec<String> {
        self.read_map().into_keys().collect()
    }
}

/// Volatile store, for tests and for running without a data directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}
