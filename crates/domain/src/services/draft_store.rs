//! Key/value storage for in-progress wizard drafts.
//!
//! A draft is one JSON document stored under a fixed key. The store is
//! injected so tests can use memory and a client can use disk.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Key under which the registration wizard keeps its draft.
pub const REGISTRATION_DRAFT_KEY: &str = "dental_registration_draft";

/// Draft storage errors.
#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("Draft storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid draft key: {0}")]
    InvalidKey(String),

    #[error("Draft storage lock poisoned")]
    Poisoned,
}

/// get/set/clear over string values. Last writer wins.
pub trait DraftStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError>;
    fn clear(&self, key: &str) -> Result<(), DraftStoreError>;
}

/// Process-local draft store.
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for InMemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        let entries = self.entries.lock().map_err(|_| DraftStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
        let mut entries = self.entries.lock().map_err(|_| DraftStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), DraftStoreError> {
        let mut entries = self.entries.lock().map_err(|_| DraftStoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Draft store backed by one `<key>.json` file per key in a directory.
///
/// Survives process restarts.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// Creates the store, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DraftStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DraftStoreError> {
        let allowed = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !allowed {
            return Err(DraftStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DraftStoreError> {
        let path = self.path_for(key)?;
        // Readers never observe a partially written draft.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), DraftStoreError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
