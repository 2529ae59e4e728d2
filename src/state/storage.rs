//! Durable client storage for the session credentials.
//!
//! ARCHITECTURE
//! ============
//! Storage is a string key-value store, the same shape as browser
//! `localStorage`: one entry holds the raw bearer token, another holds the
//! JSON-encoded user. Backends expose multi-key writes so the token and user
//! are always replaced together.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::net::types::User;

pub const TOKEN_STORAGE_KEY: &str = "accessToken";
pub const USER_STORAGE_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Process-wide string storage that survives restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read or decoded.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write every entry or none of them. Entries not named are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if existing entries cannot be read or the write
    /// fails; previous values are then intact.
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove the given keys. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with raw entries, e.g. to simulate a previous run.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let map = entries.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Self { entries: Mutex::new(map) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut map = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        for (key, value) in entries {
            map.insert((*key).to_owned(), (*value).to_owned());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON object on disk, rewritten whole through a temp file and rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_map()?.remove(key))
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert((*key).to_owned(), (*value).to_owned());
        }
        self.write_map(&map)
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        // A corrupt file is replaced rather than preserved.
        let mut map = self.read_map().unwrap_or_default();
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// What a previous run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Hydration {
    Empty,
    Valid { token: String, user: User },
    /// Partial, unparseable, or missing required user fields.
    Malformed,
}

pub(crate) fn load_credentials(store: &dyn KeyValueStore) -> Hydration {
    let token = store.get(TOKEN_STORAGE_KEY);
    let user = store.get(USER_STORAGE_KEY);
    match (token, user) {
        (Ok(None), Ok(None)) => Hydration::Empty,
        (Ok(Some(token)), Ok(Some(raw_user))) if !token.trim().is_empty() => {
            match serde_json::from_str::<User>(&raw_user) {
                Ok(user) if user.is_well_formed() => Hydration::Valid { token, user },
                Ok(_) => Hydration::Malformed,
                Err(e) => {
                    tracing::debug!(error = %e, "stored user record failed to parse");
                    Hydration::Malformed
                }
            }
        }
        _ => Hydration::Malformed,
    }
}

pub(crate) fn save_credentials(store: &dyn KeyValueStore, token: &str, user: &User) -> Result<(), StorageError> {
    let user_json = serde_json::to_string(user)?;
    store.set_all(&[(TOKEN_STORAGE_KEY, token), (USER_STORAGE_KEY, &user_json)])
}

pub(crate) fn save_user(store: &dyn KeyValueStore, user: &User) -> Result<(), StorageError> {
    let user_json = serde_json::to_string(user)?;
    store.set_all(&[(USER_STORAGE_KEY, &user_json)])
}

pub(crate) fn clear_credentials(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove_all(&[TOKEN_STORAGE_KEY, USER_STORAGE_KEY])
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
