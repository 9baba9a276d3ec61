//! Durable key-value persistence for minor UI state.
//!
//! The store holds independent JSON values under well-known keys. Absent and
//! corrupt entries are equivalent (decode to nothing, defaults apply), and
//! writes are fire-and-forget: a failing backend is logged and never aborts
//! the user action that triggered the write.

use crate::{Result, WaymarkError};
use fxhash::FxHashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Well-known store keys, each independently optional
pub mod keys {
    pub const STYLE: &str = "style";
    pub const VIEW: &str = "view";
    pub const POSITION: &str = "position";
    pub const DESTINATION: &str = "destination";
}

/// Pluggable persistence backend
pub trait StateStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Decode a stored value. Absent and corrupt entries both come back as
/// `None`; corruption is logged and otherwise treated as absence.
pub fn get_as<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            log::warn!("discarding corrupt store entry {}: {}", key, e);
            None
        }
    }
}

/// Persist a value, swallowing backend failures (logged, never propagated).
pub fn persist<T: Serialize>(store: &mut dyn StateStore, key: &str, value: &T) {
    let encoded = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("failed to encode store entry {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = store.set(key, encoded) {
        log::warn!("failed to persist store entry {}: {}", key, e);
    }
}

/// Drop a key, swallowing backend failures like [`persist`].
pub fn forget(store: &mut dyn StateStore, key: &str) {
    if let Err(e) = store.remove(key) {
        log::warn!("failed to remove store entry {}: {}", key, e);
    }
}

/// In-memory store for tests and hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object per store, rewritten on every change.
/// A missing file is an empty store; an unreadable one is logged and treated
/// as empty rather than failing the session.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: FxHashMap<String, Value>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("state file {} is corrupt, starting empty: {}", path.display(), e);
                    FxHashMap::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FxHashMap::default(),
            Err(e) => {
                log::warn!("state file {} unreadable, starting empty: {}", path.display(), e);
                FxHashMap::default()
            }
        };
        Self { path, entries }
    }

    fn flush(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, raw).map_err(|e| {
            WaymarkError::Storage(format!("writing {}: {}", self.path.display(), e))
        })
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        persist(&mut store, keys::STYLE, &2usize);
        assert_eq!(get_as::<usize>(&store, keys::STYLE), Some(2));

        forget(&mut store, keys::STYLE);
        assert_eq!(get_as::<usize>(&store, keys::STYLE), None);
    }

    #[test]
    fn test_corrupt_entry_reads_as_absent() {
        let mut store = MemoryStore::new();
        store.set(keys::STYLE, json!("not-an-index")).unwrap();
        assert_eq!(get_as::<usize>(&store, keys::STYLE), None);
    }

    #[test]
    fn test_file_store_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let mut store = FileStore::open(&path);
            persist(&mut store, keys::STYLE, &1usize);
            persist(&mut store, keys::VIEW, &json!({"zoom": 4.0}));
        }

        let store = FileStore::open(&path);
        assert_eq!(get_as::<usize>(&store, keys::STYLE), Some(1));
        assert!(store.get(keys::VIEW).is_some());
        assert!(store.get(keys::DESTINATION).is_none());
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{{{{").unwrap();

        let store = FileStore::open(&path);
        assert!(store.get(keys::STYLE).is_none());
    }
}
