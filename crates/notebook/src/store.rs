//! Shared key-value store.
//!
//! Every collection is kept as one serialized blob under a fixed key. Writers
//! replace the whole blob, so the last writer wins. Each successful `set`
//! publishes a [`StoreEvent`] to every subscriber of the same store so other
//! views can reload.

use notebook_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;
use tokio::sync::broadcast;

/// Key of the source registry blob.
pub const SOURCES_KEY: &str = "sources";

/// Key of the signed-in user blob.
pub const CURRENT_USER_KEY: &str = "currentUser";

const EVENT_CAPACITY: usize = 64;

/// Published after a key was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
}

/// Repository interface over the shared store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw blob stored under `key`.
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Replace the blob stored under `key` and notify subscribers.
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// JSON helpers available on every store.
pub trait JsonStoreExt: KeyValueStore {
    /// Read and deserialize `key`. A malformed blob is an error, not `None`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {}

fn publish(events: &broadcast::Sender<StoreEvent>, key: &str) {
    // No receivers is fine: nobody is listening yet.
    let _ = events.send(StoreEvent {
        key: key.to_string(),
    });
}

/// In-process store, shared by views in the same process.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AppError::Store("Memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| AppError::Store("Memory store lock poisoned".to_string()))?;
            entries.insert(key.to_string(), value.to_string());
        }
        publish(&self.events, key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Directory-backed store: one `<key>.json` file per key.
///
/// Each write goes to its own temporary sibling and is renamed into place, so
/// a reader never sees a half-written blob.
pub struct FileStore {
    dir: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AppError::Store(format!("Failed to create store directory {:?}: {}", dir, e))
        })?;

        tracing::debug!("Opened file store at {:?}", dir);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { dir, events })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::Store(format!("Invalid store key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| AppError::Store(format!("Failed to read {:?}: {}", path, e)))?;
        Ok(Some(raw))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.key_path(key)?;

        // Unique temp file per write; concurrent writers never share one
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| {
            AppError::Store(format!("Failed to create temp file in {:?}: {}", self.dir, e))
        })?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| AppError::Store(format!("Failed to write {:?}: {}", tmp.path(), e)))?;
        tmp.persist(&path)
            .map_err(|e| AppError::Store(format!("Failed to replace {:?}: {}", path, e)))?;

        tracing::debug!(key, bytes = value.len(), "Stored blob");
        publish(&self.events, key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip_and_events() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        assert_eq!(store.get(SOURCES_KEY).unwrap(), None);
        store.set(SOURCES_KEY, "[]").unwrap();

        assert_eq!(store.get(SOURCES_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(events.try_recv().unwrap().key, SOURCES_KEY);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_set_without_subscribers_succeeds() {
        let store = MemoryStore::new();
        assert!(store.set("k", "v").is_ok());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp = TempDir::new().unwrap();

        let first = FileStore::open(temp.path().join("store")).unwrap();
        first.set(SOURCES_KEY, r#"[{"a":1}]"#).unwrap();

        let second = FileStore::open(temp.path().join("store")).unwrap();
        assert_eq!(
            second.get(SOURCES_KEY).unwrap().as_deref(),
            Some(r#"[{"a":1}]"#)
        );
        // Only the blob itself is left behind
        let files: Vec<_> = std::fs::read_dir(first.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, ["sources.json"]);
    }

    #[test]
    fn test_file_store_concurrent_writers() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(temp.path()).unwrap());

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for round in 0..100 {
                        let blob = format!(r#"[{{"writer":{},"round":{}}}]"#, writer, round);
                        store.set(SOURCES_KEY, &blob).unwrap();

                        let seen = store.get(SOURCES_KEY).unwrap().unwrap();
                        serde_json::from_str::<serde_json::Value>(&seen).unwrap();
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        let last = store.get(SOURCES_KEY).unwrap().unwrap();
        assert!(last.ends_with(r#""round":99}]"#));
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_store_missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get(CURRENT_USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(AppError::Store(_))));
        assert!(matches!(store.get(""), Err(AppError::Store(_))));
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        store.set_json("numbers", &vec![1, 2, 3]).unwrap();
        let numbers: Option<Vec<u32>> = store.get_json("numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        store.set("numbers", "{broken").unwrap();
        let result: AppResult<Option<Vec<u32>>> = store.get_json("numbers");
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }
}
