use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::error::ConsoleError;

const STORAGE_FILE: &str = "storage.json";

// 1. KeyValueStore Contract
/// KeyValueStore
///
/// The durable key-value contract the session persists its token through.
/// Mirrors browser local storage: string keys, string values, last write wins.
/// The trait lets tests swap the file-backed store for the in-memory one.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never set or was removed.
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError>;

    /// Deletes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), ConsoleError>;
}

// 2. The Real Implementation (JSON file on disk)
/// FileStore
///
/// The durable store used by the CLI. Keeps all items in a single JSON object
/// of string keys to string values at `<dir>/storage.json`, e.g.
/// `{ "token": "eyJhbGciOi..." }`.
///
/// - **Reads:** a missing or empty document reads as an empty store.
/// - **Writes:** the whole document is rewritten through
///   `storage.json.tmp` and a rename, so a crash mid-write leaves the
///   previous document intact.
/// - **Concurrency:** read-modify-write cycles are serialized within the
///   process. Two processes sharing one directory resolve last-write-wins.
///
/// The bearer token is stored in plain text. Point `HARBOR_STATE_DIR` at a
/// directory only the operator can read.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    /// open
    ///
    /// Opens the store rooted at `dir`, creating the directory (and any
    /// missing parents) if needed. The document itself is created lazily by
    /// the first write.
    ///
    /// # Arguments
    /// * `dir`: The state directory, usually `ConsoleConfig::state_dir`.
    ///
    /// # Errors
    /// `ConsoleError::Storage` when the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ConsoleError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(STORAGE_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ConsoleError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            ConsoleError::Storage(format!("{} is corrupt: {e}", self.path.display()))
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), ConsoleError> {
        let encoded =
            serde_json::to_vec_pretty(items).map_err(|e| ConsoleError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        let _guard = self.lock.lock();
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), ConsoleError> {
        let _guard = self.lock.lock();
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

// 3. The In-Memory Implementation (For Tests)
/// MemoryStore
///
/// A process-local store used by unit and integration tests. Can be
/// pre-seeded, and can be told to fail every operation to exercise storage
/// error paths.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            should_fail: true,
        }
    }

    /// Builds a store that already holds `key = value`.
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.items.lock().insert(key.to_string(), value.to_string());
        store
    }

    fn check(&self) -> Result<(), ConsoleError> {
        if self.should_fail {
            return Err(ConsoleError::Storage(
                "memory store failure: simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        self.check()?;
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        self.check()?;
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), ConsoleError> {
        self.check()?;
        self.items.lock().remove(key);
        Ok(())
    }
}

/// StorageState
///
/// The shared handle every component uses to reach durable storage.
pub type StorageState = Arc<dyn KeyValueStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        store.set_item("token", "abc").unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_item("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn file_store_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.remove_item("token").unwrap();
        assert!(!store.path().exists());

        store.set_item("token", "abc").unwrap();
        store.remove_item("token").unwrap();
        assert_eq!(store.get_item("token").unwrap(), None);
    }

    #[test]
    fn file_store_reports_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(
            store.get_item("token"),
            Err(ConsoleError::Storage(_))
        ));
    }

    #[test]
    fn failing_memory_store_rejects_everything() {
        let store = MemoryStore::new_failing();
        assert!(store.get_item("token").is_err());
        assert!(store.set_item("token", "x").is_err());
        assert!(store.remove_item("token").is_err());
    }
}
