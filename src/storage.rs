use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value persistence collaborator for the favorites module.
///
/// Implementations are expected to be cheap to call per operation; the
/// favorites code treats every call as a short synchronous scoped access.
/// Failures are reported through the return values, never panics.
pub trait KeyValueStore {
    /// Returns the stored value for `key`, or None if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, returning whether the write succeeded
    fn set(&self, key: &str, value: &str) -> bool;

    /// Whether the backing store can currently be used at all
    fn available(&self) -> bool {
        true
    }
}

/// File-backed store: a single JSON object of string keys and values,
/// re-read and rewritten on every access.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStore { path: path.as_ref().to_path_buf() }
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        match serde_json::to_string_pretty(&map) {
            Ok(raw) => fs::write(&self.path, raw).is_ok(),
            Err(_) => false,
        }
    }

    fn available(&self) -> bool {
        // Usable if the file's directory exists; the file itself is created
        // on first write
        self.path.parent().map(Path::exists).unwrap_or(true)
    }
}

/// In-memory store. Used by tests and wherever no persistence is wanted;
/// the availability flag simulates a blocked or disabled backend.
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn unavailable() -> Self {
        MemoryStore { values: RefCell::new(BTreeMap::new()), unavailable: true }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        if self.unavailable {
            return None;
        }
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        if self.unavailable {
            return false;
        }
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        true
    }

    fn available(&self) -> bool {
        !self.unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.available());
        assert_eq!(store.get("missing"), None);
        assert!(store.set("k", "v"));
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn unavailable_memory_store_rejects_everything() {
        let store = MemoryStore::unavailable();
        assert!(!store.available());
        assert!(!store.set("k", "v"));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));
        assert!(store.available());
        assert_eq!(store.get("favorites"), None);
        assert!(store.set("favorites", "[]"));
        assert!(store.set("filter", "true"));
        assert_eq!(store.get("favorites").as_deref(), Some("[]"));
        assert_eq!(store.get("filter").as_deref(), Some("true"));

        // A second handle over the same file sees the persisted values
        let reopened = FileStore::new(dir.path().join("store.json"));
        assert_eq!(reopened.get("filter").as_deref(), Some("true"));
    }

    #[test]
    fn file_store_in_missing_directory_is_unavailable() {
        let store = FileStore::new("/nonexistent-dir/store.json");
        assert!(!store.available());
        assert!(!store.set("k", "v"));
    }
}
