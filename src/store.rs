//! Local persistence for small typed records.
//!
//! A [`Storage`] holds every record of one type under a namespace (for
//! profiles, `"Profile"`). The namespace is serialized as a single JSON
//! object `key -> record` and handed to a [`KeyValueStore`] backend.

use crate::error::{PublishError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Backend that stores one serialized blob per namespace.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob for a namespace, if any.
    fn read(&self, namespace: &str) -> Result<Option<String>>;

    /// Replace the blob for a namespace.
    fn write(&self, namespace: &str, data: &str) -> Result<()>;

    /// Delete the blob for a namespace. Deleting a missing namespace is fine.
    fn delete(&self, namespace: &str) -> Result<()>;
}

/// Stores each namespace as `<dir>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the namespace files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, namespace: &str) -> Result<PathBuf> {
        if namespace.is_empty()
            || namespace.contains(['/', '\\'])
            || namespace.starts_with('.')
        {
            return Err(PublishError::Storage {
                message: format!("Invalid storage namespace: {:?}", namespace),
            });
        }
        Ok(self.dir.join(format!("{}.json", namespace)))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, namespace: &str) -> Result<Option<String>> {
        let path = self.path_for(namespace)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, namespace: &str, data: &str) -> Result<()> {
        let path = self.path_for(namespace)?;
        fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves a half-written namespace.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, namespace: &str) -> Result<()> {
        let path = self.path_for(namespace)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.data.lock().map_err(|_| PublishError::Storage {
            message: "Memory store lock poisoned".into(),
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, namespace: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(namespace).cloned())
    }

    fn write(&self, namespace: &str, data: &str) -> Result<()> {
        self.lock()?.insert(namespace.to_string(), data.to_string());
        Ok(())
    }

    fn delete(&self, namespace: &str) -> Result<()> {
        self.lock()?.remove(namespace);
        Ok(())
    }
}

/// Typed records of one kind, keyed by string.
pub struct Storage<T> {
    namespace: String,
    backend: Arc<dyn KeyValueStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> Storage<T> {
    /// Create a storage for `namespace` on the given backend.
    pub fn new(namespace: impl Into<String>, backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            namespace: namespace.into(),
            backend,
            _marker: PhantomData,
        }
    }

    /// The namespace this storage writes to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn load(&self) -> Result<BTreeMap<String, T>> {
        match self.backend.read(&self.namespace)? {
            Some(content) if !content.trim().is_empty() => {
                serde_json::from_str(&content).map_err(|e| PublishError::Storage {
                    message: format!("Corrupt {} storage: {}", self.namespace, e),
                })
            }
            _ => Ok(BTreeMap::new()),
        }
    }

    fn save(&self, records: &BTreeMap<String, T>) -> Result<()> {
        if records.is_empty() {
            return self.backend.delete(&self.namespace);
        }
        let content = serde_json::to_string_pretty(records)?;
        self.backend.write(&self.namespace, &content)
    }

    /// Insert or replace the record for `key`.
    pub fn add(&self, key: &str, value: T) -> Result<()> {
        let mut records = self.load()?;
        records.insert(key.to_string(), value);
        self.save(&records)
    }

    /// Get the record for `key`.
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        Ok(self.load()?.remove(key))
    }

    /// The first record in key order, if any.
    pub fn first(&self) -> Result<Option<T>> {
        Ok(self.load()?.into_values().next())
    }

    /// Remove the record for `key`, returning it.
    pub fn remove(&self, key: &str) -> Result<Option<T>> {
        let mut records = self.load()?;
        let removed = records.remove(key);
        if removed.is_some() {
            self.save(&records)?;
        }
        Ok(removed)
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    /// Erase every record in this namespace.
    pub fn clear(&self) -> Result<()> {
        self.backend.delete(&self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    fn record(name: &str, count: u32) -> Record {
        Record {
            name: name.into(),
            count,
        }
    }

    #[test]
    fn test_add_is_upsert() {
        let storage: Storage<Record> = Storage::new("Record", Arc::new(MemoryStore::new()));
        storage.add("a", record("a", 1)).unwrap();
        storage.add("a", record("a", 2)).unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a".to_string()]);
        assert_eq!(storage.get("a").unwrap(), Some(record("a", 2)));
    }

    #[test]
    fn test_first_on_empty_store() {
        let storage: Storage<Record> = Storage::new("Record", Arc::new(MemoryStore::new()));
        assert_eq!(storage.first().unwrap(), None);
    }

    #[test]
    fn test_first_returns_lowest_key() {
        let storage: Storage<Record> = Storage::new("Record", Arc::new(MemoryStore::new()));
        storage.add("zed", record("zed", 1)).unwrap();
        storage.add("amy", record("amy", 2)).unwrap();

        assert_eq!(storage.first().unwrap(), Some(record("amy", 2)));
    }

    #[test]
    fn test_clear_only_touches_own_namespace() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let profiles: Storage<Record> = Storage::new("Profile", Arc::clone(&backend));
        let other: Storage<Record> = Storage::new("Other", Arc::clone(&backend));
        profiles.add("a", record("a", 1)).unwrap();
        profiles.add("b", record("b", 1)).unwrap();
        other.add("x", record("x", 1)).unwrap();

        profiles.clear().unwrap();

        assert!(profiles.first().unwrap().is_none());
        assert_eq!(other.keys().unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn test_remove() {
        let storage: Storage<Record> = Storage::new("Record", Arc::new(MemoryStore::new()));
        storage.add("a", record("a", 1)).unwrap();

        assert_eq!(storage.remove("a").unwrap(), Some(record("a", 1)));
        assert_eq!(storage.remove("a").unwrap(), None);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let storage: Storage<Record> =
            Storage::new("Profile", Arc::new(FileStore::new(dir.path().join("nested"))));
        storage.add("a", record("a", 7)).unwrap();

        assert!(dir.path().join("nested/Profile.json").exists());

        let reopened: Storage<Record> =
            Storage::new("Profile", Arc::new(FileStore::new(dir.path().join("nested"))));
        assert_eq!(reopened.first().unwrap(), Some(record("a", 7)));

        reopened.clear().unwrap();
        assert!(!dir.path().join("nested/Profile.json").exists());
        // Clearing twice is harmless.
        reopened.clear().unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_namespaces() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read("../escape").is_err());
        assert!(store.write("", "{}").is_err());
    }

    #[test]
    fn test_corrupt_namespace_is_storage_error() {
        let backend = MemoryStore::new();
        backend.write("Record", "not json").unwrap();
        let storage: Storage<Record> = Storage::new("Record", Arc::new(backend));

        assert!(matches!(
            storage.first(),
            Err(PublishError::Storage { .. })
        ));
    }
}
