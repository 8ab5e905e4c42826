//! String-by-key persistent storage, the way a browser's local storage works.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub trait KeyValueStorage: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Keeps everything in a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage file in the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-search", "weather-search")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file: {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse storage file: {}", self.path.display()))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable storage file");
            BTreeMap::new()
        });
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&map).context("Failed to serialize storage")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write storage file: {}", self.path.display()))?;

        Ok(())
    }
}

/// Non-persistent storage, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("storage.json");

        let mut storage = FileStorage::new(&path);
        assert_eq!(storage.get("recentSearches").expect("get"), None);

        storage.set("recentSearches", r#"["Paris"]"#).expect("set");
        storage.set("other", "x").expect("set");

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get("recentSearches").expect("get").as_deref(),
            Some(r#"["Paris"]"#)
        );
        assert_eq!(reopened.get("other").expect("get").as_deref(), Some("x"));
    }

    #[test]
    fn corrupt_file_errors_on_get_and_is_replaced_on_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").expect("write");

        let mut storage = FileStorage::new(&path);
        let err = storage.get("recentSearches").unwrap_err();
        assert!(err.to_string().contains("Failed to parse storage file"));

        storage.set("recentSearches", "[]").expect("set");
        assert_eq!(storage.get("recentSearches").expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn memory_storage_get_set() {
        let mut storage = MemoryStorage::new().with_entry("a", "1");
        assert_eq!(storage.get("a").expect("get").as_deref(), Some("1"));

        storage.set("a", "2").expect("set");
        assert_eq!(storage.get("a").expect("get").as_deref(), Some("2"));
        assert_eq!(storage.get("b").expect("get"), None);
    }
}
