//! Durable key/value storage shared by the viewer and the editor.
//!
//! Components never touch the filesystem directly; they receive a
//! [`KeyValueStore`] so tests can swap in [`MemoryStore`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Keys written by the application. Values are plain strings; structured
/// values are stored JSON-encoded.
pub mod keys {
    pub const TOKEN: &str = "gh_token";
    pub const OWNER: &str = "gh_owner";
    pub const REPO: &str = "gh_name";
    pub const BRANCH: &str = "gh_branch";
    pub const LAST_VIEW: &str = "heartopia_last_view";
    pub const CHECKLIST: &str = "heartopia_checklist_fish";

    /// Keys removed together on logout.
    pub const CREDENTIALS: [&str; 4] = [TOKEN, OWNER, REPO, BRANCH];
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Writes through to durable storage before returning.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("ignoring unreadable value under {key}: {e}");
                None
            }
        }
    }

    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw)
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default, Clone)]
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

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, read once at open and rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!("storage file {} is not valid JSON: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        Self { path, entries }
    }

    /// `~/.heartopia/storage.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".heartopia").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
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

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(keys::LAST_VIEW), None);
        store.set(keys::LAST_VIEW, "peces".into()).unwrap();
        assert_eq!(store.get(keys::LAST_VIEW).as_deref(), Some("peces"));
        store.remove(keys::LAST_VIEW).unwrap();
        assert_eq!(store.get(keys::LAST_VIEW), None);
    }

    #[test]
    fn test_file_store_persists_every_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path);
        store.set(keys::OWNER, "octo".into()).unwrap();
        store.set_json(keys::CHECKLIST, &vec![1, 2]).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(keys::OWNER).as_deref(), Some("octo"));
        assert_eq!(reopened.get_json::<Vec<u8>>(keys::CHECKLIST), Some(vec![1, 2]));
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get(keys::TOKEN), None);
    }

    #[test]
    fn test_get_json_ignores_garbage() {
        let mut store = MemoryStore::new();
        store.set(keys::CHECKLIST, "{broken".into()).unwrap();
        assert_eq!(store.get_json::<serde_json::Value>(keys::CHECKLIST), None);
    }
}
