//! Persistent key-value storage backing the credential store

use crate::error::{ClientError, Result};
use papaya::HashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::sync::{Arc, RwLock};
use tempfile::NamedTempFile;
use tracing::debug;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key-value storage that survives page reloads / process restarts
pub trait CredentialStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Thread-safe in-memory storage using Papaya HashMap
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.pin().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.pin().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.pin().remove(key);
        Ok(())
    }
}

/// JSON file storage
///
/// The whole file is replaced on every mutation: the new content is written to
/// a temporary file next to it and renamed over it, so readers see either the
/// old or the new content. A missing file reads as empty.
pub struct FileStorage {
    path: PathBuf,
    // readers share, read-modify-write cycles are exclusive within this process
    lock: RwLock<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::Storage(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            ClientError::Storage(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let text = serde_json::to_string_pretty(items)?;
        let write_err =
            |e: std::io::Error| ClientError::Storage(format!("Failed to write {}: {e}", self.path.display()));

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), keys = items.len(), "Credential file written");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| ClientError::Storage("Credential file lock poisoned".to_string()))?;
        let mut items = self.load()?;
        f(&mut items);
        self.save(&items)
    }
}

impl CredentialStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| ClientError::Storage("Credential file lock poisoned".to_string()))?;
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| {
            items.remove(key);
        })
    }
}
