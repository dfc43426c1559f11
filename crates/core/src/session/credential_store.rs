//! Persistent storage for the session's bearer token.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use crate::errors::{Error, Result};

const CURRENT_VERSION: u32 = 1;

/// Client-local persistent storage for the bearer token.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Keeps the token in memory only. Useful for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Default)]
struct StoredCredential {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Stores the token in a small JSON file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_locked(&self) -> Result<StoredCredential> {
        if !self.path.exists() {
            return Ok(StoredCredential::default());
        }

        let raw = fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(StoredCredential::default());
        }

        Ok(serde_json::from_slice(&raw)?)
    }

    fn write_locked(&self, token: Option<&str>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredCredential {
            version: CURRENT_VERSION,
            token: token.map(str::to_string),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| Error::Credential("Credential store lock poisoned".into()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_locked()?.token.filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        let _guard = self.guard()?;
        self.write_locked(Some(token))
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.guard()?;
        if !self.path.exists() {
            return Ok(());
        }
        self.write_locked(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("credentials.json");
        let store = FileCredentialStore::new(file.clone());

        assert!(store.load().unwrap().is_none());

        store.save("tok-123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-123"));
        assert!(file.exists());

        let reopened = FileCredentialStore::new(file.clone());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("tok-123"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        let raw = fs::read_to_string(file).unwrap();
        assert!(!raw.contains("tok-123"));
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("credentials.json");
        fs::write(&file, "{not json").unwrap();

        let store = FileCredentialStore::new(file);
        assert!(matches!(store.load(), Err(Error::Json(_))));
    }

    #[test]
    fn in_memory_store() {
        let store = InMemoryCredentialStore::with_token("abc");
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
