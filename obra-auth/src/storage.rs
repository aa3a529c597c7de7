//! Persistence for the token pair and cached user.
//!
//! Values are plain strings under fixed keys so a store written by one
//! process can be read by the next (`obra login` then `obra projects list`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::SessionResult;

pub const ACCESS_TOKEN_KEY: &str = "auth_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_DATA_KEY: &str = "user_data";

pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> SessionResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SessionResult<()>;
    fn remove(&self, key: &str) -> SessionResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// Keeps the keys in one JSON object on disk. Every write rewrites the file.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileTokenStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SessionResult<BTreeMap<String, String>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, values: &BTreeMap<String, String>) -> SessionResult<()> {
        if values.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(values)?)?;
        debug!(path = %self.path.display(), keys = values.len(), "token storage written");
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.store(&values)
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.store(&values)?;
        }
        Ok(())
    }
}
