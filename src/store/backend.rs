//! Key-value persistence for the store
//!
//! Values are opaque JSON blobs scoped to this application. `FileBackend` keeps
//! one file per key; `MemoryBackend` serves tests and ephemeral runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::StoreError;

#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON files under a data directory
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create the backend, creating `root` if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StoreError::StorageAccess(format!("create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    /// Default location: `<data_dir>/playlist-shelf`
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| {
                let fallback = std::env::temp_dir();
                warn!(
                    "Could not determine system data directory, using temp directory fallback: {}",
                    fallback.display()
                );
                fallback
            })
            .join("playlist-shelf")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::StorageAccess(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let value = serde_json::from_slice(&bytes)?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&value)?;

        // Write then rename so a crash mid-write never leaves a truncated blob
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::StorageAccess(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::StorageAccess(format!("rename {}: {}", path.display(), e)))?;

        debug!("Persisted {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::StorageAccess(format!(
                "remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// In-process map, lost on drop
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
