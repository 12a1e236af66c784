use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Keys shared by every page.
pub mod keys {
    pub const VEG_TYPE: &str = "vegType";
    pub const USER_NAME: &str = "userName";
    pub const PROFILE_IMAGE: &str = "profileImage";
    pub const RESULT_DATA: &str = "resultData";
    pub const TEMP_IMAGE_DATA: &str = "tempImageData";
    pub const UPLOAD_ERROR: &str = "uploadError";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// String key-value store with the semantics of browser local storage.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

pub async fn set_json<T: Serialize + Sync>(
    storage: &dyn StorageClient,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set_item(key, &raw).await
}

pub async fn get_json<T: DeserializeOwned>(
    storage: &dyn StorageClient,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get_item(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Whole map kept in one JSON file, replaced atomically on every write.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_vec_pretty(map)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, &raw))
            .await
            .map_err(std::io::Error::other)??;
        debug!(path = %self.path.display(), entries = map.len(), "storage flushed");
        Ok(())
    }
}

/// Writes `raw` to a uniquely named sibling and renames it over `path`.
fn replace_file(path: &Path, raw: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(raw)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path)?;
    Ok(())
}

#[async_trait]
impl StorageClient for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.store(&map).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.store(&map).await?;
        }
        Ok(())
    }
}

/// In-memory store. With a quota, writes that would grow the total size of
/// keys and values past it fail the way a full browser store does.
#[derive(Default)]
pub struct MemoryStorage {
    items: std::sync::Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Default::default(),
            quota: Some(quota),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.lock();
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = FileStorage::new(&path);
        first.set_item(keys::VEG_TYPE, "Vegan").await.unwrap();
        first.set_item(keys::USER_NAME, "Mina").await.unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(
            second.get_item(keys::VEG_TYPE).await.unwrap().as_deref(),
            Some("Vegan")
        );

        second.remove_item(keys::USER_NAME).await.unwrap();
        assert!(first.get_item(keys::USER_NAME).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_handles_on_one_file_never_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let a = std::sync::Arc::new(FileStorage::new(&path));
        let b = std::sync::Arc::new(FileStorage::new(&path));

        let mut writes = Vec::new();
        for i in 0..100 {
            for handle in [a.clone(), b.clone()] {
                writes.push(tokio::spawn(async move {
                    handle.set_item(&format!("k{}", i % 7), "v").await
                }));
            }
        }
        for w in writes {
            w.await.unwrap().unwrap();
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n != "storage.json")
            .collect();
        assert!(leftovers.is_empty(), "stray temp files: {leftovers:?}");
        assert!(a.get_item("k0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert!(storage.get_item("anything").await.unwrap().is_none());
        storage.remove_item("anything").await.unwrap();
    }

    #[tokio::test]
    async fn memory_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(32);
        storage.set_item("a", "small").await.unwrap();

        let err = storage.set_item("b", &"x".repeat(64)).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(storage.get_item("b").await.unwrap().is_none());

        // overwriting an existing key only counts the new value
        storage.set_item("a", &"y".repeat(30)).await.unwrap();
    }

    #[tokio::test]
    async fn json_helpers_roundtrip() {
        let storage = MemoryStorage::new();
        set_json(&storage, "list", &vec!["a", "b"]).await.unwrap();
        let back: Option<Vec<String>> = get_json(&storage, "list").await.unwrap();
        assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
