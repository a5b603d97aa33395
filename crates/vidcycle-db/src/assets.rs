//! Asset storage backends.
//!
//! A video's media, thumbnails, and caption files are stored under
//! `{owner_id}/{video_id}/`. Cleanup lists that prefix and deletes whatever
//! it finds; transcripts are read from the same place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use vidcycle_core::{AssetStore, Error, Result};

/// Filesystem asset store rooted at a base directory.
pub struct FilesystemAssetStore {
    base_path: PathBuf,
}

impl FilesystemAssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Build from `ASSET_STORAGE_PATH`, defaulting to `./data/assets`.
    pub fn from_env() -> Self {
        let path =
            std::env::var("ASSET_STORAGE_PATH").unwrap_or_else(|_| "./data/assets".to_string());
        Self::new(path)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        if key.split('/').any(|part| part == "..") {
            return Err(Error::InvalidInput(format!("Invalid asset key: {}", key)));
        }
        Ok(self.base_path.join(key))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    /// Write an object, creating parent directories.
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(key)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Temp file + rename keeps readers from seeing partial objects.
        let temp_path = full_path.with_extension("tmp");
        fs::write(&temp_path, data).await?;
        fs::rename(&temp_path, &full_path).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.full_path(prefix.trim_end_matches('/'))?;
        if !fs::try_exists(&root).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        debug!(subsystem = "storage", component = "filesystem", prefix, count = keys.len(), "Listed assets");
        Ok(keys)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(key)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Asset {}", key)))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> Result<usize> {
        let mut removed = 0;
        for key in keys {
            let full_path = self.full_path(key)?;
            match fs::remove_file(&full_path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(subsystem = "storage", component = "filesystem", key = %key, error = %e, "Asset delete failed");
                    return Err(Error::Storage(format!("Failed to delete {}: {}", key, e)));
                }
            }
        }
        Ok(removed)
    }
}

/// In-memory asset store for tests and local runs.
#[derive(Default)]
pub struct MemoryAssetStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_deletes: std::sync::atomic::AtomicBool,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(key.into(), data.into());
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Make every subsequent `delete_many` fail with a storage error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Asset {}", key)))
    }

    async fn delete_many(&self, keys: &[String]) -> Result<usize> {
        if self
            .fail_deletes
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::Storage("asset store unavailable".to_string()));
        }
        let mut objects = self.objects.write().await;
        Ok(keys.iter().filter(|k| objects.remove(*k).is_some()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filesystem_list_and_delete_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path());
        store.write("owner/video/result.mp4", b"mp4").await.unwrap();
        store.write("owner/video/thumbs/1.jpg", b"jpg").await.unwrap();
        store.write("owner/other/result.mp4", b"mp4").await.unwrap();

        let keys = store.list("owner/video/").await.unwrap();
        assert_eq!(
            keys,
            vec!["owner/video/result.mp4", "owner/video/thumbs/1.jpg"]
        );

        let removed = store.delete_many(&keys).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.list("owner/video/").await.unwrap().is_empty());
        assert_eq!(store.list("owner/other/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filesystem_missing_prefix_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path());
        assert!(store.list("nobody/nothing/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filesystem_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path());
        let err = store.read("a/b/transcription.vtt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_filesystem_rejects_parent_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path());
        assert!(store.read("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_prefix_isolation() {
        let store = MemoryAssetStore::new();
        store.put("o/v1/a", "x").await;
        store.put("o/v10/a", "x").await;

        let keys = store.list("o/v1/").await.unwrap();
        assert_eq!(keys, vec!["o/v1/a".to_string()]);
        assert_eq!(store.delete_many(&keys).await.unwrap(), 1);
        assert!(store.contains("o/v10/a").await);
    }

    #[tokio::test]
    async fn test_memory_store_failing_deletes() {
        let store = MemoryAssetStore::new();
        store.put("o/v/a", "x").await;
        store.fail_deletes(true);
        let err = store.delete_many(&["o/v/a".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(store.contains("o/v/a").await);
    }
}
