//! Local filesystem storage implementation.
//!
//! The root directory plays the role of the bucket, and every key maps to a
//! file below it. Intended for development and single-host deployments;
//! production deployments should use `S3Storage`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Release;
use crate::storage::{ReleaseStore, decode_releases, encode_releases};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    name: String,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let name = root_dir.display().to_string();
        Self { root_dir, name }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ReleaseStore for LocalStorage {
    async fn bucket_exists(&self) -> bool {
        tokio::fs::metadata(&self.root_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    fn bucket(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> bool {
        match tokio::fs::metadata(self.path(key)).await {
            Ok(meta) => meta.is_file(),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Existence check for {} failed: {}", self.location(key), e);
                }
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<Release>> {
        match self.read_bytes(key).await? {
            Some(bytes) => decode_releases(&bytes),
            None => Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", self.location(key)),
            ))),
        }
    }

    async fn put(&self, key: &str, releases: &[Release]) -> Result<()> {
        let bytes = encode_releases(releases)?;
        self.write_bytes(key, &bytes).await?;
        log::debug!("Wrote {} releases to {}", releases.len(), self.location(key));
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        self.path(key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn release(version: &str) -> Release {
        Release {
            project_name: "acme/widget".to_string(),
            version: version.to_string(),
            url: format!("https://github.com/acme/widget/releases/tag/{version}"),
            published_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_put_get_exists() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let key = "acme/widget/releases.json";

        assert!(!storage.exists(key).await);
        assert!(storage.get(key).await.is_err());

        let releases = vec![release("v1.0.1"), release("v1.0.0")];
        storage.put(key, &releases).await.unwrap();

        assert!(storage.exists(key).await);
        assert_eq!(storage.get(key).await.unwrap(), releases);
        assert!(!tmp.path().join("acme/widget/releases.tmp").exists());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let key = "acme/widget/releases.json";

        storage.put(key, &[release("v1.0.0")]).await.unwrap();
        storage.put(key, &[release("v2.0.0")]).await.unwrap();

        let stored = storage.get(key).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].version, "v2.0.0");
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.write_bytes("a/b/releases.json", b"[{").await.unwrap();

        assert!(storage.exists("a/b/releases.json").await);
        assert!(matches!(
            storage.get("a/b/releases.json").await,
            Err(AppError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_bucket_exists() {
        let tmp = TempDir::new().unwrap();
        assert!(LocalStorage::new(tmp.path()).bucket_exists().await);
        assert!(
            !LocalStorage::new(tmp.path().join("missing"))
                .bucket_exists()
                .await
        );
    }
}
