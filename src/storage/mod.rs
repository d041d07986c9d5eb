//! Storage abstractions for release set persistence.
//!
//! Every project owns exactly one blob holding its full release set:
//!
//! ```text
//! {bucket}/
//! ├── acme/
//! │   └── widget/
//! │       └── releases.json
//! └── other/
//!     └── tool/
//!         └── releases.json
//! ```
//!
//! Blobs are pretty-printed JSON arrays so they diff cleanly between runs.

pub mod local;
pub mod memory;
#[cfg(feature = "aws")]
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Release, StorageConfig, StorageProvider};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "aws")]
pub use s3::S3Storage;

/// Trait for release store backends.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Whether the backing bucket/container exists.
    async fn bucket_exists(&self) -> bool;

    /// Name of the backing bucket/container.
    fn bucket(&self) -> &str;

    /// Whether a blob is present at `key`.
    ///
    /// Lookup failures other than "not found" also yield `false`.
    async fn exists(&self, key: &str) -> bool;

    /// Fetch and decode the release set at `key`.
    async fn get(&self, key: &str) -> Result<Vec<Release>>;

    /// Encode and overwrite the release set at `key`.
    async fn put(&self, key: &str, releases: &[Release]) -> Result<()>;

    /// Printable location of `key`, for logs.
    fn location(&self, key: &str) -> String;
}

/// Encode a release set the way every backend persists it.
pub fn encode_releases(releases: &[Release]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(releases)?)
}

/// Decode a persisted release set.
pub fn decode_releases(bytes: &[u8]) -> Result<Vec<Release>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Build the store selected by the storage configuration.
pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn ReleaseStore>> {
    match config.provider {
        StorageProvider::Local => Ok(Arc::new(LocalStorage::new(&config.local_dir))),
        #[cfg(feature = "aws")]
        StorageProvider::S3 => Ok(Arc::new(S3Storage::from_config(config).await?)),
        #[cfg(not(feature = "aws"))]
        StorageProvider::S3 => Err(crate::error::AppError::config(
            "storage.provider = \"s3\" requires the 'aws' feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_encode_is_indented_and_stable() {
        let releases = vec![Release {
            project_name: "acme/widget".to_string(),
            version: "v1.0.0".to_string(),
            url: "https://github.com/acme/widget/releases/tag/v1.0.0".to_string(),
            published_at: None,
            updated_at: None,
        }];

        let first = encode_releases(&releases).unwrap();
        let second = encode_releases(&decode_releases(&first).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().contains("\n  {"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_releases(b"{not json"),
            Err(AppError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_from_config_local() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            provider: StorageProvider::Local,
            local_dir: tmp.path().display().to_string(),
            ..StorageConfig::default()
        };

        let store = from_config(&config).await.unwrap();
        assert!(store.bucket_exists().await);
    }
}
