//! In-memory storage implementation.
//!
//! Holds encoded blobs in a map so callers observe exactly the bytes a real
//! backend would persist. Used as the store double in tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Release;
use crate::storage::{ReleaseStore, decode_releases, encode_releases};

/// In-memory storage backend.
#[derive(Debug)]
pub struct MemoryStorage {
    bucket: String,
    bucket_present: bool,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
}

impl MemoryStorage {
    /// Create an empty store backed by an existing bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            bucket_present: true,
            blobs: Mutex::new(HashMap::new()),
            puts: AtomicUsize::new(0),
        }
    }

    /// Create a store whose bucket does not exist.
    pub fn missing_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket_present: false,
            ..Self::new(bucket)
        }
    }

    /// Raw bytes stored at `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// Number of successful `put` calls.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map still holds whole blobs: every write is a single insert.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReleaseStore for MemoryStorage {
    async fn bucket_exists(&self) -> bool {
        self.bucket_present
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn exists(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    async fn get(&self, key: &str) -> Result<Vec<Release>> {
        let bytes = self.raw(key).ok_or_else(|| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", self.location(key)),
            ))
        })?;
        decode_releases(&bytes)
    }

    async fn put(&self, key: &str, releases: &[Release]) -> Result<()> {
        let bytes = encode_releases(releases)?;
        self.lock().insert(key.to_string(), bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }
}
