//! Test doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{FeedItem, ProjectConfig, Release};
use crate::notify::{Announcer, EmailMessage, EmailSender};
use crate::services::FeedSource;
use crate::storage::{MemoryStorage, ReleaseStore};

pub fn release_link(version: &str) -> String {
    format!("https://github.com/acme/widget/releases/tag/{}", version)
}

pub fn release_item(version: &str) -> FeedItem {
    FeedItem::new(version, release_link(version))
}

pub fn sample_release(version: &str) -> Release {
    Release {
        project_name: "acme/widget".to_string(),
        version: version.to_string(),
        url: release_link(version),
        published_at: None,
        updated_at: None,
    }
}

pub fn project(url: &str) -> ProjectConfig {
    ProjectConfig {
        name: url.rsplit('/').next().unwrap_or(url).to_string(),
        url: url.to_string(),
        description: None,
        check_interval_minutes: 60,
        feed_url: None,
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Feed source returning a fixed item list, with failure injection.
#[derive(Default)]
pub struct ScriptedFeed {
    items: Mutex<Vec<FeedItem>>,
    failures_left: AtomicU32,
    always_fail: bool,
    delay: Duration,
    calls: AtomicUsize,
    urls: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn failing_first(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_items(&self, items: Vec<FeedItem>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn distinct_urls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().insert(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.always_fail || take_one(&self.failures_left) {
            return Err(AppError::feed(url, "connection reset"));
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

/// Memory store whose first `get`/`put` calls fail.
pub struct FlakyStore {
    pub inner: MemoryStorage,
    get_failures: AtomicU32,
    put_failures: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            get_failures: AtomicU32::new(0),
            put_failures: AtomicU32::new(0),
        }
    }

    pub fn failing_gets(self, n: u32) -> Self {
        self.get_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn failing_puts(self, n: u32) -> Self {
        self.put_failures.store(n, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl ReleaseStore for FlakyStore {
    async fn bucket_exists(&self) -> bool {
        self.inner.bucket_exists().await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    async fn exists(&self, key: &str) -> bool {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Vec<Release>> {
        if take_one(&self.get_failures) {
            return Err(AppError::s3("503 Slow Down"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, releases: &[Release]) -> Result<()> {
        if take_one(&self.put_failures) {
            return Err(AppError::s3("503 Slow Down"));
        }
        self.inner.put(key, releases).await
    }

    fn location(&self, key: &str) -> String {
        self.inner.location(key)
    }
}

/// Announcer that records every release it receives.
pub struct RecordingAnnouncer {
    name: String,
    enabled: bool,
    received: Mutex<Vec<Release>>,
}

impl RecordingAnnouncer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled(name: &str) -> Self {
        Self {
            enabled: false,
            ..Self::new(name)
        }
    }

    pub fn versions(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.version.clone())
            .collect()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, release: &Release) -> Result<()> {
        self.received.lock().unwrap().push(release.clone());
        Ok(())
    }
}

/// Announcer that always fails.
pub struct FailingAnnouncer {
    name: String,
}

impl FailingAnnouncer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Announcer for FailingAnnouncer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn notify(&self, _release: &Release) -> Result<()> {
        Err(AppError::notify(&self.name, "status 500"))
    }
}

/// Email transport that keeps sent messages.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
