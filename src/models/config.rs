//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduling and retry behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// HTTP client settings for feed fetches and webhooks
    #[serde(default)]
    pub http: HttpConfig,

    /// Where release sets are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Announcement channels
    #[serde(default)]
    pub announcer: AnnouncerConfig,

    /// Tracked projects
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override credentials and bucket settings from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override credentials and bucket settings from a key lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable never
    /// wipes a value from the file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = &mut self.storage;
        let ses = &mut self.announcer.email.ses;
        let fields: [(&str, &mut String); 7] = [
            ("STORAGE_S3_ACCESS_KEY", &mut storage.access_key),
            ("STORAGE_S3_SECRET_KEY", &mut storage.secret_key),
            ("STORAGE_S3_REGION", &mut storage.region),
            ("STORAGE_S3_BUCKET_NAME", &mut storage.bucket_name),
            ("EMAIL_SES_ACCESS_KEY", &mut ses.access_key),
            ("EMAIL_SES_SECRET_KEY", &mut ses.secret_key),
            ("EMAIL_SES_REGION", &mut ses.region),
        ];

        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(AppError::validation("No projects defined"));
        }
        if self.monitor.max_parallelism == 0 {
            return Err(AppError::validation("monitor.max_parallelism must be > 0"));
        }
        if self.monitor.max_attempts == 0 {
            return Err(AppError::validation("monitor.max_attempts must be > 0"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        for project in &self.projects {
            if project.url.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "project '{}' has an empty url",
                    project.name
                )));
            }
            if project.check_interval_minutes == 0 {
                return Err(AppError::validation(format!(
                    "project '{}': check_interval_minutes must be > 0",
                    project.name
                )));
            }
        }
        match self.storage.provider {
            StorageProvider::S3 if self.storage.bucket_name.trim().is_empty() => {
                return Err(AppError::validation("storage.bucket_name is empty"));
            }
            StorageProvider::Local if self.storage.local_dir.trim().is_empty() => {
                return Err(AppError::validation("storage.local_dir is empty"));
            }
            _ => {}
        }

        let slack = &self.announcer.slack;
        if slack.enabled && slack.webhook_url.trim().is_empty() {
            return Err(AppError::validation(
                "announcer.slack.webhook_url is required when slack is enabled",
            ));
        }
        let email = &self.announcer.email;
        if email.enabled && (email.from.trim().is_empty() || email.to.is_empty()) {
            return Err(AppError::validation(
                "announcer.email.from and announcer.email.to are required when email is enabled",
            ));
        }
        Ok(())
    }
}

/// Scheduler and per-cycle retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum number of project cycles in flight at once
    #[serde(default = "defaults::max_parallelism")]
    pub max_parallelism: usize,

    /// Poll every project once and exit
    #[serde(default)]
    pub one_shot: bool,

    /// Attempts per cycle before giving up until the next tick
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,

    /// Delay growth between attempts
    #[serde(default)]
    pub backoff: BackoffKind,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_parallelism: defaults::max_parallelism(),
            one_shot: false,
            max_attempts: defaults::max_attempts(),
            retry_delay_secs: defaults::retry_delay(),
            backoff: BackoffKind::default(),
        }
    }
}

/// How the delay between attempts evolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Flat,
    Exponential,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Supported release store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    S3,
    Local,
}

/// Release store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,

    #[serde(default)]
    pub bucket_name: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    /// Custom endpoint for S3-compatible stores
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Root directory for the local provider
    #[serde(default = "defaults::local_dir")]
    pub local_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            bucket_name: String::new(),
            region: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            endpoint_url: None,
            local_dir: defaults::local_dir(),
        }
    }
}

/// Announcement channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnouncerConfig {
    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub webhook_url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub provider: EmailProvider,

    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default)]
    pub cc: Vec<String>,

    #[serde(default)]
    pub bcc: Vec<String>,

    #[serde(default)]
    pub ses: SesConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    #[default]
    Ses,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SesConfig {
    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,
}

/// A tracked project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Display name
    pub name: String,

    /// Project URL, e.g. `https://github.com/acme/widget`
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Polling interval in minutes
    #[serde(default = "defaults::check_interval")]
    pub check_interval_minutes: u64,

    /// Feed location, defaults to `<url>/releases.atom`
    #[serde(default)]
    pub feed_url: Option<String>,
}

impl ProjectConfig {
    /// Resolve the feed document location.
    pub fn feed_url(&self) -> String {
        match &self.feed_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!("{}/releases.atom", self.url.trim_end_matches('/')),
        }
    }

    /// Polling interval as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }
}

mod defaults {
    pub fn max_parallelism() -> usize {
        5
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        5
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; release-tracker/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn local_dir() -> String {
        "storage".into()
    }
    pub fn check_interval() -> u64 {
        60
    }
}
