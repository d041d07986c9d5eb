// src/config.rs

//! Configuration loading utilities.
//!
//! Both entry points apply the environment credential overrides and
//! validate the result before handing it out.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
#[cfg(feature = "aws")]
use crate::models::StorageConfig;
#[cfg(feature = "aws")]
use crate::storage::s3::S3Storage;

/// Default object key of the configuration file in Lambda mode.
pub const DEFAULT_CONFIG_KEY: &str = "release-tracker/config.toml";

/// Config loader for Lambda environment.
#[cfg(feature = "aws")]
pub struct LambdaConfigLoader {
    storage: S3Storage,
    key: String,
}

#[cfg(feature = "aws")]
impl LambdaConfigLoader {
    pub fn new(storage: S3Storage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Locate the configuration object from `CONFIG_S3_BUCKET` and
    /// `CONFIG_S3_KEY`.
    pub async fn from_env() -> Result<Self> {
        let bucket = std::env::var("CONFIG_S3_BUCKET")
            .ok()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| AppError::config("CONFIG_S3_BUCKET is not set"))?;
        let key = std::env::var("CONFIG_S3_KEY").unwrap_or_else(|_| DEFAULT_CONFIG_KEY.to_string());

        let storage = S3Storage::from_config(&StorageConfig {
            bucket_name: bucket,
            ..StorageConfig::default()
        })
        .await?;
        Ok(Self::new(storage, key))
    }

    pub async fn load_config(&self) -> Result<Config> {
        log::info!("Loading config file from S3: {}", self.key);
        let bytes = self
            .storage
            .read_bytes_optional(&self.key)
            .await?
            .ok_or_else(|| {
                AppError::config(format!("Config file not found in S3: {}", self.key))
            })?;

        let content = String::from_utf8(bytes).map_err(|e| {
            AppError::config(format!("Config file {} is not valid UTF-8: {}", self.key, e))
        })?;
        prepare(Config::from_toml(&content)?)
    }
}

/// Load, override and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path).map_err(|e| {
        AppError::config(format!("Failed to load config from {}: {}", path.display(), e))
    })?;
    prepare(config)
}

fn prepare(mut config: Config) -> Result<Config> {
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
