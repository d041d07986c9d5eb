//! AWS S3 storage implementation.
//!
//! Release sets live at `s3://{bucket}/{owner}/{repo}/releases.json`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::{Release, StorageConfig};
use crate::storage::{ReleaseStore, decode_releases, encode_releases};

/// S3-based release store.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create S3 storage from the `[storage]` configuration.
    ///
    /// Static credentials are used when both keys are set, otherwise the
    /// default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let sdk_config = load_sdk_config(
            &config.region,
            &config.access_key,
            &config.secret_key,
            config.endpoint_url.as_deref(),
        )
        .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.endpoint_url.is_some() {
            builder = builder.force_path_style(true);
        }

        Ok(Self::new(
            Client::from_conf(builder.build()),
            config.bucket_name.clone(),
        ))
    }

    /// Read raw bytes from S3, returning None if the key doesn't exist.
    pub async fn read_bytes_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(AppError::s3)?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(AppError::s3(service_err))
                }
            }
        }
    }
}

/// Load an SDK config for the given region and optional static credentials.
pub(crate) async fn load_sdk_config(
    region: &str,
    access_key: &str,
    secret_key: &str,
    endpoint_url: Option<&str>,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if !region.trim().is_empty() {
        loader = loader.region(Region::new(region.to_string()));
    }
    if !access_key.is_empty() && !secret_key.is_empty() {
        loader = loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "release-tracker-config",
        ));
    }
    if let Some(endpoint) = endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

#[async_trait]
impl ReleaseStore for S3Storage {
    async fn bucket_exists(&self) -> bool {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => true,
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_not_found() {
                    log::warn!("HeadBucket for {} failed: {}", self.bucket, service_err);
                }
                false
            }
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn exists(&self, key: &str) -> bool {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => true,
            Err(err) => {
                let service_err = err.into_service_error();
                // Any other failure is reported as absent too, see DESIGN.md.
                if !service_err.is_not_found() {
                    log::warn!(
                        "HeadObject for {} failed, treating as absent: {}",
                        self.location(key),
                        service_err
                    );
                }
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<Release>> {
        let bytes = self
            .read_bytes_optional(key)
            .await?
            .ok_or_else(|| AppError::s3(format!("{} not found", self.location(key))))?;
        decode_releases(&bytes)
    }

    async fn put(&self, key: &str, releases: &[Release]) -> Result<()> {
        let bytes = encode_releases(releases)?;
        let length = bytes.len() as i64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_length(length)
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::s3(e.into_service_error()))?;

        log::debug!("Wrote {} releases to {}", releases.len(), self.location(key));
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
