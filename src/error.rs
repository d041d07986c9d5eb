// src/error.rs

//! Unified error handling for the release tracker.

use std::fmt;

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// Email delivery error
    #[error("Email error: {0}")]
    Email(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Feed could not be fetched or parsed
    #[error("Feed error for {url}: {message}")]
    Feed { url: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A project URL from which no identifier can be derived
    #[error("Invalid project url '{url}': {reason}")]
    InvalidProjectUrl { url: String, reason: String },

    /// The target bucket/container does not exist
    #[error("Bucket {0} not found")]
    BucketNotFound(String),

    /// An announcement channel failed
    #[error("Notification via {channel} failed: {message}")]
    Notify { channel: String, message: String },
}

impl AppError {
    /// Create an S3 error.
    pub fn s3(message: impl fmt::Display) -> Self {
        Self::S3(message.to_string())
    }

    /// Create an email error.
    pub fn email(message: impl fmt::Display) -> Self {
        Self::Email(message.to_string())
    }

    /// Create a feed error with the feed location as context.
    pub fn feed(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Feed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid project url error.
    pub fn invalid_project_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidProjectUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a notification error for the given channel.
    pub fn notify(channel: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notify {
            channel: channel.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error permanently disables monitoring of a project.
    ///
    /// Everything else raised inside a polling cycle is retried.
    pub fn is_project_fatal(&self) -> bool {
        matches!(self, Self::InvalidProjectUrl { .. })
    }
}
