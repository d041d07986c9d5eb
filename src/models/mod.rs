// src/models/mod.rs

//! Domain models for the release tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod feed;
mod project;
mod release;

// Re-export all public types
pub use config::{
    AnnouncerConfig, BackoffKind, Config, EmailConfig, EmailProvider, HttpConfig, MonitorConfig,
    ProjectConfig, SesConfig, SlackConfig, StorageConfig, StorageProvider,
};
pub use feed::FeedItem;
pub use project::ProjectId;
pub use release::Release;
