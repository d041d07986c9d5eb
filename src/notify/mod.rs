//! Release announcement channels.
//!
//! Every channel implements [`Announcer`]; the [`Notifier`] fans one
//! release out to all enabled channels and collects per-channel failures
//! instead of stopping at the first one.

pub mod email;
pub mod slack;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::{AnnouncerConfig, Release};

pub use email::{EmailAnnouncer, EmailMessage, EmailSender};
pub use slack::SlackAnnouncer;

/// A channel that can announce releases.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Channel name used in logs.
    fn name(&self) -> &str;

    /// Whether the channel should be invoked at all.
    fn is_enabled(&self) -> bool;

    /// Deliver one release announcement.
    async fn notify(&self, release: &Release) -> Result<()>;
}

/// Announcer that is never enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnnouncer;

#[async_trait]
impl Announcer for NoopAnnouncer {
    fn name(&self) -> &str {
        "noop"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn notify(&self, _release: &Release) -> Result<()> {
        Ok(())
    }
}

/// A failed delivery on one channel.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub channel: String,
    pub error: AppError,
}

/// Fan-out over the configured announcement channels.
#[derive(Clone, Default)]
pub struct Notifier {
    announcers: Vec<Arc<dyn Announcer>>,
}

impl Notifier {
    pub fn new(announcers: Vec<Arc<dyn Announcer>>) -> Self {
        Self { announcers }
    }

    /// Build the channels enabled in the announcer configuration.
    pub async fn from_config(config: &AnnouncerConfig, client: reqwest::Client) -> Result<Self> {
        let mut announcers: Vec<Arc<dyn Announcer>> = Vec::new();

        if config.slack.enabled {
            announcers.push(Arc::new(SlackAnnouncer::from_config(&config.slack, client)));
        }
        if config.email.enabled {
            announcers.push(Arc::new(email::from_config(&config.email).await?));
        }

        Ok(Self::new(announcers))
    }

    /// Number of channels that will be invoked.
    pub fn enabled_count(&self) -> usize {
        self.announcers.iter().filter(|a| a.is_enabled()).count()
    }

    /// Announce `release` on every enabled channel.
    ///
    /// Channels run concurrently; each failure is logged and returned, none
    /// of them prevents delivery on the others.
    pub async fn notify(&self, release: &Release) -> Vec<DeliveryFailure> {
        let deliveries = self
            .announcers
            .iter()
            .filter(|a| a.is_enabled())
            .map(|announcer| async move {
                let result = announcer.notify(release).await;
                (announcer.name().to_string(), result)
            });

        let mut failures = Vec::new();
        for (channel, result) in join_all(deliveries).await {
            match result {
                Ok(()) => log::info!(
                    "[{}] Announced {} via {}",
                    release.project_name,
                    release.version,
                    channel
                ),
                Err(error) => {
                    log::warn!(
                        "[{}] Failed to announce {} via {}, skipping: {}",
                        release.project_name,
                        release.version,
                        channel,
                        error
                    );
                    failures.push(DeliveryFailure { channel, error });
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingAnnouncer, RecordingAnnouncer, sample_release};

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let recorder = Arc::new(RecordingAnnouncer::new("recorder"));
        let notifier = Notifier::new(vec![
            Arc::new(FailingAnnouncer::new("broken")),
            recorder.clone(),
        ]);

        let failures = notifier.notify(&sample_release("v1.2.3")).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].channel, "broken");
        assert_eq!(recorder.versions(), vec!["v1.2.3"]);
    }

    #[tokio::test]
    async fn test_disabled_channels_are_skipped() {
        let disabled = Arc::new(RecordingAnnouncer::disabled("off"));
        let notifier = Notifier::new(vec![disabled.clone(), Arc::new(NoopAnnouncer)]);

        assert_eq!(notifier.enabled_count(), 0);
        assert!(notifier.notify(&sample_release("v1.0.0")).await.is_empty());
        assert!(disabled.versions().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_without_channels() {
        let notifier = Notifier::from_config(&AnnouncerConfig::default(), reqwest::Client::new())
            .await
            .unwrap();
        assert_eq!(notifier.enabled_count(), 0);
    }
}
