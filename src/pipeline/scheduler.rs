// src/pipeline/scheduler.rs

//! Monitor scheduler.
//!
//! Launches one [`ProjectMonitor`] per configured project and bounds how
//! many polling cycles may be in flight at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, MonitorConfig, ProjectConfig};
use crate::notify::Notifier;
use crate::pipeline::monitor::{MonitorReport, MonitorSettings, ProjectMonitor};
use crate::services::{FeedSource, HttpFeedSource};
use crate::storage::{self, ReleaseStore};
use crate::utils::http::create_async_client;

/// Totals for a scheduler run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Projects that got a monitor
    pub projects: usize,
    /// Projects skipped because no identifier could be derived
    pub skipped: usize,
    pub cycles: usize,
    pub new_releases: usize,
    pub failed_cycles: usize,
}

impl RunSummary {
    fn absorb(&mut self, report: &MonitorReport) {
        self.cycles += report.cycles;
        self.new_releases += report.new_releases;
        self.failed_cycles += report.failed_cycles;
    }
}

/// Runs the monitors of all configured projects.
pub struct MonitorScheduler {
    feeds: Arc<dyn FeedSource>,
    store: Arc<dyn ReleaseStore>,
    notifier: Arc<Notifier>,
    settings: MonitorSettings,
    max_parallelism: usize,
}

impl MonitorScheduler {
    pub fn new(
        config: &MonitorConfig,
        feeds: Arc<dyn FeedSource>,
        store: Arc<dyn ReleaseStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            feeds,
            store,
            notifier,
            settings: MonitorSettings::from(config),
            max_parallelism: config.max_parallelism.max(1),
        }
    }

    /// Build the feed source, store and announcers from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.http)?;
        let store = storage::from_config(&config.storage).await?;
        let notifier = Notifier::from_config(&config.announcer, client.clone()).await?;

        Ok(Self::new(
            &config.monitor,
            Arc::new(HttpFeedSource::new(client)),
            store,
            Arc::new(notifier),
        ))
    }

    /// Monitor `projects` until every monitor exits or `token` is cancelled.
    ///
    /// Only a missing bucket is fatal; per-project failures are logged and
    /// reflected in the summary.
    pub async fn run(
        &self,
        projects: &[ProjectConfig],
        token: CancellationToken,
    ) -> Result<RunSummary> {
        if !self.store.bucket_exists().await {
            return Err(AppError::BucketNotFound(self.store.bucket().to_string()));
        }

        let mut summary = RunSummary::default();
        let admission = Arc::new(Semaphore::new(self.max_parallelism));
        let mut tasks = JoinSet::new();

        for project in projects {
            let monitor = match ProjectMonitor::new(
                project,
                Arc::clone(&self.feeds),
                Arc::clone(&self.store),
                Arc::clone(&self.notifier),
                self.settings,
            ) {
                Ok(monitor) => monitor,
                Err(e) => {
                    log::error!("Skipping project '{}': {}", project.name, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            log::info!(
                "Monitoring {} every {} minute(s)",
                monitor.id(),
                project.check_interval_minutes
            );
            summary.projects += 1;
            tasks.spawn(monitor.run(Arc::clone(&admission), token.child_token()));
        }

        log::info!(
            "Started {} monitor(s), {} skipped, at most {} in flight",
            summary.projects,
            summary.skipped,
            self.max_parallelism
        );

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => summary.absorb(&report),
                Err(e) => log::error!("Monitor task ended abnormally: {}", e),
            }
        }

        log::info!(
            "Run finished: {} cycle(s), {} new release(s), {} failed cycle(s)",
            summary.cycles,
            summary.new_releases,
            summary.failed_cycles
        );
        Ok(summary)
    }
}
