// src/pipeline/monitor.rs

//! Per-project release monitor.
//!
//! Each monitor owns one project's release set. A cycle fetches the feed,
//! extracts releases, diffs them against the stored set, announces what is
//! new and persists the merged set. Failed attempts are retried inside the
//! cycle; a cycle that runs out of attempts leaves the store untouched.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{MonitorConfig, ProjectConfig, ProjectId, Release};
use crate::notify::Notifier;
use crate::pipeline::diff::calculate_diff;
use crate::pipeline::extract::extract_releases;
use crate::pipeline::retry::RetryPolicy;
use crate::services::FeedSource;
use crate::storage::ReleaseStore;

/// Shortest interval between two cycles of one project.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Behavior shared by every monitor of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorSettings {
    pub retry: RetryPolicy,
    /// Run a single cycle and exit
    pub one_shot: bool,
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            retry: RetryPolicy::from(config),
            one_shot: config.one_shot,
        }
    }
}

/// How a single polling cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No stored set existed; the fetched set was stored without announcing.
    ColdStart { persisted: usize },
    /// Nothing new; the store was not written.
    NoChanges,
    /// New releases were announced and the merged set stored.
    Updated { new: usize, notify_failures: usize },
    /// Every attempt failed; the stored set is unchanged.
    Exhausted { attempts: u32, last_error: AppError },
    /// Cancelled before the cycle completed.
    Cancelled,
}

/// Why a monitor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    OneShot,
    Cancelled,
}

/// What one monitor did over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub project: String,
    pub cycles: usize,
    pub new_releases: usize,
    pub failed_cycles: usize,
    pub exit: MonitorExit,
}

impl MonitorReport {
    fn new(project: String) -> Self {
        Self {
            project,
            cycles: 0,
            new_releases: 0,
            failed_cycles: 0,
            exit: MonitorExit::Cancelled,
        }
    }

    fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Cancelled => return,
            CycleOutcome::Updated { new, .. } => self.new_releases += new,
            CycleOutcome::Exhausted { .. } => self.failed_cycles += 1,
            CycleOutcome::ColdStart { .. } | CycleOutcome::NoChanges => {}
        }
        self.cycles += 1;
    }
}

/// State carried across the attempts of one cycle.
#[derive(Default)]
struct CycleState {
    announced: HashSet<Release>,
    notify_failures: usize,
}

/// Polls one project's feed and keeps its stored release set current.
pub struct ProjectMonitor {
    id: ProjectId,
    key: String,
    feed_url: String,
    interval: Duration,
    feeds: Arc<dyn FeedSource>,
    store: Arc<dyn ReleaseStore>,
    notifier: Arc<Notifier>,
    settings: MonitorSettings,
}

impl ProjectMonitor {
    /// Create a monitor for `project`.
    ///
    /// Fails with [`AppError::InvalidProjectUrl`] when no project
    /// identifier can be derived from the project URL.
    pub fn new(
        project: &ProjectConfig,
        feeds: Arc<dyn FeedSource>,
        store: Arc<dyn ReleaseStore>,
        notifier: Arc<Notifier>,
        settings: MonitorSettings,
    ) -> Result<Self> {
        let id = ProjectId::from_url(&project.url)?;
        Ok(Self {
            key: id.storage_key(),
            feed_url: project.feed_url(),
            interval: project.interval().max(MIN_INTERVAL),
            id,
            feeds,
            store,
            notifier,
            settings,
        })
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Run cycles on the project's interval until cancelled, or once in
    /// one-shot mode.
    ///
    /// An admission permit is held for the duration of every cycle.
    pub async fn run(self, admission: Arc<Semaphore>, token: CancellationToken) -> MonitorReport {
        let mut report = MonitorReport::new(self.id.to_string());
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                permit = admission.acquire() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        log::warn!("[{}] Admission gate closed, stopping", self.id);
                        break;
                    }
                },
            };

            let outcome = self.run_cycle(&token).await;
            drop(permit);

            report.record(&outcome);
            if matches!(outcome, CycleOutcome::Cancelled) {
                break;
            }
            if self.settings.one_shot {
                report.exit = MonitorExit::OneShot;
                break;
            }
            log::debug!("[{}] Next check in {:?}", self.id, self.interval);
        }

        log::info!(
            "[{}] Monitor stopped ({:?}) after {} cycle(s)",
            self.id,
            report.exit,
            report.cycles
        );
        report
    }

    /// Run one polling cycle with bounded retries.
    ///
    /// Fetch, store read and store write failures all draw from the same
    /// attempt budget; a failed attempt restarts from the fetch.
    pub async fn run_cycle(&self, token: &CancellationToken) -> CycleOutcome {
        let max_attempts = self.settings.retry.max_attempts;
        let mut delays = self.settings.retry.schedule();
        let mut state = CycleState::default();
        let mut attempt = 1;

        loop {
            if token.is_cancelled() {
                return CycleOutcome::Cancelled;
            }

            let err = match self.attempt(&mut state).await {
                Ok(outcome) => return outcome,
                Err(err) => err,
            };

            let Some(delay) = delays.next() else {
                log::error!(
                    "[{}] Giving up after {} attempt(s), stored set left unchanged: {}",
                    self.id,
                    attempt,
                    err
                );
                return CycleOutcome::Exhausted {
                    attempts: attempt,
                    last_error: err,
                };
            };

            log::warn!(
                "[{}] Attempt {}/{} failed: {}. Retrying in {:?}",
                self.id,
                attempt,
                max_attempts,
                err,
                delay
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => return CycleOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, state: &mut CycleState) -> Result<CycleOutcome> {
        let items = self.feeds.fetch(&self.feed_url).await?;
        let fetched = extract_releases(&self.id, &items);
        log::debug!(
            "[{}] Fetched {} item(s), {} release(s)",
            self.id,
            items.len(),
            fetched.len()
        );

        if !self.store.exists(&self.key).await {
            self.store.put(&self.key, &fetched).await?;
            log::info!(
                "[{}] No stored releases, saved {} to {} without announcing",
                self.id,
                fetched.len(),
                self.store.location(&self.key)
            );
            return Ok(CycleOutcome::ColdStart {
                persisted: fetched.len(),
            });
        }

        let previous = self.store.get(&self.key).await?;
        let diff = calculate_diff(&previous, &fetched);
        if !diff.has_changes() {
            log::info!("[{}] No new releases", self.id);
            return Ok(CycleOutcome::NoChanges);
        }

        log::info!("[{}] Found {} new release(s)", self.id, diff.added.len());
        for release in &diff.added {
            if state.announced.contains(release) {
                continue;
            }
            state.notify_failures += self.notifier.notify(release).await.len();
            state.announced.insert(release.clone());
        }

        let merged = diff.merged_with(&previous);
        self.store.put(&self.key, &merged).await?;
        log::info!(
            "[{}] Saved {} release(s) to {}",
            self.id,
            merged.len(),
            self.store.location(&self.key)
        );

        Ok(CycleOutcome::Updated {
            new: diff.added.len(),
            notify_failures: state.notify_failures,
        })
    }
}
