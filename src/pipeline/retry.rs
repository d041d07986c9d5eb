//! Retry policy for polling cycles.

use std::time::Duration;

use backon::{BackoffBuilder, ConstantBuilder, ExponentialBuilder};

use crate::models::{BackoffKind, MonitorConfig};

/// Upper bound for exponential delays.
const MAX_DELAY: Duration = Duration::from_secs(300);

/// Delays to wait between the attempts of one cycle.
///
/// Yields one delay per remaining retry and `None` once the budget is spent.
pub type RetrySchedule = Box<dyn Iterator<Item = Duration> + Send + Sync>;

/// Bounded retry settings for one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per cycle, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub delay: Duration,
    pub backoff: BackoffKind,
}

impl RetryPolicy {
    /// Flat delay between a fixed number of attempts.
    pub fn flat(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: BackoffKind::Flat,
        }
    }

    /// Build a fresh schedule for one cycle.
    pub fn schedule(&self) -> RetrySchedule {
        let retries = self.max_attempts.saturating_sub(1) as usize;

        match self.backoff {
            BackoffKind::Flat => Box::new(
                ConstantBuilder::default()
                    .with_delay(self.delay)
                    .with_max_times(retries)
                    .build(),
            ),
            BackoffKind::Exponential => Box::new(
                ExponentialBuilder::default()
                    .with_min_delay(self.delay)
                    .with_max_delay(MAX_DELAY.max(self.delay))
                    .with_factor(2.0)
                    .with_max_times(retries)
                    .build(),
            ),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for RetryPolicy {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
            backoff: config.backoff,
        }
    }
}
