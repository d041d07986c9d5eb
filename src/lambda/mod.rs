// src/lambda/mod.rs

//! AWS Lambda handler for the release tracker.
//!
//! Every invocation (usually a scheduled event) polls each configured
//! project exactly once:
//! 1. Loads the configuration from S3
//! 2. Checks the release bucket exists
//! 3. Runs one cycle per project under the parallelism cap
//! 4. Reports the run totals

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::LambdaConfigLoader;
use crate::error::{AppError, Result};
use crate::pipeline::{MonitorScheduler, RunSummary};

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct MonitorResponse {
    /// Whether the run completed
    pub success: bool,

    /// Projects that were polled
    pub projects: usize,

    /// Projects skipped for an invalid URL
    pub skipped: usize,

    /// Releases announced in this run
    pub new_releases: usize,

    /// Projects whose cycle ran out of attempts
    pub failed_cycles: usize,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl From<RunSummary> for MonitorResponse {
    fn from(summary: RunSummary) -> Self {
        Self {
            success: true,
            projects: summary.projects,
            skipped: summary.skipped,
            new_releases: summary.new_releases,
            failed_cycles: summary.failed_cycles,
            ..Self::default()
        }
    }
}

/// Main Lambda handler function.
///
/// A missing release bucket fails the invocation so the trigger retries and
/// alarms; every other error is reported in the response body.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<Value>,
) -> std::result::Result<MonitorResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "Starting release check: {}", payload);

    let mut response = respond(run_once().await)?;
    response.execution_time_ms = start.elapsed().as_millis() as u64;
    Ok(response)
}

/// Turn a run result into the invocation result.
fn respond(result: Result<RunSummary>) -> Result<MonitorResponse> {
    match result {
        Ok(summary) => {
            let response = MonitorResponse::from(summary);
            info!(
                "Release check completed: {} project(s), {} new release(s), {} failed",
                response.projects, response.new_releases, response.failed_cycles
            );
            Ok(response)
        }
        Err(e @ AppError::BucketNotFound(_)) => {
            error!("Release check aborted: {}", e);
            Err(e)
        }
        Err(e) => {
            error!("Release check failed: {}", e);
            Ok(MonitorResponse {
                error: Some(e.to_string()),
                ..MonitorResponse::default()
            })
        }
    }
}

async fn run_once() -> Result<RunSummary> {
    let mut config = LambdaConfigLoader::from_env().await?.load_config().await?;
    config.monitor.one_shot = true;

    let scheduler = MonitorScheduler::from_config(&config).await?;
    scheduler.run(&config.projects, CancellationToken::new()).await
}
