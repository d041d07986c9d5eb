//! Release monitoring pipeline.
//!
//! - `extract`: Map feed items to releases
//! - `diff`: Find releases not stored yet
//! - `retry`: Attempt budget and backoff for one cycle
//! - `monitor`: Per-project polling cycle
//! - `scheduler`: Run all monitors under a concurrency cap

pub mod diff;
pub mod extract;
pub mod monitor;
pub mod retry;
pub mod scheduler;

pub use diff::{ReleaseDiff, calculate_diff};
pub use extract::{extract_releases, is_release_link};
pub use monitor::{CycleOutcome, MonitorExit, MonitorReport, MonitorSettings, ProjectMonitor};
pub use retry::RetryPolicy;
pub use scheduler::{MonitorScheduler, RunSummary};
