//! Service layer for the release tracker.
//!
//! This module contains the I/O-facing collaborators of a monitor:
//! - Feed fetching (`FeedSource`, `HttpFeedSource`)

mod feed;

pub use feed::{FeedSource, HttpFeedSource, parse_feed};
