//! Release data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detected release of a tracked project.
///
/// Equality is field-wise: two releases match when project, version, url
/// and both timestamps match, with a missing timestamp only equal to
/// another missing timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Derived project identifier (`owner/repo`)
    pub project_name: String,

    /// Version label, taken from the feed item title
    pub version: String,

    /// Canonical release URL
    pub url: String,

    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Human-readable announcement line.
    pub fn announcement(&self) -> String {
        format!(
            "{} {} is out! Check it out at {}",
            self.project_name, self.version, self.url
        )
    }
}
