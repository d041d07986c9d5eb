//! Project identifiers derived from project URLs.

use std::fmt;

use url::Url;

use crate::error::{AppError, Result};

/// Name of the release set blob stored under each project prefix.
const RELEASES_FILE: &str = "releases.json";

/// `owner/repo` identifier of a tracked project.
///
/// Namespaces both the persisted release set and per-project log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId {
    owner: String,
    repo: String,
}

impl ProjectId {
    /// Derive the identifier from the first two path segments of `url`.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| AppError::invalid_project_url(url, e))?;

        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| AppError::invalid_project_url(url, "url cannot have a path"))?
            .filter(|s| !s.is_empty());

        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(AppError::invalid_project_url(
                url,
                "expected <host>/<owner>/<repository>",
            )),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Store key holding this project's release set.
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.owner, self.repo, RELEASES_FILE)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
