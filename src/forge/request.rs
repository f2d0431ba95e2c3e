use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Merged pull request metadata. Identity is the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Author login. Empty when the account no longer exists.
    pub author: String,
    pub labels: BTreeSet<String>,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
}

impl PullRequest {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn has_any_label(&self, labels: &[String]) -> bool {
        labels.iter().any(|l| self.has_label(l))
    }
}

/// Published release as returned by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeRelease {
    pub id: u64,
    pub tag: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to replace the notes of an existing release.
pub struct UpdateReleaseRequest {
    pub release_id: u64,
    pub tag: String,
    pub body: String,
}
