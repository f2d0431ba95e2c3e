//! Traits related to the remote forge
use async_trait::async_trait;
use std::collections::BTreeMap;
#[cfg(test)]
use mockall::automock;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        request::{ForgeRelease, PullRequest, UpdateReleaseRequest},
    },
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    fn remote_config(&self) -> RemoteConfig;

    /// Metadata for the given numbers. Numbers that are not pull requests
    /// are absent from the result.
    async fn get_pull_requests(&self, numbers: Vec<u64>) -> Result<Vec<PullRequest>>;

    /// Pull request each commit SHA belongs to. Commits without one are
    /// absent from the result.
    async fn get_commit_pull_requests(
        &self,
        shas: Vec<String>,
    ) -> Result<BTreeMap<String, u64>>;

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<ForgeRelease>>;

    async fn update_release_notes(&self, req: UpdateReleaseRequest) -> Result<()>;
}
