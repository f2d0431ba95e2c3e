//! Manager that wraps forge implementations
use log::*;
use std::collections::BTreeMap;

use crate::{
    Result,
    config::FetchConfig,
    forge::{
        config::RemoteConfig,
        request::{ForgeRelease, PullRequest, UpdateReleaseRequest},
        retry::{RetryPolicy, with_retry},
        traits::Forge,
    },
};

/// Behaviour layered on top of a forge implementation.
#[derive(Debug, Clone, Copy)]
pub struct ForgeOptions {
    /// Log write operations instead of performing them.
    pub dry_run: bool,
    pub retry: RetryPolicy,
}

impl ForgeOptions {
    pub fn new(fetch: &FetchConfig, dry_run: bool) -> Self {
        Self {
            dry_run,
            retry: RetryPolicy::new(fetch.max_retries),
        }
    }
}

impl Default for ForgeOptions {
    fn default() -> Self {
        Self::new(&FetchConfig::default(), false)
    }
}

/// Adds retries for transient failures and dry-run handling to a
/// [`Forge`].
pub struct ForgeManager {
    forge: Box<dyn Forge>,
    remote_config: RemoteConfig,
    options: ForgeOptions,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>, options: ForgeOptions) -> Self {
        let remote_config = forge.remote_config();
        Self {
            forge,
            remote_config,
            options,
        }
    }

    pub fn remote_config(&self) -> &RemoteConfig {
        &self.remote_config
    }

    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    pub async fn get_pull_requests(
        &self,
        numbers: Vec<u64>,
    ) -> Result<Vec<PullRequest>> {
        debug!("fetching {} pull requests", numbers.len());
        let forge = self.forge.as_ref();
        with_retry(&self.options.retry, "pull request fetch", move || {
            forge.get_pull_requests(numbers.clone())
        })
        .await
    }

    pub async fn get_commit_pull_requests(
        &self,
        shas: Vec<String>,
    ) -> Result<BTreeMap<String, u64>> {
        debug!("looking up pull requests for {} commits", shas.len());
        let forge = self.forge.as_ref();
        with_retry(&self.options.retry, "commit lookup", move || {
            forge.get_commit_pull_requests(shas.clone())
        })
        .await
    }

    pub async fn get_release_by_tag(
        &self,
        tag: &str,
    ) -> Result<Option<ForgeRelease>> {
        let forge = self.forge.as_ref();
        with_retry(&self.options.retry, "release lookup", move || {
            forge.get_release_by_tag(tag)
        })
        .await
    }

    pub async fn update_release_notes(
        &self,
        req: UpdateReleaseRequest,
    ) -> Result<()> {
        if self.options.dry_run {
            warn!(
                "dry_run: would update release notes: tag: {}, body:\n{}",
                req.tag, req.body
            );
            return Ok(());
        }

        let forge = self.forge.as_ref();
        with_retry(&self.options.retry, "release update", move || {
            forge.update_release_notes(req.clone())
        })
        .await
    }
}
