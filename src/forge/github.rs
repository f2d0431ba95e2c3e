//! Implements the Forge trait for Github
use async_trait::async_trait;
use log::*;
use octocrab::Octocrab;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::BTreeMap;

use crate::{
    Result,
    forge::{
        cache::ResponseCache,
        config::RemoteConfig,
        request::{ForgeRelease, PullRequest, UpdateReleaseRequest},
        traits::Forge,
    },
};

mod graphql;

use graphql::{
    commit_pull_requests_query, parse_commit_pull_requests, parse_pull_requests,
    pull_requests_query,
};

const GRAPHQL_ENDPOINT: &str = "graphql";

/// GitHub forge implementation using Octocrab for pull request metadata and
/// release notes.
pub struct Github {
    config: RemoteConfig,
    instance: Octocrab,
    cache: ResponseCache,
}

impl Github {
    /// Create GitHub client with personal access token authentication and API
    /// base URL configuration.
    pub fn new(config: RemoteConfig, cache: ResponseCache) -> Result<Self> {
        let base_uri = config.api_base_url();
        debug!("using github api at {base_uri}");

        let instance = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(base_uri)?
            .build()?;

        Ok(Self {
            config,
            instance,
            cache,
        })
    }
}

#[async_trait]
impl Forge for Github {
    fn remote_config(&self) -> RemoteConfig {
        self.config.clone()
    }

    async fn get_pull_requests(&self, numbers: Vec<u64>) -> Result<Vec<PullRequest>> {
        if numbers.is_empty() {
            return Ok(vec![]);
        }

        let query = pull_requests_query(&numbers);
        let variables = json!({
            "owner": self.config.owner,
            "repo": self.config.repo,
        });

        let key = ResponseCache::fingerprint(GRAPHQL_ENDPOINT, &query, &variables);

        if let Some(cached) = self.cache.get::<Vec<PullRequest>>(&key) {
            return Ok(cached);
        }

        let body = json!({ "query": query, "variables": variables });
        let response: serde_json::Value = self.instance.graphql(&body).await?;
        let batch = parse_pull_requests(&numbers, &response)?;

        if batch.had_errors {
            debug!("response contained errors: not caching");
        } else {
            self.cache.put(&key, &batch.pull_requests)?;
        }

        Ok(batch.pull_requests)
    }

    async fn get_commit_pull_requests(
        &self,
        shas: Vec<String>,
    ) -> Result<BTreeMap<String, u64>> {
        if shas.is_empty() {
            return Ok(BTreeMap::new());
        }

        let query = commit_pull_requests_query(&shas);
        let variables = json!({
            "owner": self.config.owner,
            "repo": self.config.repo,
        });

        let key = ResponseCache::fingerprint(GRAPHQL_ENDPOINT, &query, &variables);

        if let Some(cached) = self.cache.get::<BTreeMap<String, u64>>(&key) {
            return Ok(cached);
        }

        let body = json!({ "query": query, "variables": variables });
        let response: serde_json::Value = self.instance.graphql(&body).await?;
        let batch = parse_commit_pull_requests(&shas, &response)?;

        if batch.had_errors {
            debug!("response contained errors: not caching");
        } else {
            self.cache.put(&key, &batch.numbers)?;
        }

        Ok(batch.numbers)
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<ForgeRelease>> {
        let result = self
            .instance
            .repos(&self.config.owner, &self.config.repo)
            .releases()
            .get_by_tag(tag)
            .await;

        match result {
            Ok(release) => Ok(Some(ForgeRelease {
                id: release.id.0,
                tag: release.tag_name,
                body: release.body.unwrap_or_default(),
            })),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == StatusCode::NOT_FOUND =>
            {
                debug!("no release found for tag: {tag}");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update_release_notes(&self, req: UpdateReleaseRequest) -> Result<()> {
        self.instance
            .repos(&self.config.owner, &self.config.repo)
            .releases()
            .update(req.release_id)
            .body(&req.body)
            .send()
            .await?;

        Ok(())
    }
}
