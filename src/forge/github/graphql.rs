//! Batched lookups over the GitHub GraphQL API.
//!
//! One query fetches a whole batch by aliasing each lookup as
//! `prN: pullRequest(number: N)`. Numbers that refer to issues, or to
//! nothing at all, come back as `null` with a `NOT_FOUND` error and are
//! dropped. Commit lookups alias `cI: object(oid: ...)` the same way and
//! read the pull request GitHub associates with each commit.
use chrono::{DateTime, Utc};
use log::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{Result, error::ChroniclerError, forge::request::PullRequest};

const PULL_REQUEST_FIELDS: &str = r#"
fragment PullRequestFields on PullRequest {
  number
  title
  url
  mergedAt
  author {
    login
  }
  labels(first: 100) {
    nodes {
      name
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct AuthorNode {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    nodes: Vec<LabelNode>,
}

#[derive(Debug, Deserialize)]
struct PullRequestNode {
    number: u64,
    title: String,
    url: String,
    #[serde(rename = "mergedAt")]
    merged_at: Option<DateTime<Utc>>,
    author: Option<AuthorNode>,
    labels: Option<LabelConnection>,
}

impl From<PullRequestNode> for PullRequest {
    fn from(node: PullRequestNode) -> Self {
        PullRequest {
            number: node.number,
            title: node.title,
            author: node.author.map(|a| a.login).unwrap_or_default(),
            labels: node
                .labels
                .map(|l| l.nodes.into_iter().map(|n| n.name).collect())
                .unwrap_or_default(),
            merged_at: node.merged_at,
            url: node.url,
        }
    }
}

fn alias(number: u64) -> String {
    format!("pr{number}")
}

/// Query text for a batch of pull request numbers.
pub fn pull_requests_query(numbers: &[u64]) -> String {
    let lookups = numbers
        .iter()
        .map(|n| format!("    {}: pullRequest(number: {n}) {{ ...PullRequestFields }}", alias(*n)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "query($owner: String!, $repo: String!) {{\n  repository(owner: $owner, name: $repo) {{\n{lookups}\n  }}\n}}\n{PULL_REQUEST_FIELDS}"
    )
}

/// Outcome of a batch query.
#[derive(Debug)]
pub struct PullRequestBatch {
    pub pull_requests: Vec<PullRequest>,
    /// Whether the response carried any errors. Such responses are never
    /// cached.
    pub had_errors: bool,
}

/// Fails on any error other than `NOT_FOUND`. Returns whether the response
/// carried errors at all.
fn check_errors(response: &Value) -> Result<bool> {
    let Some(errors) = response.get("errors").and_then(Value::as_array) else {
        return Ok(false);
    };

    for err in errors {
        let kind = err.get("type").and_then(Value::as_str).unwrap_or("");
        let message = err.get("message").and_then(Value::as_str).unwrap_or("");

        if kind == "NOT_FOUND" {
            debug!("skipping unknown reference: {message}");
            continue;
        }

        if kind == "RATE_LIMITED" {
            return Err(ChroniclerError::RateLimitExceeded);
        }

        return Err(ChroniclerError::forge(format!(
            "GraphQL error ({kind}): {message}"
        )));
    }

    Ok(!errors.is_empty())
}

fn repository(response: &Value) -> Result<&Value> {
    response
        .get("data")
        .and_then(|d| d.get("repository"))
        .ok_or_else(|| {
            ChroniclerError::forge("GraphQL response is missing repository data")
        })
}

/// Extract pull requests from a raw GraphQL response. `NOT_FOUND` errors
/// are tolerated, any other error fails the batch.
pub fn parse_pull_requests(
    numbers: &[u64],
    response: &Value,
) -> Result<PullRequestBatch> {
    let had_errors = check_errors(response)?;
    let repository = repository(response)?;

    let mut pull_requests = vec![];

    for number in numbers {
        match repository.get(alias(*number)) {
            Some(Value::Null) | None => {
                debug!("#{number} is not a pull request: skipping");
            }
            Some(node) => {
                let node: PullRequestNode =
                    serde_json::from_value(node.clone())?;
                pull_requests.push(node.into());
            }
        }
    }

    Ok(PullRequestBatch {
        pull_requests,
        had_errors,
    })
}

#[derive(Debug, Deserialize)]
struct NumberNode {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct AssociatedPullRequests {
    nodes: Vec<NumberNode>,
}

#[derive(Debug, Deserialize)]
struct CommitNode {
    #[serde(rename = "associatedPullRequests")]
    associated_pull_requests: Option<AssociatedPullRequests>,
}

/// Query text resolving each commit SHA to the pull request it belongs to.
pub fn commit_pull_requests_query(shas: &[String]) -> String {
    let lookups = shas
        .iter()
        .enumerate()
        .map(|(i, sha)| {
            format!(
                "    c{i}: object(oid: \"{sha}\") {{ ... on Commit {{ associatedPullRequests(first: 1) {{ nodes {{ number }} }} }} }}"
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "query($owner: String!, $repo: String!) {{\n  repository(owner: $owner, name: $repo) {{\n{lookups}\n  }}\n}}\n"
    )
}

/// Outcome of a commit lookup batch.
#[derive(Debug)]
pub struct CommitBatch {
    /// SHA to pull request number. Commits with no pull request are absent.
    pub numbers: BTreeMap<String, u64>,
    pub had_errors: bool,
}

/// Extract commit to pull request associations from a raw GraphQL
/// response built by [`commit_pull_requests_query`] for the same `shas`.
pub fn parse_commit_pull_requests(
    shas: &[String],
    response: &Value,
) -> Result<CommitBatch> {
    let had_errors = check_errors(response)?;
    let repository = repository(response)?;

    let mut numbers = BTreeMap::new();

    for (i, sha) in shas.iter().enumerate() {
        let node = match repository.get(format!("c{i}")) {
            Some(Value::Null) | None => {
                debug!("commit {sha} is unknown to the forge: skipping");
                continue;
            }
            Some(node) => node,
        };

        let node: CommitNode = serde_json::from_value(node.clone())?;
        match node
            .associated_pull_requests
            .and_then(|prs| prs.nodes.into_iter().next())
        {
            Some(pr) => {
                numbers.insert(sha.clone(), pr.number);
            }
            None => debug!("commit {sha} has no pull request"),
        }
    }

    Ok(CommitBatch {
        numbers,
        had_errors,
    })
}
