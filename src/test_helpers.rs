//! Common test helper functions shared across test modules.
use secrecy::SecretString;
use semver::Version;
use std::path::Path;

use crate::{
    changelog::SectionFilter,
    command::common::Context,
    config::Config,
    forge::{
        config::RemoteConfig,
        manager::{ForgeManager, ForgeOptions},
        request::PullRequest,
        traits::MockForge,
    },
    repo::MockGitHistory,
    version::collect_tags,
};

/// Creates a test RemoteConfig pointing at `github.com/owner/repo`.
pub fn remote_config() -> RemoteConfig {
    RemoteConfig {
        host: "github.com".to_string(),
        port: None,
        scheme: "https".to_string(),
        owner: "owner".to_string(),
        repo: "repo".to_string(),
        token: SecretString::from("test-token".to_string()),
    }
}

/// Creates a merged pull request authored by `author-<number>`.
pub fn pull_request(number: u64, title: &str, labels: &[&str]) -> PullRequest {
    authored_pull_request(number, title, labels, &format!("author-{number}"))
}

pub fn authored_pull_request(
    number: u64,
    title: &str,
    labels: &[&str],
    author: &str,
) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        author: author.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        merged_at: None,
        url: format!("https://github.com/owner/repo/pull/{number}"),
    }
}

pub fn version(raw: &str) -> Version {
    Version::parse(raw).unwrap()
}

/// Forge manager whose pull request lookups answer from `known`.
pub fn forge_with(known: Vec<PullRequest>) -> ForgeManager {
    let mut mock = MockForge::new();
    mock.expect_remote_config().returning(remote_config);
    mock.expect_get_pull_requests().returning(move |numbers| {
        Ok(known
            .iter()
            .filter(|pr| numbers.contains(&pr.number))
            .cloned()
            .collect())
    });
    ForgeManager::new(Box::new(mock), ForgeOptions::default())
}

/// Command context over mocked history with `v`-prefixed tags and the
/// changelog stored under `dir`.
pub fn context(
    git: MockGitHistory,
    forge: ForgeManager,
    tags: &[&str],
    dir: &Path,
) -> Context {
    let config = Config {
        tag_prefix: "v".into(),
        ..Default::default()
    };
    let raw = tags
        .iter()
        .map(|name| (name.to_string(), format!("sha-{name}")))
        .collect();
    let (tags, _) = collect_tags(raw, &config.tag_prefix);

    Context {
        git: Box::new(git),
        forge,
        changelog_path: dir.join(&config.changelog.file),
        config,
        root: dir.to_path_buf(),
        tags,
        filter: SectionFilter::default(),
    }
}
