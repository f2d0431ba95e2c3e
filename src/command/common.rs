//! Shared setup for every command: repository, configuration, forge
//! client and version tags.
use log::*;
use semver::Version;
use std::path::PathBuf;

use crate::{
    Result,
    backfill,
    changelog::{Changelog, ChangelogEntry, Renderer, SectionFilter},
    classifier::Classifier,
    cli::Args,
    config::{ChangelogConfig, Config},
    error::ChroniclerError,
    forge::{
        cache::ResponseCache,
        config::{RemoteConfig, resolve_token},
        github::Github,
        manager::{ForgeManager, ForgeOptions},
        request::PullRequest,
    },
    repo::{CommitRange, GitHistory, Repository},
    resolver::Resolver,
    version::{self, BumpType, Tag},
};

const DEFAULT_REMOTE: &str = "origin";

/// Everything a command needs to resolve, render and publish.
pub struct Context {
    pub git: Box<dyn GitHistory>,
    pub forge: ForgeManager,
    pub config: Config,
    /// Repository working directory.
    pub root: PathBuf,
    /// Version tags, oldest first.
    pub tags: Vec<Tag>,
    pub changelog_path: PathBuf,
    pub filter: SectionFilter,
}

/// A version together with the pull requests that make it up.
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    pub version: Version,
    pub range: CommitRange,
    pub pull_requests: Vec<PullRequest>,
}

impl Context {
    pub fn new(args: &Args, dry_run: bool) -> Result<Self> {
        let repo = Repository::open(args.command.path())?;
        let root = repo.workdir()?.to_path_buf();

        let mut config = Config::load(&root)?;
        if let Some(file) = args.changelog_file.as_ref() {
            config.changelog.file = file.clone();
        }

        let url = match args.remote.as_ref() {
            Some(url) => url.clone(),
            None => repo.remote_url(DEFAULT_REMOTE)?.ok_or_else(|| {
                ChroniclerError::InvalidRemoteUrl(format!(
                    "repository has no {DEFAULT_REMOTE} remote: pass --remote"
                ))
            })?,
        };

        let mut remote = RemoteConfig::from_url(&url)?;
        remote.token = resolve_token(args.token())?;
        info!("using remote {}", remote.slug());

        let cache = ResponseCache::for_repo(&root, args.no_cache);
        let github = Github::new(remote, cache)?;
        let forge = ForgeManager::new(
            Box::new(github),
            ForgeOptions::new(&config.fetch, dry_run),
        );

        let (tags, skipped) = version::collect_tags(repo.tags()?, &config.tag_prefix);
        if !skipped.is_empty() {
            warn!(
                "ignoring {} tags that are not versions: {}",
                skipped.len(),
                skipped.join(", ")
            );
        }
        info!("found {} version tags", tags.len());

        Ok(Self {
            git: Box::new(repo),
            forge,
            changelog_path: root.join(&config.changelog.file),
            config,
            root,
            tags,
            filter: args.section_filter(),
        })
    }

    /// Version given on the command line, bare or as a tag name.
    pub fn version_arg(&self, raw: Option<&str>) -> Result<Option<Version>> {
        raw.map(|raw| version::parse_version_input(raw, &self.config.tag_prefix))
            .transpose()
    }

    pub fn resolver(&self) -> Result<Resolver<'_>> {
        Resolver::new(self.git.as_ref(), &self.forge, self.config.fetch.clone())
    }

    pub fn load_changelog(&self) -> Result<Changelog> {
        Changelog::load(&self.changelog_path)
    }

    /// Range and pull requests for `target`, or for the next version when no
    /// target is given. A tagged target uses the range that produced its
    /// tag; an untagged one runs from the preceding tag to HEAD.
    pub async fn prepare(
        &self,
        target: Option<&Version>,
        forced: Option<BumpType>,
    ) -> Result<PreparedRelease> {
        let resolver = self.resolver()?;

        let Some(target) = target else {
            let latest = version::latest(&self.tags);
            let range = CommitRange::new(
                latest.map(|t| t.name.clone()),
                self.git.head_ref()?,
            );
            let pull_requests = resolver.resolve(&range).await?;
            let version = Classifier::new(&self.config).next_version(
                latest.map(|t| &t.version),
                &pull_requests,
                forced,
            );

            return Ok(PreparedRelease {
                version,
                range,
                pull_requests,
            });
        };

        let range = match self.tags.iter().position(|t| t.version == *target) {
            Some(index) => backfill::range_for(&self.tags, index)?,
            None => CommitRange::new(
                version::previous(&self.tags, target).map(|t| t.name.clone()),
                self.git.head_ref()?,
            ),
        };
        let pull_requests = resolver.resolve(&range).await?;

        Ok(PreparedRelease {
            version: target.clone(),
            range,
            pull_requests,
        })
    }

    pub fn render(
        &self,
        prepared: &PreparedRelease,
        changelog: &Changelog,
    ) -> Result<ChangelogEntry> {
        self.render_with(&self.config.changelog, prepared, changelog)
    }

    /// Render with an overridden changelog configuration.
    pub fn render_with(
        &self,
        changelog_config: &ChangelogConfig,
        prepared: &PreparedRelease,
        changelog: &Changelog,
    ) -> Result<ChangelogEntry> {
        let classified =
            Classifier::new(&self.config).classify_all(&prepared.pull_requests);
        let renderer = Renderer::new(
            changelog_config,
            self.forge.remote_config(),
            self.filter.clone(),
        );
        let prior = changelog.contributors_before(&prepared.version);

        renderer.render(&prepared.version, &classified, &prior)
    }
}
