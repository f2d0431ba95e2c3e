//! Maps a commit range to the pull requests that produced it.
//!
//! Commits are walked first-parent only, so a merge commit stands in for
//! its whole pull request and branch commits never reach the scan. Each
//! commit runs through the reference strategies. A merge commit no strategy
//! recognises is looked up on the forge by its second parent, the head of
//! the merged branch. Anything still unresolved is untracked and silently
//! omitted.
use futures_util::{StreamExt, TryStreamExt, stream};
use log::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    Result,
    config::FetchConfig,
    error::ChroniclerError,
    forge::{manager::ForgeManager, request::PullRequest},
    repo::{CommitRange, GitCommit, GitHistory},
};

pub mod reference;

use reference::ReferenceStrategy;

pub struct Resolver<'a> {
    git: &'a dyn GitHistory,
    forge: &'a ForgeManager,
    fetch: FetchConfig,
    strategies: Vec<Box<dyn ReferenceStrategy>>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        git: &'a dyn GitHistory,
        forge: &'a ForgeManager,
        fetch: FetchConfig,
    ) -> Result<Self> {
        Ok(Self {
            git,
            forge,
            fetch,
            strategies: reference::default_strategies()?,
        })
    }

    /// Pull request numbers referenced by the commits in `range`.
    pub async fn references(&self, range: &CommitRange) -> Result<BTreeSet<u64>> {
        let commits = self.git.commits_between(range)?;
        let mut numbers = BTreeSet::new();
        let mut merged_heads = vec![];

        for commit in commits.iter() {
            match reference::extract(&self.strategies, commit) {
                Some(number) => {
                    numbers.insert(number);
                }
                None => match commit.parents.get(1) {
                    Some(head) => merged_heads.push((commit, head.clone())),
                    None => untracked(commit),
                },
            }
        }

        if !merged_heads.is_empty() {
            let heads = merged_heads.iter().map(|(_, head)| head.clone()).collect();
            let associated = self.lookup_commits(heads).await?;

            for (commit, head) in merged_heads {
                match associated.get(&head) {
                    Some(number) => {
                        debug!("{} merged #{number}", short_id(&commit.id));
                        numbers.insert(*number);
                    }
                    None => untracked(commit),
                }
            }
        }

        info!(
            "{range}: {} commits, {} pull requests",
            commits.len(),
            numbers.len()
        );

        Ok(numbers)
    }

    /// Pull requests merged in `range`, ascending by number.
    pub async fn resolve(&self, range: &CommitRange) -> Result<Vec<PullRequest>> {
        let numbers = self.references(range).await?;
        let fetched = self.fetch_all(&numbers).await?;

        for number in numbers.iter().filter(|n| !fetched.contains_key(n)) {
            debug!("#{number} is unknown to the forge: dropping");
        }

        Ok(fetched.into_values().collect())
    }

    async fn lookup_commits(
        &self,
        shas: Vec<String>,
    ) -> Result<BTreeMap<String, u64>> {
        let batches = shas
            .chunks(self.fetch.batch_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect::<Vec<_>>();

        debug!(
            "looking up {} merged branches in {} batches",
            shas.len(),
            batches.len()
        );

        let forge = self.forge;

        stream::iter(batches)
            .map(|batch| forge.get_commit_pull_requests(batch))
            .buffer_unordered(self.fetch.concurrency.max(1))
            .try_fold(BTreeMap::new(), |mut acc, found| async move {
                acc.extend(found);
                Ok::<_, ChroniclerError>(acc)
            })
            .await
    }

    async fn fetch_all(
        &self,
        numbers: &BTreeSet<u64>,
    ) -> Result<BTreeMap<u64, PullRequest>> {
        let ordered = numbers.iter().copied().collect::<Vec<_>>();
        let batches = ordered
            .chunks(self.fetch.batch_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect::<Vec<_>>();

        if batches.is_empty() {
            return Ok(BTreeMap::new());
        }

        debug!(
            "fetching {} pull requests in {} batches",
            ordered.len(),
            batches.len()
        );

        let forge = self.forge;

        stream::iter(batches)
            .map(|batch| forge.get_pull_requests(batch))
            .buffer_unordered(self.fetch.concurrency.max(1))
            .try_fold(BTreeMap::new(), |mut acc, prs| async move {
                for pr in prs {
                    acc.insert(pr.number, pr);
                }
                Ok::<_, ChroniclerError>(acc)
            })
            .await
    }
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(7)]
}

fn untracked(commit: &GitCommit) {
    debug!("untracked commit {}: {}", short_id(&commit.id), commit.subject());
}
