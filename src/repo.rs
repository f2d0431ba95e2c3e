//! Git repository operations for release bookkeeping.
//!
//! This module provides the read-only view of local history the pipeline
//! needs:
//!
//! - Tag listing with the commit each tag points to
//! - First-parent commit enumeration between two revisions
//! - Remote URL lookup for deriving the forge repository
//!
//! The [`GitHistory`] trait is the seam the resolver and backfill
//! orchestrator consume, so they can be exercised without a repository on
//! disk.
use git2::{ErrorCode, Oid, Sort};
use log::*;
#[cfg(test)]
use mockall::automock;
use std::{fmt::Display, path::Path};

use crate::{Result, error::ChroniclerError};

/// Branch preferred as the open end of a release range.
pub const DEFAULT_BRANCH: &str = "main";

/// An ordered pair of repository positions: `start` exclusive, `end`
/// inclusive. An absent `start` means the beginning of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub start: Option<String>,
    pub end: String,
}

impl CommitRange {
    pub fn new(start: Option<String>, end: impl Into<String>) -> Self {
        Self {
            start,
            end: end.into(),
        }
    }
}

impl Display for CommitRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.start {
            Some(start) => write!(f, "{start}..{}", self.end),
            None => write!(f, "(root)..{}", self.end),
        }
    }
}

/// A commit as seen by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitCommit {
    /// Full commit SHA.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Parent SHAs, first parent first.
    pub parents: Vec<String>,
}

impl GitCommit {
    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Read access to repository history.
#[cfg_attr(test, automock)]
pub trait GitHistory {
    /// All tags as `(name, commit sha)` pairs, in no particular order.
    fn tags(&self) -> Result<Vec<(String, String)>>;

    /// First-parent commits reachable from `range.end` and not from
    /// `range.start`, newest first. Fails when an endpoint does not exist
    /// or `start` is not an ancestor of `end`.
    fn commits_between(&self, range: &CommitRange) -> Result<Vec<GitCommit>>;

    /// URL of the named remote, if it exists.
    fn remote_url(&self, name: &str) -> Result<Option<String>>;

    /// Revision used as the open end of an unreleased range.
    fn head_ref(&self) -> Result<String>;
}

/// git2 backed implementation of [`GitHistory`].
pub struct Repository {
    repo: git2::Repository,
}

impl Repository {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path).map_err(|err| {
            ChroniclerError::resolution(format!(
                "no git repository found at {}: {}",
                path.display(),
                err.message()
            ))
        })?;

        Ok(Self { repo })
    }

    /// Working directory of the repository.
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or_else(|| {
            ChroniclerError::resolution("bare repositories are not supported")
        })
    }

    fn resolve_commit(&self, rev: &str) -> Result<Oid> {
        self.repo
            .revparse_single(rev)
            .and_then(|obj| obj.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|_| {
                ChroniclerError::resolution(format!(
                    "revision {rev} not found in history"
                ))
            })
    }
}

impl GitHistory for Repository {
    fn tags(&self) -> Result<Vec<(String, String)>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = vec![];

        for name in names.iter().flatten() {
            let reference = format!("refs/tags/{name}");
            match self
                .repo
                .revparse_single(&reference)
                .and_then(|obj| obj.peel_to_commit())
            {
                Ok(commit) => {
                    tags.push((name.to_string(), commit.id().to_string()))
                }
                Err(err) => {
                    debug!("tag {name} does not point to a commit: {err}")
                }
            }
        }

        Ok(tags)
    }

    fn commits_between(&self, range: &CommitRange) -> Result<Vec<GitCommit>> {
        let end = self.resolve_commit(&range.end)?;
        let start = match &range.start {
            Some(rev) => Some(self.resolve_commit(rev)?),
            None => None,
        };

        if let Some(start) = start {
            if start == end {
                return Ok(vec![]);
            }

            if !self.repo.graph_descendant_of(end, start)? {
                return Err(ChroniclerError::resolution(format!(
                    "{} is not an ancestor of {}; is the tag on a different branch?",
                    range.start.as_deref().unwrap_or_default(),
                    range.end
                )));
            }
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL)?;
        revwalk.simplify_first_parent()?;
        revwalk.push(end)?;
        if let Some(start) = start {
            revwalk.hide(start)?;
        }

        let mut commits = vec![];
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(GitCommit {
                id: commit.id().to_string(),
                message: commit.message().unwrap_or("").to_string(),
                parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            });
        }

        debug!("found {} commits in range {range}", commits.len());

        Ok(commits)
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(|u| u.to_string())),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn head_ref(&self) -> Result<String> {
        if self.resolve_commit(DEFAULT_BRANCH).is_ok() {
            return Ok(DEFAULT_BRANCH.into());
        }
        Ok("HEAD".into())
    }
}

#[cfg(test)]
pub mod test_repo {
    //! Throwaway repositories for tests.
    use git2::{Oid, Signature};
    use tempfile::TempDir;

    pub struct TestRepo {
        pub dir: TempDir,
        pub repo: git2::Repository,
    }

    impl TestRepo {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut opts = git2::RepositoryInitOptions::new();
            opts.initial_head("main");
            let repo = git2::Repository::init_opts(dir.path(), &opts).unwrap();
            Self { dir, repo }
        }

        fn signature() -> Signature<'static> {
            Signature::now("Test User", "test@example.com").unwrap()
        }

        fn tree(&self) -> Oid {
            self.repo.index().unwrap().write_tree().unwrap()
        }

        /// Empty commit on the current branch.
        pub fn commit(&self, message: &str) -> Oid {
            let sig = Self::signature();
            let tree = self.repo.find_tree(self.tree()).unwrap();
            let parent = self
                .repo
                .head()
                .ok()
                .and_then(|h| h.peel_to_commit().ok());
            let parents = parent.iter().collect::<Vec<_>>();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
                .unwrap()
        }

        /// Commit not attached to any branch, with an explicit parent.
        pub fn detached_commit(&self, message: &str, parent: Oid) -> Oid {
            let sig = Self::signature();
            let tree = self.repo.find_tree(self.tree()).unwrap();
            let parent = self.repo.find_commit(parent).unwrap();
            self.repo
                .commit(None, &sig, &sig, message, &tree, &[&parent])
                .unwrap()
        }

        /// Merge commit on the current branch with `other` as second parent.
        pub fn merge(&self, message: &str, other: Oid) -> Oid {
            let sig = Self::signature();
            let tree = self.repo.find_tree(self.tree()).unwrap();
            let head = self.repo.head().unwrap().peel_to_commit().unwrap();
            let other = self.repo.find_commit(other).unwrap();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&head, &other])
                .unwrap()
        }

        pub fn tag(&self, name: &str) {
            let head = self.repo.head().unwrap().peel(git2::ObjectType::Commit).unwrap();
            self.repo.tag_lightweight(name, &head, false).unwrap();
        }

        pub fn annotated_tag(&self, name: &str) {
            let head = self.repo.head().unwrap().peel(git2::ObjectType::Commit).unwrap();
            self.repo
                .tag(name, &head, &Self::signature(), "release", false)
                .unwrap();
        }
    }
}
