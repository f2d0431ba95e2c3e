//! Strategies that recognise which pull request produced a commit.
use regex::Regex;

use crate::{Result, repo::GitCommit};

/// Extracts a pull request number from a commit, if the commit is one the
/// strategy recognises.
pub trait ReferenceStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, commit: &GitCommit) -> Option<u64>;
}

fn capture_number(re: &Regex, haystack: &str) -> Option<u64> {
    re.captures(haystack)
        .and_then(|caps| caps.name("number"))
        .and_then(|m| m.as_str().parse().ok())
}

/// `Merge pull request #N from owner/branch` on a merge commit.
pub struct MergeCommit {
    re: Regex,
}

impl MergeCommit {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(r"^Merge pull request #(?<number>\d+) from ")?,
        })
    }
}

impl ReferenceStrategy for MergeCommit {
    fn name(&self) -> &'static str {
        "merge commit"
    }

    fn extract(&self, commit: &GitCommit) -> Option<u64> {
        if !commit.is_merge() {
            return None;
        }
        capture_number(&self.re, commit.subject())
    }
}

/// Squash merge subject ending with `(#N)`.
pub struct SquashMerge {
    re: Regex,
}

impl SquashMerge {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(r"\(#(?<number>\d+)\)$")?,
        })
    }
}

impl ReferenceStrategy for SquashMerge {
    fn name(&self) -> &'static str {
        "squash merge"
    }

    fn extract(&self, commit: &GitCommit) -> Option<u64> {
        capture_number(&self.re, commit.subject())
    }
}

/// GitLab style `See merge request group/repo!N` in a merge commit body.
pub struct MergeRequest {
    re: Regex,
}

impl MergeRequest {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(r"(?m)^See merge request \S+!(?<number>\d+)\s*$")?,
        })
    }
}

impl ReferenceStrategy for MergeRequest {
    fn name(&self) -> &'static str {
        "merge request"
    }

    fn extract(&self, commit: &GitCommit) -> Option<u64> {
        if !commit.is_merge() {
            return None;
        }
        capture_number(&self.re, &commit.message)
    }
}

/// Strategies in priority order.
pub fn default_strategies() -> Result<Vec<Box<dyn ReferenceStrategy>>> {
    Ok(vec![
        Box::new(MergeCommit::new()?),
        Box::new(SquashMerge::new()?),
        Box::new(MergeRequest::new()?),
    ])
}

/// First number any strategy extracts from `commit`.
pub fn extract(
    strategies: &[Box<dyn ReferenceStrategy>],
    commit: &GitCommit,
) -> Option<u64> {
    strategies.iter().find_map(|s| s.extract(commit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(message: &str, parents: usize) -> GitCommit {
        GitCommit {
            id: "abc".into(),
            message: message.into(),
            parents: (0..parents).map(|i| format!("p{i}")).collect(),
        }
    }

    #[test]
    fn merge_commit_requires_two_parents() {
        let strategy = MergeCommit::new().unwrap();
        let message = "Merge pull request #42 from owner/feature\n\nAdd thing";

        assert_eq!(strategy.extract(&commit(message, 2)), Some(42));
        assert_eq!(strategy.extract(&commit(message, 1)), None);
    }

    #[test]
    fn squash_number_must_end_subject() {
        let strategy = SquashMerge::new().unwrap();

        assert_eq!(strategy.extract(&commit("Add thing (#7)", 1)), Some(7));
        assert_eq!(
            strategy.extract(&commit("Add thing (#7)\n\nCo-authored-by: x", 1)),
            Some(7)
        );
        assert_eq!(strategy.extract(&commit("Revert (#7) partially", 1)), None);
        assert_eq!(strategy.extract(&commit("Fix #7", 1)), None);
    }

    #[test]
    fn merge_request_reads_body() {
        let strategy = MergeRequest::new().unwrap();
        let message =
            "Merge branch 'feature' into 'main'\n\nAdd thing\n\nSee merge request group/repo!13\n";

        assert_eq!(strategy.extract(&commit(message, 2)), Some(13));
        assert_eq!(strategy.extract(&commit(message, 1)), None);
    }

    #[test]
    fn first_matching_strategy_wins() {
        let strategies = default_strategies().unwrap();
        let merged = commit("Merge pull request #5 from o/fix-(#9)", 2);
        assert_eq!(extract(&strategies, &merged), Some(5));

        let plain = commit("Bump version", 1);
        assert_eq!(extract(&strategies, &plain), None);
    }
}
