//! Regenerates changelog entries for every historical release.
//!
//! Ranges are derived from consecutive version tags: the root of history
//! up to the oldest tag, then each tag up to the next. Every range is
//! validated before any work starts, and the result is only returned once
//! all ranges succeeded, so callers write the file at most once.
use log::*;
use semver::Version;

use crate::{
    Result,
    changelog::{Changelog, Renderer, merge},
    classifier::Classifier,
    error::ChroniclerError,
    repo::CommitRange,
    resolver::Resolver,
    version::Tag,
};

/// Backfill behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillOptions {
    /// Skip releases older than this version. Older tags still bound the
    /// first processed range.
    pub start_version: Option<Version>,
    /// Leave out the range from the root of history to the oldest tag.
    pub skip_first: bool,
    /// Start from an empty changelog instead of merging into the existing
    /// one.
    pub clear: bool,
}

/// Commit range that produced `tags[index]`, with `tags` sorted oldest
/// first.
pub fn range_for(tags: &[Tag], index: usize) -> Result<CommitRange> {
    if index >= tags.len() {
        return Err(ChroniclerError::resolution(format!(
            "release index {index} is out of range for {} tags",
            tags.len()
        )));
    }

    let start = match index {
        0 => None,
        _ => Some(tags[index - 1].name.clone()),
    };

    Ok(CommitRange::new(start, tags[index].name.clone()))
}

/// Indices of the tags to regenerate under `options`.
pub fn selected_indices(tags: &[Tag], options: &BackfillOptions) -> Vec<usize> {
    tags.iter()
        .enumerate()
        .filter(|(index, _)| !(options.skip_first && *index == 0))
        .filter(|(_, tag)| {
            options
                .start_version
                .as_ref()
                .is_none_or(|start| tag.version >= *start)
        })
        .map(|(index, _)| index)
        .collect()
}

pub struct Backfill<'a> {
    resolver: &'a Resolver<'a>,
    classifier: Classifier<'a>,
    renderer: Renderer<'a>,
}

impl<'a> Backfill<'a> {
    pub fn new(
        resolver: &'a Resolver<'a>,
        classifier: Classifier<'a>,
        renderer: Renderer<'a>,
    ) -> Self {
        Self {
            resolver,
            classifier,
            renderer,
        }
    }

    /// Regenerate the entries for `tags` (oldest first) into `existing`.
    pub async fn run(
        &self,
        tags: &[Tag],
        existing: Changelog,
        options: &BackfillOptions,
    ) -> Result<Changelog> {
        let indices = selected_indices(tags, options);

        let ranges = indices
            .iter()
            .map(|index| Ok((&tags[*index], range_for(tags, *index)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut changelog = if options.clear {
            existing.cleared()
        } else {
            existing
        };

        if ranges.is_empty() {
            warn!("no releases to backfill");
            return Ok(changelog);
        }

        info!("backfilling {} releases", ranges.len());

        for (tag, range) in ranges {
            let prs = self.resolver.resolve(&range).await?;
            let classified = self.classifier.classify_all(&prs);
            let prior = changelog.contributors_before(&tag.version);
            let fresh = self.renderer.render(&tag.version, &classified, &prior)?;
            let entry = merge(changelog.get(&tag.version), fresh, true);

            debug!("{tag}: {} pull requests", prs.len());
            changelog.upsert(entry);
        }

        Ok(changelog)
    }
}
