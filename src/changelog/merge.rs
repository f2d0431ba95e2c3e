//! Folds a fresh render into an existing entry without losing manual edits.
//!
//! Lines already in the previous entry are kept exactly as written, in their
//! original order. Fresh lines are only added for pull requests the previous
//! entry does not mention anywhere, so merging the same render twice changes
//! nothing the second time.
use std::collections::BTreeSet;

use crate::changelog::entry::{ChangelogEntry, ChangelogSection};

/// Section titles in merged order: the fresh order, with sections only
/// known to `previous` placed after their nearest previous neighbour.
fn merged_order(previous: &ChangelogEntry, fresh: &ChangelogEntry) -> Vec<String> {
    let mut order: Vec<String> =
        fresh.sections.iter().map(|s| s.title.clone()).collect();
    let mut anchor: Option<usize> = None;

    for section in previous.sections.iter() {
        match order.iter().position(|t| *t == section.title) {
            Some(index) => anchor = Some(index),
            None => {
                let index = anchor.map_or(0, |a| a + 1);
                order.insert(index, section.title.clone());
                anchor = Some(index);
            }
        }
    }

    order
}

/// Merge `fresh` into `previous`. Without a previous entry, or when merging
/// is disallowed, `fresh` wins outright.
pub fn merge(
    previous: Option<&ChangelogEntry>,
    fresh: ChangelogEntry,
    allow_merge: bool,
) -> ChangelogEntry {
    let Some(previous) = previous else {
        return fresh;
    };

    if !allow_merge {
        return fresh;
    }

    let mut known: BTreeSet<u64> = previous.references();
    let mut sections = vec![];

    for title in merged_order(previous, &fresh) {
        let existing = previous.section(&title);
        let mut section = existing
            .cloned()
            .unwrap_or_else(|| ChangelogSection::new(title.as_str()));

        if let Some(fresh_section) = fresh.section(&title) {
            for line in fresh_section.lines.iter() {
                let is_new = match line.number {
                    Some(number) => known.insert(number),
                    None => !section.lines.iter().any(|l| l.text == line.text),
                };
                if is_new {
                    section.lines.push(line.clone());
                }
            }
        }

        if existing.is_some() || !section.lines.is_empty() {
            sections.push(section);
        }
    }

    let credited = previous.contributor_logins();
    let mut contributors = previous.contributors.clone();
    contributors.extend(
        fresh
            .contributors
            .into_iter()
            .filter(|c| !credited.contains(&c.login.to_lowercase())),
    );

    let preface = if previous.preface.is_empty() {
        fresh.preface
    } else {
        previous.preface.clone()
    };

    ChangelogEntry::new(fresh.version)
        .with_preface(preface)
        .with_sections(sections)
        .with_contributors(contributors)
}
