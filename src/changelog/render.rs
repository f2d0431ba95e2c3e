//! Renders classified pull requests into a fresh changelog entry.
use log::*;
use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    Result,
    changelog::entry::{ChangelogEntry, ChangelogLine, ChangelogSection, Contributor},
    classifier::ClassifiedPullRequest,
    config::ChangelogConfig,
    forge::{config::RemoteConfig, request::PullRequest},
};

/// Restricts which sections are rendered. Titles compare
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter {
    /// When non-empty, only these sections render.
    pub only: Vec<String>,
    /// Sections never rendered.
    pub without: Vec<String>,
}

impl SectionFilter {
    pub fn allows(&self, title: &str) -> bool {
        let matches = |s: &String| s.eq_ignore_ascii_case(title);
        (self.only.is_empty() || self.only.iter().any(matches))
            && !self.without.iter().any(matches)
    }
}

#[derive(Debug, Serialize)]
struct LineContext<'a> {
    title: &'a str,
    number: u64,
    url: &'a str,
    author: &'a str,
}

pub struct Renderer<'a> {
    config: &'a ChangelogConfig,
    remote: &'a RemoteConfig,
    filter: SectionFilter,
}

impl<'a> Renderer<'a> {
    pub fn new(
        config: &'a ChangelogConfig,
        remote: &'a RemoteConfig,
        filter: SectionFilter,
    ) -> Self {
        Self {
            config,
            remote,
            filter,
        }
    }

    fn trim_title<'t>(&self, title: &'t str) -> &'t str {
        let stripped = self
            .config
            .trim_title_prefixes
            .iter()
            .find_map(|prefix| title.strip_prefix(prefix.as_str()))
            .unwrap_or(title);
        stripped.trim()
    }

    fn render_line(&self, pr: &PullRequest) -> Result<ChangelogLine> {
        let context = LineContext {
            title: self.trim_title(&pr.title),
            number: pr.number,
            url: &pr.url,
            author: &pr.author,
        };
        let context = tera::Context::from_serialize(&context)?;
        let text = tera::Tera::one_off(&self.config.line_template, &context, false)?;

        Ok(ChangelogLine::new(text.trim_end(), Some(pr.number)))
    }

    /// Pull requests grouped by rendered section title, in display order.
    fn grouped<'p>(
        &self,
        classified: &'p [ClassifiedPullRequest],
    ) -> Vec<(String, Vec<&'p PullRequest>)> {
        let mut by_section: BTreeMap<&str, Vec<&PullRequest>> = BTreeMap::new();

        for item in classified.iter() {
            if !self.filter.allows(&item.section) {
                continue;
            }
            by_section
                .entry(item.section.as_str())
                .or_default()
                .push(&item.pull_request);
        }

        let mut ordered = vec![];
        for title in self.config.sections() {
            if let Some(mut prs) = by_section.remove(title.as_str()) {
                prs.sort_by_key(|pr| pr.number);
                prs.dedup_by_key(|pr| pr.number);
                ordered.push((title, prs));
            }
        }

        // sections unknown to the configuration still render, after the rest
        for (title, mut prs) in by_section {
            prs.sort_by_key(|pr| pr.number);
            prs.dedup_by_key(|pr| pr.number);
            ordered.push((title.to_string(), prs));
        }

        ordered
    }

    /// Authors to credit, excluding ignored and previously credited ones,
    /// sorted case-insensitively.
    pub fn contributors(
        &self,
        prs: &[&PullRequest],
        prior: &BTreeSet<String>,
    ) -> Vec<Contributor> {
        let ignored: BTreeSet<String> = self
            .config
            .ignore_authors
            .iter()
            .map(|a| a.to_lowercase())
            .collect();

        let mut logins: BTreeMap<String, &str> = BTreeMap::new();
        for pr in prs.iter() {
            let key = pr.author.to_lowercase();
            if pr.author.is_empty() || ignored.contains(&key) || prior.contains(&key) {
                continue;
            }
            logins.entry(key).or_insert(pr.author.as_str());
        }

        logins
            .into_values()
            .map(|login| Contributor {
                login: login.to_string(),
                text: format!("- [@{login}]({})", self.remote.user_url(login)),
            })
            .collect()
    }

    /// Fresh entry for `version`. `prior` holds lowercased logins credited
    /// in earlier releases.
    pub fn render(
        &self,
        version: &Version,
        classified: &[ClassifiedPullRequest],
        prior: &BTreeSet<String>,
    ) -> Result<ChangelogEntry> {
        let grouped = self.grouped(classified);
        let mut sections = vec![];
        let mut rendered: Vec<&PullRequest> = vec![];

        for (title, prs) in grouped {
            let mut section = ChangelogSection::new(title);
            for pr in prs {
                section.lines.push(self.render_line(pr)?);
                rendered.push(pr);
            }
            sections.push(section);
        }

        let contributors = if self.config.contributors {
            self.contributors(&rendered, prior)
        } else {
            vec![]
        };

        debug!(
            "rendered {version}: {} sections, {} lines, {} contributors",
            sections.len(),
            rendered.len(),
            contributors.len()
        );

        Ok(ChangelogEntry::new(version.clone())
            .with_sections(sections)
            .with_contributors(contributors))
    }
}
