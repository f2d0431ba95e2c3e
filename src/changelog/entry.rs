//! Structured form of a single release entry.
//!
//! Entries parsed from disk keep their exact source text and serialize back
//! to it unchanged. Entries built by the renderer or merger have no source
//! and serialize from their structure.
use regex::Regex;
use semver::Version;
use std::{collections::BTreeSet, sync::LazyLock};

/// Heading of the contributors block.
pub const CONTRIBUTORS_HEADING: &str = "Contributors";
/// Body of an entry without any changes.
pub const NO_CHANGES_MARKER: &str = "<!-- No changes -->";

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)\b").expect("invalid regex"));
static LOGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[@([^\]]+)\]").expect("invalid regex"));

/// One changelog bullet, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogLine {
    /// Verbatim markdown without the trailing newline.
    pub text: String,
    /// Pull request the line is for. `None` for hand-written lines.
    pub number: Option<u64>,
}

impl ChangelogLine {
    pub fn new(text: impl Into<String>, number: Option<u64>) -> Self {
        Self {
            text: text.into(),
            number,
        }
    }

    /// Line as found in a document: the first `#N` is taken as its pull
    /// request.
    pub fn parsed(text: impl Into<String>) -> Self {
        let text = text.into();
        let number = references(&text).into_iter().next();
        Self { text, number }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogSection {
    pub title: String,
    pub lines: Vec<ChangelogLine>,
}

impl ChangelogSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: vec![],
        }
    }
}

/// A credited author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub login: String,
    /// Verbatim markdown line.
    pub text: String,
}

impl Contributor {
    pub fn parsed(text: impl Into<String>) -> Self {
        let text = text.into();
        let login = match LOGIN_RE.captures(&text) {
            Some(caps) => caps[1].to_string(),
            None => text
                .trim_start_matches(['-', '*', ' '])
                .trim_start_matches('@')
                .trim()
                .to_string(),
        };
        Self { login, text }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub version: Version,
    /// Free text between the version heading and the first section.
    pub preface: String,
    pub sections: Vec<ChangelogSection>,
    pub contributors: Vec<Contributor>,
    source: Option<String>,
}

/// All `#N` references in a piece of text, in order of appearance.
pub fn references(text: &str) -> Vec<u64> {
    REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn is_item_start(line: &str) -> bool {
    line.starts_with("- ") || line.starts_with("* ") || line == "-" || line == "*"
}

enum Block {
    Preface,
    Section(usize),
    Contributors,
}

impl ChangelogEntry {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            preface: String::new(),
            sections: vec![],
            contributors: vec![],
            source: None,
        }
    }

    pub fn with_sections(mut self, sections: Vec<ChangelogSection>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_contributors(mut self, contributors: Vec<Contributor>) -> Self {
        self.contributors = contributors;
        self
    }

    pub fn with_preface(mut self, preface: impl Into<String>) -> Self {
        self.preface = preface.into();
        self
    }

    /// Build an entry from its source text. `source` starts at the version
    /// heading and runs up to the next one.
    pub fn parse(version: Version, source: &str) -> Self {
        let mut entry = Self::new(version);
        let mut preface: Vec<&str> = vec![];
        let mut block = Block::Preface;
        let mut in_fence = false;
        // whether the last item may take continuation lines
        let mut open_item = false;

        for raw in source.lines().skip(1) {
            let line = raw.trim_end();

            if !in_fence {
                if let Some(title) = line.strip_prefix("### ") {
                    let title = title.trim();
                    if title.eq_ignore_ascii_case(CONTRIBUTORS_HEADING) {
                        block = Block::Contributors;
                    } else {
                        entry.sections.push(ChangelogSection::new(title));
                        block = Block::Section(entry.sections.len() - 1);
                    }
                    open_item = false;
                    continue;
                }

                if line.trim() == NO_CHANGES_MARKER {
                    continue;
                }
            }

            let fence = is_fence(line);

            match block {
                Block::Preface => {
                    if in_fence || !line.is_empty() || !preface.is_empty() {
                        preface.push(raw);
                    }
                }
                Block::Contributors => {
                    if !line.trim().is_empty() {
                        entry.contributors.push(Contributor::parsed(line));
                    }
                }
                Block::Section(index) => {
                    let lines = &mut entry.sections[index].lines;
                    if line.is_empty() && !in_fence {
                        open_item = false;
                    } else if !in_fence && is_item_start(line) {
                        lines.push(ChangelogLine::parsed(line));
                        open_item = true;
                    } else if let Some(last) =
                        lines.last_mut().filter(|_| open_item || in_fence)
                    {
                        last.text.push('\n');
                        last.text.push_str(raw.trim_end_matches(['\r', '\n']));
                        if last.number.is_none() {
                            last.number = references(&last.text).into_iter().next();
                        }
                    } else {
                        lines.push(ChangelogLine::parsed(line));
                        open_item = true;
                    }
                }
            }

            if fence {
                in_fence = !in_fence;
            }
        }

        entry.preface = preface.join("\n").trim_end().to_string();
        entry.source = Some(source.to_string());
        entry
    }

    /// Exact text this entry was parsed from, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn section(&self, title: &str) -> Option<&ChangelogSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.preface.is_empty()
            && self.contributors.is_empty()
            && self.sections.iter().all(|s| s.lines.is_empty())
    }

    /// Every pull request number referenced by the preface or any section
    /// line.
    pub fn references(&self) -> BTreeSet<u64> {
        let lines = self
            .sections
            .iter()
            .flat_map(|s| s.lines.iter())
            .flat_map(|l| references(&l.text).into_iter().chain(l.number));

        references(&self.preface).into_iter().chain(lines).collect()
    }

    /// Lowercased logins credited in this entry.
    pub fn contributor_logins(&self) -> BTreeSet<String> {
        self.contributors
            .iter()
            .map(|c| c.login.to_lowercase())
            .collect()
    }

    fn render_body(&self) -> String {
        let mut blocks: Vec<String> = vec![];

        if !self.preface.is_empty() {
            blocks.push(self.preface.clone());
        }

        for section in self.sections.iter() {
            blocks.push(format!("### {}", section.title));
            if !section.lines.is_empty() {
                let lines = section.lines.iter().map(|l| l.text.as_str());
                blocks.push(lines.collect::<Vec<_>>().join("\n"));
            }
        }

        if !self.contributors.is_empty() {
            blocks.push(format!("### {CONTRIBUTORS_HEADING}"));
            let lines = self.contributors.iter().map(|c| c.text.as_str());
            blocks.push(lines.collect::<Vec<_>>().join("\n"));
        }

        if blocks.is_empty() {
            blocks.push(NO_CHANGES_MARKER.to_string());
        }

        blocks.join("\n\n")
    }

    /// Markdown for the entry, heading included.
    pub fn to_markdown(&self) -> String {
        if let Some(source) = &self.source {
            return source.clone();
        }
        format!("## {}\n\n{}\n", self.version, self.render_body())
    }

    /// Entry text without its version heading, as used for release notes.
    pub fn body(&self) -> String {
        let markdown = self.to_markdown();
        let body = markdown.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        let body = body.trim_start_matches(['\n', '\r']).trim_end();
        format!("{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::version;

    const SOURCE: &str = "## 1.1.0

Highlights of this release.

### Enhancements

- Add flag ([#11](https://github.com/owner/repo/pull/11))
- Multi line item ([#12](https://github.com/owner/repo/pull/12))
  with a continuation

### Other changes

- Fix typo in docs

### Contributors

- [@alice](https://github.com/alice)
- [@Bob](https://github.com/Bob)

";

    #[test]
    fn parses_structure() {
        let entry = ChangelogEntry::parse(version("1.1.0"), SOURCE);

        assert_eq!(entry.preface, "Highlights of this release.");
        assert_eq!(entry.sections.len(), 2);
        assert_eq!(entry.sections[0].title, "Enhancements");
        assert_eq!(entry.sections[0].lines.len(), 2);
        assert_eq!(entry.sections[0].lines[0].number, Some(11));
        assert!(entry.sections[0].lines[1].text.ends_with("with a continuation"));
        assert_eq!(entry.sections[1].lines[0].number, None);
        assert_eq!(entry.contributors[1].login, "Bob");
        assert_eq!(
            entry.contributor_logins(),
            BTreeSet::from(["alice".to_string(), "bob".to_string()])
        );
        assert_eq!(entry.references(), BTreeSet::from([11, 12]));
    }

    #[test]
    fn parsed_entry_serializes_to_source() {
        let entry = ChangelogEntry::parse(version("1.1.0"), SOURCE);
        assert_eq!(entry.to_markdown(), SOURCE);
    }

    #[test]
    fn renders_built_entry() {
        let entry = ChangelogEntry::new(version("0.1.0"))
            .with_sections(vec![ChangelogSection {
                title: "Other changes".into(),
                lines: vec![ChangelogLine::new(
                    "- Title ([#1](https://github.com/owner/repo/pull/1))",
                    Some(1),
                )],
            }])
            .with_contributors(vec![Contributor::parsed(
                "- [@author](https://github.com/author)",
            )]);

        assert_eq!(
            entry.to_markdown(),
            "## 0.1.0\n\n### Other changes\n\n- Title ([#1](https://github.com/owner/repo/pull/1))\n\n### Contributors\n\n- [@author](https://github.com/author)\n"
        );
    }

    #[test]
    fn empty_entry_renders_marker() {
        let entry = ChangelogEntry::new(version("0.2.0"));
        assert!(entry.is_empty());
        assert_eq!(entry.to_markdown(), "## 0.2.0\n\n<!-- No changes -->\n");

        let parsed = ChangelogEntry::parse(version("0.2.0"), &entry.to_markdown());
        assert!(parsed.is_empty());
    }

    #[test]
    fn body_drops_heading() {
        let entry = ChangelogEntry::parse(version("1.1.0"), SOURCE);
        let body = entry.body();
        assert!(body.starts_with("Highlights of this release."));
        assert!(body.ends_with("(https://github.com/Bob)\n"));
        assert!(!body.contains("## 1.1.0"));
    }

    #[test]
    fn fenced_headings_stay_in_item() {
        let source = "## 1.0.0\n\n### Other changes\n\n- Example:\n```\n### not a section\n```\n";
        let entry = ChangelogEntry::parse(version("1.0.0"), source);

        assert_eq!(entry.sections.len(), 1);
        assert_eq!(entry.sections[0].lines.len(), 1);
        assert!(entry.sections[0].lines[0].text.contains("### not a section"));
    }
}
