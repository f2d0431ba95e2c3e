//! Changelog file model: preamble followed by version entries, newest
//! first.
//!
//! Parsing only accepts the layout this tool writes. Everything before the
//! first `## <version>` heading is preamble and is carried through
//! untouched. Once entries start, any other top-level heading is a format
//! error so that unexpected content is never silently rewritten.
use log::*;
use semver::Version;
use std::{collections::BTreeSet, path::Path};

use crate::{
    Result,
    changelog::entry::ChangelogEntry,
    error::ChroniclerError,
    version::parse_version,
};

/// Preamble of a newly created changelog.
pub const DEFAULT_PREAMBLE: &str = "# Changelog\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    preamble: String,
    entries: Vec<ChangelogEntry>,
}

impl Default for Changelog {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.into(),
            entries: vec![],
        }
    }
}

fn heading_version(line: &str) -> Option<Version> {
    let rest = line.strip_prefix("## ")?;
    parse_version(rest.trim()).ok()
}

fn is_top_heading(line: &str) -> bool {
    let line = line.trim_end();
    line.starts_with("# ") || line.starts_with("## ") || line == "#" || line == "##"
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

impl Changelog {
    /// Parse changelog text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut preamble = String::new();
        let mut sources: Vec<(Version, String)> = vec![];
        let mut seen: BTreeSet<Version> = BTreeSet::new();
        let mut in_fence = false;

        for (index, line) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;

            if !in_fence && line.starts_with("## ") {
                if let Some(version) = heading_version(line) {
                    if !seen.insert(version.clone()) {
                        return Err(ChroniclerError::format(
                            line_no,
                            format!("duplicate entry for version {version}"),
                        ));
                    }
                    sources.push((version, line.to_string()));
                    continue;
                }
            }

            if !in_fence && !sources.is_empty() && is_top_heading(line) {
                return Err(ChroniclerError::format(
                    line_no,
                    format!("unexpected heading \"{}\"", line.trim_end()),
                ));
            }

            if is_fence(line) {
                in_fence = !in_fence;
            }

            match sources.last_mut() {
                Some((_, source)) => source.push_str(line),
                None => preamble.push_str(line),
            }
        }

        let entries = sources
            .into_iter()
            .map(|(version, source)| ChangelogEntry::parse(version, &source))
            .collect();

        Ok(Self { preamble, entries })
    }

    /// Read the changelog at `path`. A missing file is an empty changelog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("{} not found: starting a new changelog", path.display());
            return Ok(Self::default());
        }

        debug!("loading changelog from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialize())?;
        info!("wrote {}", path.display());
        Ok(())
    }

    /// Same preamble, no entries.
    pub fn cleared(&self) -> Self {
        Self {
            preamble: self.preamble.clone(),
            entries: vec![],
        }
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[ChangelogEntry] {
        &self.entries
    }

    pub fn get(&self, version: &Version) -> Option<&ChangelogEntry> {
        self.entries.iter().find(|e| e.version == *version)
    }

    /// Lowercased logins credited in any entry older than `version`.
    pub fn contributors_before(&self, version: &Version) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| e.version < *version)
            .flat_map(|e| e.contributor_logins())
            .collect()
    }

    /// Replace the entry for the same version in place, or insert it in
    /// descending version order.
    pub fn upsert(&mut self, entry: ChangelogEntry) {
        if let Some(existing) =
            self.entries.iter_mut().find(|e| e.version == entry.version)
        {
            *existing = entry;
            return;
        }

        let position = self
            .entries
            .iter()
            .position(|e| e.version < entry.version)
            .unwrap_or(self.entries.len());

        self.entries.insert(position, entry);
    }

    pub fn serialize(&self) -> String {
        let mut out = self.preamble.clone();
        let mut previous_built = false;

        for entry in self.entries.iter() {
            let built = entry.source().is_none();

            // parsed neighbours keep their original spacing
            if (built || previous_built) && !out.is_empty() {
                ensure_blank_line(&mut out);
            }

            out.push_str(&entry.to_markdown());
            previous_built = built;
        }

        out
    }
}

fn ensure_blank_line(out: &mut String) {
    if out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}
