//! Version parsing, ordering and increment rules.
//!
//! Versions are plain [`semver::Version`] values with build metadata
//! removed at parse time, so ordering never depends on it. Tags map to
//! versions through the configured tag prefix.

use log::*;
use semver::{BuildMetadata, Prerelease, Version};
use serde::Deserialize;
use std::fmt::Display;
use strum::{Display as StrumDisplay, EnumString};

use crate::{Result, error::ChroniclerError};

/// Severity of a version increment, ordered patch < minor < major.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    StrumDisplay,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BumpType {
    #[default]
    Patch,
    Minor,
    Major,
}

/// Git tag that represents a release version, linking a semantic version to
/// a specific commit SHA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name, including any prefix.
    pub name: String,
    /// Commit SHA the tag points to.
    pub sha: String,
    /// Semantic version parsed from tag name.
    pub version: Version,
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse a version string, dropping build metadata.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let mut version = Version::parse(trimmed)?;
    version.build = BuildMetadata::EMPTY;
    Ok(version)
}

/// Parse a tag name into a version under the given prefix convention.
pub fn parse_tag_version(name: &str, prefix: &str) -> Result<Version> {
    let stripped =
        name.strip_prefix(prefix)
            .ok_or_else(|| ChroniclerError::VersionParse {
                tag: name.to_string(),
                message: format!("missing tag prefix \"{prefix}\""),
            })?;

    parse_version(stripped).map_err(|err| ChroniclerError::VersionParse {
        tag: name.to_string(),
        message: err.to_string(),
    })
}

/// Parse a version given on the command line, either bare (`1.2.0`) or as
/// a tag name under `prefix` (`release-1.2.0`).
pub fn parse_version_input(raw: &str, prefix: &str) -> Result<Version> {
    let trimmed = raw.trim();

    match trimmed.strip_prefix(prefix).filter(|_| !prefix.is_empty()) {
        Some(stripped) => parse_version(stripped).or_else(|_| parse_version(trimmed)),
        None => parse_version(trimmed),
    }
}

/// Format the tag name for a version.
pub fn tag_name(version: &Version, prefix: &str) -> String {
    format!("{prefix}{version}")
}

/// Build the ordered (oldest first) list of version tags from raw
/// `(name, sha)` pairs. Names that do not parse are skipped and returned
/// alongside so callers can report them.
pub fn collect_tags(
    raw: Vec<(String, String)>,
    prefix: &str,
) -> (Vec<Tag>, Vec<String>) {
    let mut tags: Vec<Tag> = vec![];
    let mut skipped = vec![];

    for (name, sha) in raw {
        match parse_tag_version(&name, prefix) {
            Ok(version) => {
                if let Some(existing) =
                    tags.iter().find(|t| t.version == version)
                {
                    warn!(
                        "tags {} and {name} resolve to the same version: keeping {}",
                        existing.name, existing.name
                    );
                    skipped.push(name);
                    continue;
                }
                tags.push(Tag { name, sha, version });
            }
            Err(err) => {
                debug!("skipping tag: {err}");
                skipped.push(name);
            }
        }
    }

    tags.sort_by(|a, b| a.version.cmp(&b.version));
    (tags, skipped)
}

/// Newest tag in an oldest-first list.
pub fn latest(tags: &[Tag]) -> Option<&Tag> {
    tags.last()
}

/// The tag strictly preceding `version` in an oldest-first list. The version
/// itself does not need to be tagged.
pub fn previous<'a>(tags: &'a [Tag], version: &Version) -> Option<&'a Tag> {
    tags.iter().rev().find(|t| t.version < *version)
}

/// Increment a version. A pre-release graduates to the release it precedes
/// when that release already satisfies the requested severity, so a patch
/// bump of `1.0.0-rc.1` yields `1.0.0` rather than `1.0.1`.
pub fn bump(previous: &Version, bump_type: BumpType) -> Version {
    let mut next = Version::new(previous.major, previous.minor, previous.patch);
    let is_pre = !previous.pre.is_empty();

    match bump_type {
        BumpType::Major => {
            if !(is_pre && previous.minor == 0 && previous.patch == 0) {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
        }
        BumpType::Minor => {
            if !(is_pre && previous.patch == 0) {
                next.minor += 1;
                next.patch = 0;
            }
        }
        BumpType::Patch => {
            if !is_pre {
                next.patch += 1;
            }
        }
    }

    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    next
}
