//! Configuration loading and parsing for `chronicler.toml` files.
//!
//! The configuration is read once per invocation and treated as immutable
//! input by every pipeline stage. A missing file yields the defaults.
use derive_builder::Builder;
use log::*;
use serde::Deserialize;
use std::path::Path;

use crate::{Result, error::ChroniclerError, version::BumpType};

pub mod changelog;
pub mod fetch;
pub mod version_file;

pub use changelog::{ChangelogConfig, LabelSection};
pub use fetch::FetchConfig;
pub use version_file::{VersionFile, VersionFileFormat};

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "chronicler.toml";

/// Root configuration structure for `chronicler.toml`.
#[derive(Debug, Clone, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct Config {
    /// Prefix identifying version tags, e.g. "v" for "v1.2.0".
    pub tag_prefix: String,
    /// Labels that trigger a major version bump. Empty disables major bumps.
    pub major_labels: Vec<String>,
    /// Labels that trigger a minor version bump. Empty disables minor bumps.
    pub minor_labels: Vec<String>,
    /// Bump applied when no major or minor label is present.
    pub default_bump: BumpType,
    /// Changelog generation settings.
    pub changelog: ChangelogConfig,
    /// Forge request tuning.
    pub fetch: FetchConfig,
    /// Files `release` bumps to the new version.
    pub version_files: Vec<VersionFile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_prefix: "".into(),
            major_labels: vec!["breaking".into()],
            minor_labels: vec!["enhancement".into(), "feature".into()],
            default_bump: BumpType::Patch,
            changelog: ChangelogConfig::default(),
            fetch: FetchConfig::default(),
            version_files: vec![],
        }
    }
}

impl Config {
    /// Load `chronicler.toml` from a repository directory, falling back to
    /// defaults when the file does not exist.
    pub fn load(repo_path: &Path) -> Result<Self> {
        let path = repo_path.join(DEFAULT_CONFIG_FILE);

        if !path.exists() {
            info!("no configuration found: using default");
            return Ok(Self::default());
        }

        debug!("loading configuration from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration content.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.batch_size == 0 {
            return Err(ChroniclerError::invalid_config(
                "fetch.batch_size must be greater than 0",
            ));
        }

        if self.fetch.concurrency == 0 {
            return Err(ChroniclerError::invalid_config(
                "fetch.concurrency must be greater than 0",
            ));
        }

        if self.changelog.catch_all_section.trim().is_empty() {
            return Err(ChroniclerError::invalid_config(
                "changelog.catch_all_section must not be empty",
            ));
        }

        if let Some(file) = self
            .version_files
            .iter()
            .find(|f| f.path.as_os_str().is_empty() || f.path.is_absolute())
        {
            return Err(ChroniclerError::invalid_config(format!(
                "version file \"{}\" must be a path relative to the repository root",
                file.path.display()
            )));
        }

        if let Some(mapping) =
            self.changelog.labels.iter().find(|l| l.section.trim().is_empty())
        {
            return Err(ChroniclerError::invalid_config(format!(
                "label \"{}\" maps to an empty section",
                mapping.label
            )));
        }

        Ok(())
    }
}
