//! CLI argument parsing.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{changelog::SectionFilter, version::BumpType};

/// Global CLI arguments shared by every subcommand.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Bypass the on-disk response cache.
    pub no_cache: bool,

    #[arg(long, default_value = "", global = true)]
    /// GitHub access token. Falls back to GITHUB_TOKEN, then `gh auth token`.
    pub github_token: String,

    #[arg(long, global = true)]
    /// Repository URL. Defaults to the `origin` remote.
    pub remote: Option<String>,

    #[arg(long = "only-section", global = true)]
    /// Only render these sections. Repeatable.
    pub only_sections: Vec<String>,

    #[arg(long = "without-section", global = true)]
    /// Never render these sections. Repeatable.
    pub without_sections: Vec<String>,

    #[arg(long, global = true)]
    /// Changelog path relative to the repository root.
    pub changelog_file: Option<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Release bookkeeping subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the next version, add its entry to the changelog and print
    /// the version.
    Release {
        /// Repository path.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force a bump instead of detecting it from labels.
        #[arg(long, value_enum)]
        bump: Option<BumpType>,

        /// Leave the configured version files alone.
        #[arg(long, default_value_t = false)]
        no_version_files: bool,
    },

    /// Render the changelog entry for a version.
    Changelog {
        /// Repository path.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Version to render, bare or as a tag name. Defaults to the next
        /// version.
        #[arg(long)]
        version: Option<String>,

        /// Write the entry to the changelog instead of printing it.
        #[arg(long, default_value_t = false)]
        write: bool,

        /// Replace an existing entry instead of merging into it.
        #[arg(long, default_value_t = false)]
        no_merge: bool,
    },

    /// Print the contributors of a version.
    Contributors {
        /// Repository path.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Version to inspect. Defaults to the next version.
        #[arg(long)]
        version: Option<String>,
    },

    /// Regenerate changelog entries for every tagged release.
    Backfill {
        /// Repository path.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Skip releases older than this version, bare or as a tag name.
        #[arg(long)]
        start_version: Option<String>,

        /// Leave out the release for the oldest tag.
        #[arg(long, default_value_t = false)]
        skip_first: bool,

        /// Discard existing entries instead of merging into them.
        #[arg(long, default_value_t = false)]
        clear: bool,
    },

    /// Copy changelog entries into the notes of existing releases.
    Sync {
        /// Repository path.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only sync this version.
        #[arg(long)]
        version: Option<String>,

        /// Log updates instead of performing them.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

impl Args {
    pub fn section_filter(&self) -> SectionFilter {
        SectionFilter {
            only: self.only_sections.clone(),
            without: self.without_sections.clone(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        Some(self.github_token.as_str()).filter(|t| !t.is_empty())
    }
}

impl Command {
    pub fn path(&self) -> &PathBuf {
        match self {
            Command::Release { path, .. }
            | Command::Changelog { path, .. }
            | Command::Contributors { path, .. }
            | Command::Backfill { path, .. }
            | Command::Sync { path, .. } => path,
        }
    }
}
