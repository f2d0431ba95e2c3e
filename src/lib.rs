//! Changelog synthesis and release versioning from labeled pull requests.
//!
//! History between two revisions is mapped to the pull requests that
//! produced it, those pull requests are classified by label into changelog
//! sections and a semantic version bump, and the result is merged into a
//! Markdown changelog without discarding manual edits. Entries can then be
//! pushed to the notes of existing GitHub releases.
pub mod backfill;
pub mod changelog;
pub mod classifier;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod forge;
pub mod repo;
pub mod resolver;
pub mod sync;
pub mod updater;
pub mod version;

pub use error::{ChroniclerError, Result};

#[cfg(test)]
pub mod test_helpers;
