//! Command execution.
//!
//! Every command builds a [`common::Context`] from the CLI arguments: the
//! git repository, `chronicler.toml`, the GitHub client and the version
//! tags. Each command module then exposes a `run` function working on that
//! context, and an `execute` entry point that builds the context and prints
//! results to stdout.
//!
//! Commands that write the changelog do so once, after all work succeeded,
//! so a failure never leaves a partially updated file behind.

/// Shared context and release preparation.
pub mod common;

/// `release`: compute the next version and record its entry.
pub mod release;

/// `changelog`: render one entry, optionally writing it.
pub mod changelog;

/// `contributors`: list the authors credited for a version.
pub mod contributors;

/// `backfill`: regenerate entries for every tagged release.
pub mod backfill;

/// `sync`: copy changelog entries into forge release notes.
pub mod sync;
