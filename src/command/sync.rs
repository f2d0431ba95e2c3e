//! Publishes changelog entries as release notes.
use log::*;
use semver::Version;

use crate::{
    Result,
    changelog::ChangelogEntry,
    cli::Args,
    command::common::Context,
    sync::{ReleaseSync, SyncReport},
};

/// Sync every changelog entry, or only `version` when given.
pub async fn run(ctx: &Context, version: Option<&Version>) -> Result<SyncReport> {
    let changelog = ctx.load_changelog()?;

    let entries: Vec<ChangelogEntry> = changelog
        .entries()
        .iter()
        .filter(|e| version.is_none_or(|v| e.version == *v))
        .cloned()
        .collect();

    if entries.is_empty() {
        warn!("no changelog entries to sync");
        return Ok(SyncReport::default());
    }

    let report = ReleaseSync::new(
        &ctx.forge,
        &ctx.config.tag_prefix,
        ctx.config.fetch.concurrency,
    )
    .sync(&entries)
    .await?;

    report.log_summary();
    Ok(report)
}

pub async fn execute(args: &Args, version: Option<&str>, dry_run: bool) -> Result<()> {
    let ctx = Context::new(args, dry_run)?;
    let version = ctx.version_arg(version)?;
    let report = run(&ctx, version.as_ref()).await?;

    for (version, status) in report.results.iter() {
        println!("{version}: {status}");
    }

    Ok(())
}
