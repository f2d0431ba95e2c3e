//! Renders a single changelog entry, printing it or writing it to the file.
use log::*;
use semver::Version;

use crate::{
    Result,
    changelog::{ChangelogEntry, merge},
    cli::Args,
    command::common::Context,
};

/// Entry for `version` (the next version when `None`). With `write`, the
/// entry is merged into the changelog file and the merged result returned.
pub async fn run(
    ctx: &Context,
    version: Option<&Version>,
    write: bool,
    allow_merge: bool,
) -> Result<ChangelogEntry> {
    let prepared = ctx.prepare(version, None).await?;
    let mut changelog = ctx.load_changelog()?;
    let fresh = ctx.render(&prepared, &changelog)?;

    if !write {
        return Ok(fresh);
    }

    let entry = merge(changelog.get(&prepared.version), fresh, allow_merge);
    changelog.upsert(entry.clone());
    changelog.write(&ctx.changelog_path)?;

    info!(
        "wrote {} to {}",
        prepared.version,
        ctx.changelog_path.display()
    );

    Ok(entry)
}

pub async fn execute(
    args: &Args,
    version: Option<&str>,
    write: bool,
    no_merge: bool,
) -> Result<()> {
    let ctx = Context::new(args, false)?;
    let version = ctx.version_arg(version)?;
    let entry = run(&ctx, version.as_ref(), write, !no_merge).await?;

    if !write {
        print!("{}", entry.to_markdown());
    }

    Ok(())
}
