//! Lists the contributors credited for a version.
use semver::Version;

use crate::{
    Result, changelog::Contributor, cli::Args, command::common::Context,
};

/// Contributors for `version` (the next version when `None`), rendered even
/// when the changelog omits the contributors block.
pub async fn run(ctx: &Context, version: Option<&Version>) -> Result<Vec<Contributor>> {
    let prepared = ctx.prepare(version, None).await?;
    let changelog = ctx.load_changelog()?;

    let mut config = ctx.config.changelog.clone();
    config.contributors = true;

    let entry = ctx.render_with(&config, &prepared, &changelog)?;
    Ok(entry.contributors)
}

pub async fn execute(args: &Args, version: Option<&str>) -> Result<()> {
    let ctx = Context::new(args, false)?;
    let version = ctx.version_arg(version)?;

    for contributor in run(&ctx, version.as_ref()).await? {
        println!("{}", contributor.login);
    }

    Ok(())
}
