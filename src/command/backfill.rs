//! Regenerates the changelog from every version tag.
use log::*;

use crate::{
    Result,
    backfill::{Backfill, BackfillOptions},
    changelog::Renderer,
    classifier::Classifier,
    cli::Args,
    command::common::Context,
};

/// Backfill into the changelog file. The file is written once, after every
/// release succeeded.
pub async fn run(ctx: &Context, options: &BackfillOptions) -> Result<()> {
    let existing = ctx.load_changelog()?;
    let resolver = ctx.resolver()?;
    let backfill = Backfill::new(
        &resolver,
        Classifier::new(&ctx.config),
        Renderer::new(
            &ctx.config.changelog,
            ctx.forge.remote_config(),
            ctx.filter.clone(),
        ),
    );

    let changelog = backfill.run(&ctx.tags, existing, options).await?;
    changelog.write(&ctx.changelog_path)?;

    info!(
        "changelog now holds {} releases",
        changelog.entries().len()
    );

    Ok(())
}

pub async fn execute(
    args: &Args,
    start_version: Option<&str>,
    skip_first: bool,
    clear: bool,
) -> Result<()> {
    let ctx = Context::new(args, false)?;
    let options = BackfillOptions {
        start_version: ctx.version_arg(start_version)?,
        skip_first,
        clear,
    };
    run(&ctx, &options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ChroniclerError,
        repo::{GitCommit, MockGitHistory},
        test_helpers::{context, forge_with, pull_request},
    };
    use std::fs;

    fn history(fail_on: &'static str) -> MockGitHistory {
        let mut git = MockGitHistory::new();
        git.expect_commits_between().returning(move |range| {
            if range.end == fail_on {
                return Err(ChroniclerError::resolution("broken range"));
            }
            let number: u64 = if range.end == "v0.1.0" { 1 } else { 2 };
            Ok(vec![GitCommit {
                id: format!("{number:040}"),
                message: format!("Change (#{number})"),
                parents: vec!["p".into()],
            }])
        });
        git
    }

    fn forge() -> crate::forge::manager::ForgeManager {
        forge_with(vec![
            pull_request(1, "First", &["bug"]),
            pull_request(2, "Second", &["enhancement"]),
        ])
    }

    #[tokio::test]
    async fn writes_all_releases() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(history("none"), forge(), &["v0.1.0", "v0.2.0"], dir.path());

        run(&ctx, &BackfillOptions::default()).await.unwrap();

        let text = fs::read_to_string(&ctx.changelog_path).unwrap();
        let newer = text.find("## 0.2.0").unwrap();
        let older = text.find("## 0.1.0").unwrap();
        assert!(newer < older);
    }

    #[test_log::test(tokio::test)]
    async fn failed_range_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(history("v0.2.0"), forge(), &["v0.1.0", "v0.2.0"], dir.path());
        fs::write(&ctx.changelog_path, "# Changelog\n\nhand written\n").unwrap();

        let result = run(&ctx, &BackfillOptions::default()).await;

        assert!(result.is_err());
        assert_eq!(
            fs::read_to_string(&ctx.changelog_path).unwrap(),
            "# Changelog\n\nhand written\n"
        );
    }
}
