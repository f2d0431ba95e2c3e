//! Computes the next version, records its changelog entry and bumps the
//! configured version files.
use log::*;
use semver::Version;

use crate::{
    Result,
    changelog::merge,
    cli::Args,
    command::common::Context,
    updater::update_version_files,
    version::{self, BumpType},
};

/// Upsert the entry for the next version and return that version. Version
/// files are rewritten unless `skip_version_files` is set.
pub async fn run(
    ctx: &Context,
    bump: Option<BumpType>,
    skip_version_files: bool,
) -> Result<Version> {
    let prepared = ctx.prepare(None, bump).await?;
    let mut changelog = ctx.load_changelog()?;

    let fresh = ctx.render(&prepared, &changelog)?;
    let entry = merge(changelog.get(&prepared.version), fresh, true);
    changelog.upsert(entry);

    if skip_version_files {
        debug!("skipping version files");
    } else {
        let previous = version::latest(&ctx.tags).map(|t| &t.version);
        update_version_files(
            &ctx.root,
            &ctx.config.version_files,
            previous,
            &prepared.version,
        )?;
    }

    changelog.write(&ctx.changelog_path)?;

    info!(
        "recorded {} pull requests for {} in {}",
        prepared.pull_requests.len(),
        prepared.version,
        ctx.changelog_path.display()
    );

    Ok(prepared.version)
}

pub async fn execute(
    args: &Args,
    bump: Option<BumpType>,
    skip_version_files: bool,
) -> Result<()> {
    let ctx = Context::new(args, false)?;
    let version = run(&ctx, bump, skip_version_files).await?;
    println!("{version}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        changelog::Changelog,
        config::{VersionFile, VersionFileFormat},
        repo::{GitCommit, MockGitHistory},
        test_helpers::{context, forge_with, pull_request, version},
    };
    use std::fs;

    fn history() -> MockGitHistory {
        let mut git = MockGitHistory::new();
        git.expect_head_ref().returning(|| Ok("HEAD".into()));
        git.expect_commits_between().returning(|_| {
            Ok(vec![
                GitCommit {
                    id: "b".repeat(40),
                    message: "Add flag (#11)".into(),
                    parents: vec!["a".into()],
                },
                GitCommit {
                    id: "a".repeat(40),
                    message: "Merge pull request #10 from owner/fix\n\nFix crash".into(),
                    parents: vec!["p".into(), "q".into()],
                },
            ])
        });
        git
    }

    fn forge() -> crate::forge::manager::ForgeManager {
        forge_with(vec![
            pull_request(10, "Fix crash", &["bug"]),
            pull_request(11, "Add flag", &["enhancement"]),
        ])
    }

    #[tokio::test]
    async fn writes_entry_for_next_version() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(history(), forge(), &["v1.0.0"], dir.path());

        let next = run(&ctx, None, false).await.unwrap();
        assert_eq!(next, version("1.1.0"));

        let text = fs::read_to_string(&ctx.changelog_path).unwrap();
        let enhancements = text.find("### Enhancements").unwrap();
        let fixes = text.find("### Bug fixes").unwrap();
        assert!(text.starts_with("# Changelog\n\n## 1.1.0\n"));
        assert!(enhancements < fixes);
        assert!(text.contains("[#10]"));
        assert!(text.contains("[#11]"));
    }

    #[tokio::test]
    async fn rerun_keeps_manual_edits() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(history(), forge(), &["v1.0.0"], dir.path());
        fs::write(
            &ctx.changelog_path,
            "# Changelog\n\n## 1.1.0\n\n### Other changes\n\n- Fix typo in docs\n",
        )
        .unwrap();

        run(&ctx, None, false).await.unwrap();
        run(&ctx, None, false).await.unwrap();

        let changelog = Changelog::load(&ctx.changelog_path).unwrap();
        let entry = changelog.get(&version("1.1.0")).unwrap();
        assert!(entry.to_markdown().contains("- Fix typo in docs"));
        assert_eq!(entry.to_markdown().matches("[#11]").count(), 1);
        assert_eq!(changelog.entries().len(), 1);
    }

    #[tokio::test]
    async fn bumps_configured_version_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(history(), forge(), &["v1.0.0"], dir.path());
        ctx.config.version_files = vec![
            VersionFile::text("VERSION"),
            VersionFile {
                path: "Cargo.toml".into(),
                format: VersionFileFormat::Cargo,
                field: None,
            },
        ];
        fs::write(dir.path().join("VERSION"), "1.0.0\n").unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();

        run(&ctx, None, false).await.unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("VERSION")).unwrap(),
            "1.1.0\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("Cargo.toml")).unwrap(),
            "[package]\nname = \"demo\"\nversion = \"1.1.0\"\n"
        );
    }

    #[tokio::test]
    async fn bad_version_file_blocks_the_changelog_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(history(), forge(), &["v1.0.0"], dir.path());
        ctx.config.version_files = vec![VersionFile::text("VERSION")];
        fs::write(dir.path().join("VERSION"), "0.9.0\n").unwrap();

        assert!(run(&ctx, None, false).await.is_err());
        assert!(!ctx.changelog_path.exists());

        run(&ctx, None, true).await.unwrap();
        assert!(ctx.changelog_path.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("VERSION")).unwrap(),
            "0.9.0\n"
        );
    }
}
