//! Pushes changelog entries to the notes of existing forge releases.
use futures_util::{StreamExt, TryStreamExt, stream};
use log::*;
use semver::Version;
use std::{collections::BTreeMap, fmt::Display};

use crate::{
    Result,
    changelog::ChangelogEntry,
    error::ChroniclerError,
    forge::{manager::ForgeManager, request::UpdateReleaseRequest},
    version::tag_name,
};

/// Outcome for a single release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Release notes were replaced (or would be, in a dry run).
    Updated,
    /// Release notes already matched.
    Unchanged,
    /// No release exists for the tag.
    Skipped,
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Updated => f.write_str("updated"),
            SyncStatus::Unchanged => f.write_str("unchanged"),
            SyncStatus::Skipped => f.write_str("skipped"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub results: BTreeMap<Version, SyncStatus>,
}

impl SyncReport {
    pub fn count(&self, status: SyncStatus) -> usize {
        self.results.values().filter(|s| **s == status).count()
    }

    pub fn log_summary(&self) {
        info!(
            "release sync: {} updated, {} unchanged, {} skipped",
            self.count(SyncStatus::Updated),
            self.count(SyncStatus::Unchanged),
            self.count(SyncStatus::Skipped),
        );
    }
}

pub struct ReleaseSync<'a> {
    forge: &'a ForgeManager,
    tag_prefix: &'a str,
    concurrency: usize,
}

impl<'a> ReleaseSync<'a> {
    pub fn new(forge: &'a ForgeManager, tag_prefix: &'a str, concurrency: usize) -> Self {
        Self {
            forge,
            tag_prefix,
            concurrency: concurrency.max(1),
        }
    }

    async fn sync_entry(&self, entry: &ChangelogEntry) -> Result<(Version, SyncStatus)> {
        let tag = tag_name(&entry.version, self.tag_prefix);

        let Some(release) = self.forge.get_release_by_tag(&tag).await? else {
            warn!("no release found for {tag}: skipping");
            return Ok((entry.version.clone(), SyncStatus::Skipped));
        };

        let body = entry.body();

        if release.body.trim_end() == body.trim_end() {
            debug!("{tag}: release notes up to date");
            return Ok((entry.version.clone(), SyncStatus::Unchanged));
        }

        self.forge
            .update_release_notes(UpdateReleaseRequest {
                release_id: release.id,
                tag: tag.clone(),
                body,
            })
            .await?;

        info!("{tag}: release notes updated");
        Ok((entry.version.clone(), SyncStatus::Updated))
    }

    pub async fn sync(&self, entries: &[ChangelogEntry]) -> Result<SyncReport> {
        let results = stream::iter(entries)
            .map(|entry| self.sync_entry(entry))
            .buffer_unordered(self.concurrency)
            .try_fold(BTreeMap::new(), |mut acc, (version, status)| async move {
                acc.insert(version, status);
                Ok::<_, ChroniclerError>(acc)
            })
            .await?;

        Ok(SyncReport { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forge::{
            config::RemoteConfig,
            manager::ForgeOptions,
            request::ForgeRelease,
            traits::MockForge,
        },
        test_helpers::version,
    };

    const ENTRY: &str = "## 1.0.0\n\n### Bug fixes\n\n- Fix (#1)\n";

    fn entry(raw: &str) -> ChangelogEntry {
        ChangelogEntry::parse(version(raw), &ENTRY.replace("1.0.0", raw))
    }

    fn mock() -> MockForge {
        let mut mock = MockForge::new();
        mock.expect_remote_config().returning(RemoteConfig::default);
        mock
    }

    fn release(id: u64, tag: &str, body: &str) -> Option<ForgeRelease> {
        Some(ForgeRelease {
            id,
            tag: tag.into(),
            body: body.into(),
        })
    }

    #[tokio::test]
    async fn reports_each_status() {
        let mut mock = mock();
        mock.expect_get_release_by_tag().returning(|tag| {
            Ok(match tag {
                "v1.0.0" => release(1, tag, "outdated"),
                "v1.1.0" => release(2, tag, "### Bug fixes\n\n- Fix (#1)\n\n\n"),
                _ => None,
            })
        });
        mock.expect_update_release_notes()
            .times(1)
            .withf(|req| {
                req.release_id == 1 && req.body == "### Bug fixes\n\n- Fix (#1)\n"
            })
            .returning(|_| Ok(()));

        let forge = ForgeManager::new(Box::new(mock), ForgeOptions::default());
        let sync = ReleaseSync::new(&forge, "v", 4);

        let report = sync
            .sync(&[entry("1.0.0"), entry("1.1.0"), entry("1.2.0")])
            .await
            .unwrap();

        assert_eq!(report.results[&version("1.0.0")], SyncStatus::Updated);
        assert_eq!(report.results[&version("1.1.0")], SyncStatus::Unchanged);
        assert_eq!(report.results[&version("1.2.0")], SyncStatus::Skipped);
        assert_eq!(report.count(SyncStatus::Updated), 1);
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let mut mock = mock();
        mock.expect_get_release_by_tag()
            .returning(|tag| Ok(release(9, tag, "old")));
        mock.expect_update_release_notes().never();

        let options = ForgeOptions {
            dry_run: true,
            ..Default::default()
        };
        let forge = ForgeManager::new(Box::new(mock), options);
        let sync = ReleaseSync::new(&forge, "", 1);

        let report = sync.sync(&[entry("1.0.0")]).await.unwrap();
        assert_eq!(report.results[&version("1.0.0")], SyncStatus::Updated);
    }

    #[tokio::test]
    async fn second_sync_is_unchanged() {
        let mut mock = mock();
        mock.expect_get_release_by_tag()
            .returning(|tag| Ok(release(3, tag, &entry("1.0.0").body())));
        mock.expect_update_release_notes().never();

        let forge = ForgeManager::new(Box::new(mock), ForgeOptions::default());
        let report = ReleaseSync::new(&forge, "", 2)
            .sync(&[entry("1.0.0")])
            .await
            .unwrap();

        assert_eq!(report.count(SyncStatus::Unchanged), 1);
    }

    #[tokio::test]
    async fn fatal_lookup_error_aborts() {
        let mut mock = mock();
        mock.expect_get_release_by_tag().returning(|_| {
            Err(ChroniclerError::AuthenticationError("bad credentials".into()))
        });

        let forge = ForgeManager::new(Box::new(mock), ForgeOptions::default());
        let result = ReleaseSync::new(&forge, "v", 2).sync(&[entry("1.0.0")]).await;

        assert!(result.is_err());
    }
}
