//! Label based classification of pull requests and version bump detection.
use log::*;
use semver::Version;

use crate::{
    config::Config,
    forge::request::PullRequest,
    version::{self, BumpType},
};

/// Where a pull request lands in the changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Section(String),
    Ignored,
}

/// A pull request together with the section it renders under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPullRequest {
    pub section: String,
    pub pull_request: PullRequest,
}

pub struct Classifier<'a> {
    config: &'a Config,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Ignore labels take precedence over every section mapping. Mappings
    /// are tried in configured order, first match wins.
    pub fn classify(&self, pr: &PullRequest) -> Classification {
        let changelog = &self.config.changelog;

        if pr.has_any_label(&changelog.ignore_labels) {
            return Classification::Ignored;
        }

        let section = changelog
            .labels
            .iter()
            .find(|mapping| pr.has_label(&mapping.label))
            .map(|mapping| mapping.section.clone())
            .unwrap_or_else(|| changelog.catch_all_section.clone());

        Classification::Section(section)
    }

    /// Classify every pull request, dropping the ignored ones.
    pub fn classify_all(&self, prs: &[PullRequest]) -> Vec<ClassifiedPullRequest> {
        prs.iter()
            .filter_map(|pr| match self.classify(pr) {
                Classification::Section(section) => Some(ClassifiedPullRequest {
                    section,
                    pull_request: pr.clone(),
                }),
                Classification::Ignored => {
                    debug!("#{} ignored by label", pr.number);
                    None
                }
            })
            .collect()
    }

    /// Highest severity signalled by any pull request, never lower than the
    /// configured default. Ignored pull requests still count.
    pub fn bump_type(&self, prs: &[PullRequest]) -> BumpType {
        let detected = prs
            .iter()
            .map(|pr| {
                if pr.has_any_label(&self.config.major_labels) {
                    BumpType::Major
                } else if pr.has_any_label(&self.config.minor_labels) {
                    BumpType::Minor
                } else {
                    BumpType::Patch
                }
            })
            .max()
            .unwrap_or_default();

        detected.max(self.config.default_bump)
    }

    /// Version following `previous` (or `0.0.0`) for the given pull
    /// requests. A forced bump overrides label detection.
    pub fn next_version(
        &self,
        previous: Option<&Version>,
        prs: &[PullRequest],
        forced: Option<BumpType>,
    ) -> Version {
        let bump_type = forced.unwrap_or_else(|| self.bump_type(prs));
        let base = previous.cloned().unwrap_or_else(|| Version::new(0, 0, 0));
        let next = version::bump(&base, bump_type);

        info!("{bump_type} bump: {base} -> {next}");

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ConfigBuilder, changelog::ChangelogConfigBuilder},
        test_helpers::pull_request,
    };

    fn config_with_ignore(ignore: &[&str]) -> Config {
        let changelog = ChangelogConfigBuilder::default()
            .ignore_labels(ignore.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .build()
            .unwrap();
        ConfigBuilder::default().changelog(changelog).build().unwrap()
    }

    #[test]
    fn ignore_beats_section_mapping() {
        let config = config_with_ignore(&["internal"]);
        let classifier = Classifier::new(&config);

        let pr = pull_request(1, "Refactor", &["internal", "enhancement"]);
        assert_eq!(classifier.classify(&pr), Classification::Ignored);
        assert!(classifier.classify_all(&[pr]).is_empty());
    }

    #[test]
    fn first_matching_mapping_wins() {
        let config = Config::default();
        let classifier = Classifier::new(&config);

        let pr = pull_request(2, "Fix and add", &["bug", "breaking"]);
        assert_eq!(
            classifier.classify(&pr),
            Classification::Section("Breaking changes".into())
        );
    }

    #[test]
    fn unlabelled_goes_to_catch_all() {
        let config = Config::default();
        let classifier = Classifier::new(&config);

        let pr = pull_request(3, "Chore", &["dependencies"]);
        assert_eq!(
            classifier.classify(&pr),
            Classification::Section("Other changes".into())
        );
    }

    #[test]
    fn bump_takes_highest_severity() {
        let config = Config::default();
        let classifier = Classifier::new(&config);

        let prs = vec![
            pull_request(1, "a", &["bug"]),
            pull_request(2, "b", &["enhancement"]),
        ];
        assert_eq!(classifier.bump_type(&prs), BumpType::Minor);

        let both = vec![pull_request(3, "c", &["enhancement", "breaking"])];
        assert_eq!(classifier.bump_type(&both), BumpType::Major);

        assert_eq!(classifier.bump_type(&[]), BumpType::Patch);
    }

    #[test]
    fn empty_label_sets_disable_levels() {
        let config = ConfigBuilder::default()
            .major_labels(Vec::<String>::new())
            .minor_labels(Vec::<String>::new())
            .build()
            .unwrap();
        let classifier = Classifier::new(&config);

        let prs = vec![pull_request(1, "a", &["breaking", "enhancement"])];
        assert_eq!(classifier.bump_type(&prs), BumpType::Patch);
    }

    #[test]
    fn ignored_prs_still_count_toward_bump() {
        let config = config_with_ignore(&["internal"]);
        let classifier = Classifier::new(&config);

        let prs = vec![pull_request(1, "a", &["internal", "breaking"])];
        assert_eq!(classifier.bump_type(&prs), BumpType::Major);
    }

    #[test]
    fn next_version_from_labels() {
        let config = ConfigBuilder::default()
            .minor_labels(vec!["enhancement".to_string()])
            .build()
            .unwrap();
        let classifier = Classifier::new(&config);
        let prs = vec![
            pull_request(10, "Fix crash", &["bug"]),
            pull_request(11, "Add flag", &["enhancement"]),
        ];

        let previous = Version::new(1, 0, 0);
        assert_eq!(
            classifier.next_version(Some(&previous), &prs, None),
            Version::new(1, 1, 0)
        );
        assert_eq!(
            classifier.next_version(Some(&previous), &prs, Some(BumpType::Major)),
            Version::new(2, 0, 0)
        );
        assert_eq!(
            classifier.next_version(None, &[], None),
            Version::new(0, 0, 1)
        );
    }

    #[test]
    fn default_bump_is_a_floor() {
        let config = ConfigBuilder::default()
            .default_bump(BumpType::Minor)
            .build()
            .unwrap();
        let classifier = Classifier::new(&config);

        let prs = vec![pull_request(1, "fix", &["bug"])];
        assert_eq!(classifier.bump_type(&prs), BumpType::Minor);
    }

    #[test]
    fn release_candidate_graduates_instead_of_stepping_past() {
        let config = Config::default();
        let classifier = Classifier::new(&config);
        let prs = vec![pull_request(4, "Fix crash", &["bug"])];

        let candidate = Version::parse("1.0.0-rc.1").unwrap();
        assert_eq!(
            classifier.next_version(Some(&candidate), &prs, None),
            Version::new(1, 0, 0)
        );
        assert_eq!(
            classifier.next_version(Some(&candidate), &prs, Some(BumpType::Minor)),
            Version::new(1, 0, 0)
        );
    }
}
