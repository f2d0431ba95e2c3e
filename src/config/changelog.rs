use derive_builder::Builder;
use serde::Deserialize;

/// Default changelog path relative to the repository root.
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";
/// Section for pull requests that match no configured label.
pub const DEFAULT_CATCH_ALL_SECTION: &str = "Other changes";
/// Default Tera template for a single changelog line.
pub const DEFAULT_LINE_TEMPLATE: &str =
    "- {{ title }} ([#{{ number }}]({{ url }}))";

/// Maps a pull request label to the changelog section it lands in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[builder(setter(into))]
pub struct LabelSection {
    pub label: String,
    pub section: String,
}

impl LabelSection {
    pub fn new(label: &str, section: &str) -> Self {
        Self {
            label: label.into(),
            section: section.into(),
        }
    }
}

fn default_label_sections() -> Vec<LabelSection> {
    vec![
        LabelSection::new("breaking", "Breaking changes"),
        LabelSection::new("enhancement", "Enhancements"),
        LabelSection::new("feature", "Enhancements"),
        LabelSection::new("bug", "Bug fixes"),
        LabelSection::new("fix", "Bug fixes"),
        LabelSection::new("documentation", "Documentation"),
    ]
}

/// Changelog generation settings.
#[derive(Debug, Clone, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)] // Use default for missing fields
pub struct ChangelogConfig {
    /// Changelog path relative to the repository root.
    pub file: String,
    /// Appends a contributors block to each entry.
    pub contributors: bool,
    /// Pull requests carrying any of these labels are left out entirely.
    pub ignore_labels: Vec<String>,
    /// Authors never credited in the contributors block.
    pub ignore_authors: Vec<String>,
    /// Tera template for one line; receives `title`, `number`, `url` and
    /// `author`.
    pub line_template: String,
    /// Prefixes stripped from pull request titles before rendering.
    pub trim_title_prefixes: Vec<String>,
    /// Label to section mapping. Evaluated top to bottom, first match wins.
    pub labels: Vec<LabelSection>,
    /// Display order of sections.
    pub section_order: Vec<String>,
    /// Section for pull requests without a mapped label.
    pub catch_all_section: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_CHANGELOG_FILE.into(),
            contributors: true,
            ignore_labels: vec![],
            ignore_authors: vec!["dependabot".into(), "dependabot[bot]".into()],
            line_template: DEFAULT_LINE_TEMPLATE.into(),
            trim_title_prefixes: vec![],
            labels: default_label_sections(),
            section_order: vec![
                "Breaking changes".into(),
                "Enhancements".into(),
                "Bug fixes".into(),
                "Documentation".into(),
            ],
            catch_all_section: DEFAULT_CATCH_ALL_SECTION.into(),
        }
    }
}

impl ChangelogConfig {
    /// Every known section in display order: the configured order, then
    /// sections only referenced by label mappings, then the catch-all.
    pub fn sections(&self) -> Vec<String> {
        let mut sections: Vec<String> = vec![];

        let referenced = self
            .section_order
            .iter()
            .chain(self.labels.iter().map(|l| &l.section))
            .chain(std::iter::once(&self.catch_all_section));

        for section in referenced {
            if !sections.contains(section) {
                sections.push(section.clone());
            }
        }

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_follow_configured_order_then_catch_all() {
        let config = ChangelogConfig::default();
        assert_eq!(
            config.sections(),
            vec![
                "Breaking changes",
                "Enhancements",
                "Bug fixes",
                "Documentation",
                "Other changes"
            ]
        );
    }

    #[test]
    fn sections_include_unlisted_label_targets() {
        let config = ChangelogConfigBuilder::default()
            .labels(vec![
                LabelSection::new("perf", "Performance"),
                LabelSection::new("bug", "Bug fixes"),
            ])
            .section_order(vec!["Bug fixes".to_string()])
            .build()
            .unwrap();

        assert_eq!(
            config.sections(),
            vec!["Bug fixes", "Performance", "Other changes"]
        );
    }

    #[test]
    fn catch_all_keeps_explicit_position() {
        let config = ChangelogConfigBuilder::default()
            .labels(vec![LabelSection::new("bug", "Bug fixes")])
            .section_order(vec![
                "Other changes".to_string(),
                "Bug fixes".to_string(),
            ])
            .build()
            .unwrap();

        assert_eq!(config.sections(), vec!["Other changes", "Bug fixes"]);
    }
}
