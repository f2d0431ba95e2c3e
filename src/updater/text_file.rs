use log::*;
use semver::Version;

use crate::{Result, error::ChroniclerError, updater::VersionUpdater};

/// A file that mentions the version verbatim, such as `VERSION` or a
/// `__version__ = "1.2.0"` line. Every standalone occurrence of the
/// previous version is replaced. `11.0.0` or `1.0.0-rc.1` do not count as
/// occurrences of `1.0.0`, while `v1.0.0` does.
pub struct TextFile;

fn extends_before(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn extends_after(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')
}

impl VersionUpdater for TextFile {
    fn update(
        &self,
        content: &str,
        previous: Option<&Version>,
        next: &Version,
    ) -> Result<String> {
        let Some(previous) = previous else {
            warn!("no previous version to replace: leaving text file as is");
            return Ok(content.to_string());
        };

        let old = previous.to_string();
        let new = next.to_string();
        let mut updated = String::with_capacity(content.len());
        let mut last = 0;
        let mut replaced = 0;

        for (start, _) in content.match_indices(&old) {
            let end = start + old.len();
            let before = content[..start].chars().next_back();
            let after = content[end..].chars().next();

            if before.is_some_and(extends_before) || after.is_some_and(extends_after) {
                continue;
            }

            updated.push_str(&content[last..start]);
            updated.push_str(&new);
            last = end;
            replaced += 1;
        }

        if replaced == 0 {
            return Err(ChroniclerError::invalid_config(format!(
                "version {old} not found"
            )));
        }

        updated.push_str(&content[last..]);
        debug!("replaced {replaced} occurrences of {old}");

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::version;

    #[test]
    fn replaces_standalone_occurrences() {
        let content = "__version__ = \"1.0.0\"\n# see v1.0.0, not 11.0.0 or 1.0.0-rc.1\n";

        let updated = TextFile
            .update(content, Some(&version("1.0.0")), &version("1.0.1"))
            .unwrap();

        assert_eq!(
            updated,
            "__version__ = \"1.0.1\"\n# see v1.0.1, not 11.0.0 or 1.0.0-rc.1\n"
        );
    }

    #[test]
    fn missing_previous_version_fails() {
        let result = TextFile.update(
            "version: 2.0.0\n",
            Some(&version("1.0.0")),
            &version("1.1.0"),
        );
        assert!(matches!(result, Err(ChroniclerError::InvalidConfig(_))));
    }

    #[test]
    fn first_release_leaves_content_alone() {
        let updated = TextFile
            .update("0.0.0\n", None, &version("0.1.0"))
            .unwrap();
        assert_eq!(updated, "0.0.0\n");
    }
}
