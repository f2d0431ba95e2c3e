use log::*;
use semver::Version;
use toml_edit::{DocumentMut, value};

use crate::{Result, error::ChroniclerError, updater::VersionUpdater};

/// A TOML document with the version in the string at a dotted key, such as
/// `package.version` in `Cargo.toml` or `project.version` in
/// `pyproject.toml`.
pub struct TomlField {
    field: String,
}

impl TomlField {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl VersionUpdater for TomlField {
    fn update(
        &self,
        content: &str,
        _previous: Option<&Version>,
        next: &Version,
    ) -> Result<String> {
        let mut doc = content.parse::<DocumentMut>()?;

        let mut item = doc.as_item_mut();
        for key in self.field.split('.') {
            let Some(child) = item.get_mut(key) else {
                return Err(ChroniclerError::invalid_config(format!(
                    "no {} field",
                    self.field
                )));
            };
            item = child;
        }

        if !item.is_str() {
            return Err(ChroniclerError::invalid_config(format!(
                "{} is not a string",
                self.field
            )));
        }

        debug!("setting {} to {next}", self.field);

        // keeps trailing comments on the line
        let decor = item.as_value().map(|v| v.decor().clone());
        *item = value(next.to_string());
        if let (Some(decor), Some(updated)) = (decor, item.as_value_mut()) {
            *updated.decor_mut() = decor;
        }

        Ok(doc.to_string())
    }
}
