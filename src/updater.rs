//! Rewrites the version recorded in configured version files.
//!
//! Every file is read and updated in memory first. Nothing is written
//! unless all of them succeed.
use log::*;
use semver::Version;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Result, config::VersionFile, error::ChroniclerError};

pub mod text_file;
pub mod toml_file;

use text_file::TextFile;
use toml_file::TomlField;

/// Produces file content carrying the next version.
pub trait VersionUpdater {
    fn update(
        &self,
        content: &str,
        previous: Option<&Version>,
        next: &Version,
    ) -> Result<String>;
}

fn updater_for(file: &VersionFile) -> Box<dyn VersionUpdater> {
    match file.field() {
        Some(field) => Box::new(TomlField::new(field)),
        None => Box::new(TextFile),
    }
}

/// Set every file in `files` under `root` to `next`. Returns the paths
/// written.
pub fn update_version_files(
    root: &Path,
    files: &[VersionFile],
    previous: Option<&Version>,
    next: &Version,
) -> Result<Vec<PathBuf>> {
    let mut updates = vec![];

    for file in files {
        let path = root.join(&file.path);
        debug!("updating {} as {}", path.display(), file.format);

        let content = fs::read_to_string(&path).map_err(|err| {
            ChroniclerError::invalid_config(format!(
                "cannot read version file {}: {err}",
                file.path.display()
            ))
        })?;

        let updated = updater_for(file)
            .update(&content, previous, next)
            .map_err(|err| {
                ChroniclerError::invalid_config(format!(
                    "{}: {err}",
                    file.path.display()
                ))
            })?;

        if updated == content {
            debug!("{} is unchanged", file.path.display());
            continue;
        }

        updates.push((path, updated));
    }

    for (path, content) in updates.iter() {
        fs::write(path, content)?;
        info!("set version in {} to {next}", path.display());
    }

    Ok(updates.into_iter().map(|(path, _)| path).collect())
}
