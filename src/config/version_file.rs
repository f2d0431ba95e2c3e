//! Files whose version string `release` rewrites.
use serde::Deserialize;
use std::path::PathBuf;
use strum::Display;

/// How a version file stores its version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VersionFileFormat {
    /// Every occurrence of the previous version is replaced.
    #[default]
    Text,
    /// A string field of a TOML document, `project.version` unless `field`
    /// says otherwise.
    Toml,
    /// A Cargo manifest, `package.version` unless `field` says otherwise.
    Cargo,
}

/// A version file entry. Written either as a bare path, which is treated
/// as text, or as a table with `path`, `format` and `field`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawVersionFile")]
pub struct VersionFile {
    /// Path relative to the repository root.
    pub path: PathBuf,
    pub format: VersionFileFormat,
    /// Dotted key of the version field for `toml` and `cargo` files.
    pub field: Option<String>,
}

impl VersionFile {
    pub fn text(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: VersionFileFormat::Text,
            field: None,
        }
    }

    /// Dotted key the version lives under. `None` for text files.
    pub fn field(&self) -> Option<&str> {
        match self.format {
            VersionFileFormat::Text => None,
            VersionFileFormat::Toml => {
                Some(self.field.as_deref().unwrap_or("project.version"))
            }
            VersionFileFormat::Cargo => {
                Some(self.field.as_deref().unwrap_or("package.version"))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVersionFile {
    Path(PathBuf),
    Table {
        path: PathBuf,
        #[serde(default)]
        format: VersionFileFormat,
        #[serde(default)]
        field: Option<String>,
    },
}

impl From<RawVersionFile> for VersionFile {
    fn from(raw: RawVersionFile) -> Self {
        match raw {
            RawVersionFile::Path(path) => VersionFile::text(path),
            RawVersionFile::Table {
                path,
                format,
                field,
            } => VersionFile {
                path,
                format,
                field,
            },
        }
    }
}
