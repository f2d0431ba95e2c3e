//! Custom error types for chronicler with improved type safety and error
//! handling.
//!
//! Errors are split by how the pipeline treats them: resolution and format
//! errors abort the invocation, transient network errors are retried by the
//! forge manager before escalating, and version parse errors are logged by
//! callers that skip the offending tag.

use thiserror::Error;

/// Main error type for chronicler operations.
#[derive(Error, Debug)]
pub enum ChroniclerError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Range / history errors
    #[error("Failed to resolve commit range: {0}")]
    Resolution(String),

    #[error("Invalid git remote URL: {0}")]
    InvalidRemoteUrl(String),

    #[error("Git operation failed: {0}")]
    GitError(#[from] git2::Error),

    // Changelog document errors
    #[error("Unrecognized changelog format at line {line}: {message}")]
    Format { line: usize, message: String },

    // Version errors
    #[error("Tag {tag} is not a valid version: {message}")]
    VersionParse { tag: String, message: String },

    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    // Forge/network errors
    #[error("Forge operation failed: {0}")]
    ForgeError(String),

    #[error("Transient network failure: {0}")]
    TransientNetwork(String),

    #[error("API authentication failed: {0}")]
    AuthenticationError(String),

    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML edit error: {0}")]
    TomlEditError(#[from] toml_edit::TomlError),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ChroniclerError
pub type Result<T> = std::result::Result<T, ChroniclerError>;

impl ChroniclerError {
    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::ForgeError(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a range resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a changelog format error for a 1-based line number
    pub fn format(line: usize, msg: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: msg.into(),
        }
    }

    /// Whether the failure may succeed if the request is sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_) | Self::RateLimitExceeded)
    }
}

/// HTTP status codes worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 502 | 503 | 504)
}

fn from_status(status: u16, msg: String) -> ChroniclerError {
    match status {
        401 => ChroniclerError::AuthenticationError(msg),
        429 => ChroniclerError::RateLimitExceeded,
        s if is_transient_status(s) => ChroniclerError::TransientNetwork(msg),
        _ => ChroniclerError::ForgeError(msg),
    }
}

// Implement From for octocrab errors (GitHub API)
impl From<octocrab::Error> for ChroniclerError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. }
                if source.message.to_lowercase().contains("rate limit") =>
            {
                Self::RateLimitExceeded
            }
            octocrab::Error::GitHub { source, .. } => from_status(
                source.status_code.as_u16(),
                format!("GitHub API error: {}", source.message),
            ),
            octocrab::Error::Hyper { .. } | octocrab::Error::Service { .. } => {
                Self::TransientNetwork(format!("GitHub API error: {}", err))
            }
            _ => Self::ForgeError(format!("GitHub API error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats() {
        let err = ChroniclerError::forge("API call failed");
        assert_eq!(err.to_string(), "Forge operation failed: API call failed");

        let err = ChroniclerError::invalid_config("missing field");
        assert_eq!(err.to_string(), "Invalid configuration: missing field");

        let err = ChroniclerError::format(3, "duplicate version 1.0.0");
        assert_eq!(
            err.to_string(),
            "Unrecognized changelog format at line 3: duplicate version 1.0.0"
        );
    }

    #[test]
    fn test_error_helpers() {
        let err = ChroniclerError::resolution("tag v9.9.9 not found");
        assert!(matches!(err, ChroniclerError::Resolution(_)));

        let err = ChroniclerError::format(1, "bad heading");
        assert!(matches!(err, ChroniclerError::Format { line: 1, .. }));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ChroniclerError::RateLimitExceeded.is_transient());
        assert!(ChroniclerError::TransientNetwork("timeout".into()).is_transient());
        assert!(!ChroniclerError::AuthenticationError("nope".into()).is_transient());
        assert!(!ChroniclerError::forge("404").is_transient());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            from_status(401, "x".into()),
            ChroniclerError::AuthenticationError(_)
        ));
        assert!(matches!(
            from_status(429, "x".into()),
            ChroniclerError::RateLimitExceeded
        ));
        assert!(matches!(
            from_status(503, "x".into()),
            ChroniclerError::TransientNetwork(_)
        ));
        assert!(matches!(
            from_status(422, "x".into()),
            ChroniclerError::ForgeError(_)
        ));
    }

    #[test]
    fn test_from_conversions() {
        let semver_err = semver::Version::parse("invalid");
        assert!(semver_err.is_err());
        let err: ChroniclerError = semver_err.unwrap_err().into();
        assert!(matches!(err, ChroniclerError::InvalidVersion(_)));
    }
}
