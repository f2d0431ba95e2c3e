//! Configuration for the remote forge connection.
use git_url_parse::{GitUrl, Scheme};
use log::*;
use secrecy::SecretString;
use std::{env, process::Command};

use crate::{Result, error::ChroniclerError};

/// Host whose REST and GraphQL APIs live on a dedicated `api.` subdomain.
pub const GITHUB_HOST: &str = "github.com";
/// Environment variable consulted for the forge token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Remote repository connection configuration for authenticating and
/// interacting with the forge.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote forge host (e.g., "github.com").
    pub host: String,
    /// Remote forge port for self-hosted instances.
    pub port: Option<u16>,
    /// URL scheme used for web links and API calls.
    pub scheme: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Access token for authentication.
    pub token: SecretString,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: GITHUB_HOST.to_string(),
            port: None,
            scheme: "https".to_string(),
            owner: "".to_string(),
            repo: "".to_string(),
            token: SecretString::from("".to_string()),
        }
    }
}

impl RemoteConfig {
    /// Parse a git remote URL. SSH and HTTPS forms of the same repository
    /// yield the same host, owner and repository. The token is left empty.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = GitUrl::parse(url.trim()).map_err(|err| {
            ChroniclerError::InvalidRemoteUrl(format!("{url}: {err}"))
        })?;

        let host = parsed.host.clone().ok_or_else(|| {
            ChroniclerError::InvalidRemoteUrl(format!("{url}: missing host"))
        })?;

        let owner = parsed.owner.clone().filter(|o| !o.is_empty()).ok_or_else(
            || ChroniclerError::InvalidRemoteUrl(format!("{url}: missing owner")),
        )?;

        if parsed.name.is_empty() {
            return Err(ChroniclerError::InvalidRemoteUrl(format!(
                "{url}: missing repository name"
            )));
        }

        // ssh and git transports still talk to the API over https
        let scheme = match parsed.scheme {
            Scheme::Http => "http",
            _ => "https",
        };

        let port = match parsed.scheme {
            Scheme::Http | Scheme::Https => parsed.port,
            _ => None,
        };

        Ok(Self {
            host,
            port,
            scheme: scheme.into(),
            owner,
            repo: parsed.name,
            token: SecretString::from("".to_string()),
        })
    }

    /// Web URL of the forge host, e.g. `https://github.com`.
    pub fn web_base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.host),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Web URL of the repository.
    pub fn repo_url(&self) -> String {
        format!("{}/{}/{}", self.web_base_url(), self.owner, self.repo)
    }

    /// Profile link for a forge user.
    pub fn user_url(&self, login: &str) -> String {
        format!("{}/{login}", self.web_base_url())
    }

    /// REST API base. GitHub Enterprise serves it under `/api/v3`.
    pub fn api_base_url(&self) -> String {
        if self.host == GITHUB_HOST {
            format!("{}://api.{}", self.scheme, self.host)
        } else {
            format!("{}/api/v3", self.web_base_url())
        }
    }

    /// `owner/repo` slug.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Resolve the forge token from the command line, the environment or the
/// GitHub CLI, in that order.
pub fn resolve_token(flag: Option<&str>) -> Result<SecretString> {
    if let Some(token) = flag.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token.to_string()));
    }

    if let Ok(token) = env::var(TOKEN_ENV_VAR)
        && !token.trim().is_empty()
    {
        return Ok(SecretString::from(token.trim().to_string()));
    }

    debug!("{TOKEN_ENV_VAR} not set: asking the gh cli for a token");

    match Command::new("gh").args(["auth", "token"]).output() {
        Ok(output) if output.status.success() => {
            let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !token.is_empty() {
                return Ok(SecretString::from(token));
            }
        }
        Ok(output) => {
            debug!(
                "gh auth token failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Err(err) => debug!("gh cli unavailable: {err}"),
    }

    Err(ChroniclerError::AuthenticationError(format!(
        "no token found: pass --github-token, set {TOKEN_ENV_VAR}, or log in with `gh auth login`"
    )))
}
