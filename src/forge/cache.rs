//! On-disk response cache for forge queries.
//!
//! Each response is stored as one JSON file named after the md5
//! fingerprint of the request. Entries never expire: merged pull request
//! metadata does not change once fetched.
use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::Result;

/// Cache directory relative to the repository root.
pub const DEFAULT_CACHE_DIR: &str = ".cache/chronicler";
/// Setting this to anything other than empty, `0` or `false` disables the
/// cache.
pub const NO_CACHE_ENV_VAR: &str = "CHRONICLER_NO_CACHE";

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse<T> {
    stored_at: DateTime<Utc>,
    payload: T,
}

/// Read-through response cache handle.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: Option<PathBuf>,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A cache that never hits and never writes.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Cache under the repository root unless disabled by flag or
    /// environment.
    pub fn for_repo(repo_root: &Path, no_cache: bool) -> Self {
        if no_cache || disabled_by_env() {
            info!("response cache disabled");
            return Self::disabled();
        }
        Self::new(repo_root.join(DEFAULT_CACHE_DIR))
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Stable key for a request.
    pub fn fingerprint(
        endpoint: &str,
        query: &str,
        variables: &serde_json::Value,
    ) -> String {
        let raw = format!("{endpoint}\n{query}\n{variables}");
        format!("{:x}", md5::compute(raw.as_bytes()))
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{key}.json")))
    }

    /// Cached payload for `key`. Unreadable entries count as misses.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key)?;
        let content = std::fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<CachedResponse<T>>(&content) {
            Ok(cached) => {
                debug!("cache hit: {key} (stored {})", cached.stored_at);
                Some(cached.payload)
            }
            Err(err) => {
                warn!("ignoring corrupt cache entry {}: {err}", path.display());
                None
            }
        }
    }

    /// Store a successful response.
    pub fn put<T: Serialize>(&self, key: &str, payload: &T) -> Result<()> {
        let Some(path) = self.path_for(key) else {
            return Ok(());
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let cached = CachedResponse {
            stored_at: Utc::now(),
            payload,
        };

        std::fs::write(&path, serde_json::to_string(&cached)?)?;
        debug!("cached response {key}");

        Ok(())
    }
}

fn disabled_by_env() -> bool {
    match env::var(NO_CACHE_ENV_VAR) {
        Ok(value) => {
            let value = value.trim().to_lowercase();
            !(value.is_empty() || value == "0" || value == "false")
        }
        Err(_) => false,
    }
}
