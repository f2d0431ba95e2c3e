use derive_builder::Builder;
use serde::Deserialize;

/// Pull requests requested per forge query.
pub const DEFAULT_BATCH_SIZE: usize = 25;
/// Forge requests allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Attempts after the first one for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Forge request tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct FetchConfig {
    pub batch_size: usize,
    pub concurrency: usize,
    pub max_retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
