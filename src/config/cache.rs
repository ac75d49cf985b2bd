use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::file_cache::FileCacheConfig;

/// A wrapper for the cache configuration:
/// - enabled: if false, the cache is effectively disabled (NoCache).
/// - backend: the actual cache backend (file, etc.).
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<CacheBackend>,
}

/// The existing cache backends. We differentiate them via a "type" tag in
/// the YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
#[serde(tag = "type")]
pub enum CacheBackend {
    #[serde(rename = "file")]
    File(FileCacheConfig),
    // Add more variants here as needed, like:
    // #[serde(rename = "keyring")]
    // Keyring(KeyringCacheConfig),
}
