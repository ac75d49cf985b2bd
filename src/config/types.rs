use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::logging::LoggingConfig;
use crate::provider::ProviderConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0, containing provider, cache, paths, reconciler
/// timings and logging.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    pub logging: LoggingConfig,
}

/// The designated navigation paths consumed by the core. These are
/// configuration, not protocol.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PathsConfig {
    /// Where the callback surface mounts after a redirect-based login.
    pub callback_path: String,
    /// Post-login destination.
    pub landing_path: String,
}

/// Timer bounds for the reconciliation core.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ReconcilerConfig {
    /// How long the callback surface waits for the store before failing
    /// open to the landing path.
    #[serde(default = "default_callback_timeout_ms")]
    pub callback_timeout_ms: u64,
    /// How long the store stays `Initializing` after a failed fetch before
    /// falling back to `Anonymous`.
    #[serde(default = "default_provider_grace_ms")]
    pub provider_grace_ms: u64,
}

fn default_callback_timeout_ms() -> u64 {
    1500
}

fn default_provider_grace_ms() -> u64 {
    5000
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            callback_timeout_ms: default_callback_timeout_ms(),
            provider_grace_ms: default_provider_grace_ms(),
        }
    }
}

/// Load config from a YAML file named "authsync.yaml" in the current
/// directory, with AUTHSYNC_-prefixed environment overrides.
pub fn load_config() -> Result<ConfigV1, figment::Error> {
    let figment = Figment::new()
        .merge(Yaml::file("./authsync.yaml"))
        .merge(Env::prefixed("AUTHSYNC_").split("__"));
    let config = figment.extract::<Config>()?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
