#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use authsync::cache::{create_cache, IdentityCache};
use authsync::config::{Config, ConfigV1};
use authsync::events::{EventBroadcaster, EventKind, EventSubscription};
use authsync::models::{Identity, IdentityMetadata, ProviderSession, SessionHandle};
use authsync::nav::{Navigator, RecordingNavigator};
use authsync::provider::local_provider::{LocalProviderConfig, LocalSessionProvider};
use authsync::provider::SessionProvider;
use authsync::store::SessionStore;
use figment::{
    providers::{Format, Yaml},
    Figment,
};

const TEST_CONFIG_TEMPLATE: &str = r#"
version: "1.0.0"
provider:
  type: "local"
  name: "local test provider"
cache:
  enabled: true
  type: "file"
  dir: "__CACHE_DIR__"
  namespace: "authsync-test"
paths:
  callback_path: "/auth/callback"
  landing_path: "/dashboard"
reconciler:
  callback_timeout_ms: 1500
  provider_grace_ms: 5000
logging:
  level: "debug"
  format: "console"
"#;

pub fn load_test_config(cache_dir: &Path) -> ConfigV1 {
    let yaml = TEST_CONFIG_TEMPLATE.replace("__CACHE_DIR__", &cache_dir.to_string_lossy());
    let config: Config = Figment::new()
        .merge(Yaml::string(&yaml))
        .extract()
        .expect("failed to parse test config YAML");

    match config {
        Config::ConfigV1(config) => config,
    }
}

/// The full core wired against the local provider, a file cache under a
/// unique temp directory, and a recording navigator. The store is built
/// but not initialized; tests choose when.
pub struct TestHarness {
    pub config: ConfigV1,
    pub provider: Arc<LocalSessionProvider>,
    pub cache: Arc<dyn IdentityCache>,
    pub broadcaster: EventBroadcaster,
    pub navigator: Arc<RecordingNavigator>,
    pub store: Arc<SessionStore>,
    pub cache_dir: PathBuf,
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.cache_dir).ok();
    }
}

pub fn build_harness() -> TestHarness {
    let cache_dir = std::env::temp_dir().join(format!("authsync-test-{}", uuid::Uuid::new_v4()));
    let config = load_test_config(&cache_dir);

    let provider = Arc::new(LocalSessionProvider::new(&LocalProviderConfig {
        name: "local test provider".to_string(),
    }));
    let cache = create_cache(&config.cache).expect("failed to create test cache");
    let broadcaster = EventBroadcaster::new();
    let navigator = Arc::new(RecordingNavigator::with_address("/"));

    let store = SessionStore::new(
        provider.clone() as Arc<dyn SessionProvider>,
        cache.clone(),
        broadcaster.clone(),
        navigator.clone() as Arc<dyn Navigator>,
        config.paths.clone(),
        config.reconciler.clone(),
    );

    TestHarness {
        config,
        provider,
        cache,
        broadcaster,
        navigator,
        store,
        cache_dir,
    }
}

pub fn test_identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: Some(format!("{}@example.org", id)),
        metadata: Some(IdentityMetadata {
            display_name: Some("Test User".to_string()),
            avatar_url: None,
            full_name: None,
        }),
    }
}

pub fn test_session(id: &str, handle: &str) -> ProviderSession {
    ProviderSession {
        handle: SessionHandle::new(handle),
        identity: test_identity(id),
    }
}

/// Count deliveries of one event kind. The subscription must be kept
/// alive alongside the counter.
pub fn count_events(
    broadcaster: &EventBroadcaster,
    kind: EventKind,
) -> (Arc<AtomicUsize>, EventSubscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_in_handler = count.clone();
    let subscription = broadcaster.subscribe(kind, move |_event| {
        count_in_handler.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (count, subscription)
}
