mod common;

use std::sync::Arc;
use std::time::Duration;

use authsync::cache::IdentityCache;
use authsync::callback::CallbackPhase;
use authsync::context::AuthContext;
use authsync::events::EventKind;
use authsync::models::AuthPhase;
use authsync::nav::{Navigator, RecordingNavigator};
use authsync::provider::SessionProvider;

use common::{count_events, load_test_config};

async fn build_context() -> (AuthContext, Arc<RecordingNavigator>, std::path::PathBuf) {
    let cache_dir = std::env::temp_dir().join(format!("authsync-ctx-{}", uuid::Uuid::new_v4()));
    let config = load_test_config(&cache_dir);
    let navigator = Arc::new(RecordingNavigator::with_address("/"));

    let context = AuthContext::initialize(config, navigator.clone() as Arc<dyn Navigator>)
        .await
        .expect("context should initialize");

    (context, navigator, cache_dir)
}

/// The context wires provider, cache, broadcaster and store from config
/// and settles on `Anonymous` when no session exists anywhere.
#[tokio::test]
async fn test_context_initializes_from_config() {
    let (context, _navigator, cache_dir) = build_context().await;

    assert_eq!(context.store.snapshot().phase, AuthPhase::Anonymous);
    assert!(context.cache.is_enabled());
    assert_eq!(context.provider.kind(), "local");

    context.shutdown();
    context.shutdown();
    std::fs::remove_dir_all(cache_dir).ok();
}

/// A callback surface mounted through the context fails open at the
/// configured bound.
#[tokio::test(start_paused = true)]
async fn test_context_callback_surface_fails_open() {
    let (context, navigator, cache_dir) = build_context().await;

    let reconciler = context.mount_callback_surface();
    assert_eq!(reconciler.phase(), CallbackPhase::Pending);

    tokio::time::sleep(Duration::from_millis(1600)).await;

    assert_eq!(reconciler.phase(), CallbackPhase::TimedOut);
    assert_eq!(navigator.navigations(), vec!["/dashboard"]);

    context.shutdown();
    std::fs::remove_dir_all(cache_dir).ok();
}

/// Forwarded storage signals reach auth-change subscribers.
#[tokio::test]
async fn test_context_forwards_storage_signals() {
    let (context, _navigator, cache_dir) = build_context().await;

    let (auth_changes, _subscription) = count_events(&context.broadcaster, EventKind::AuthChange);
    context.notify_storage_change();

    assert_eq!(auth_changes.load(std::sync::atomic::Ordering::SeqCst), 1);

    context.shutdown();
    std::fs::remove_dir_all(cache_dir).ok();
}
