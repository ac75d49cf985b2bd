//! Owned wiring of the reconciliation core.
//!
//! One explicitly-constructed context object with a defined init/teardown
//! lifecycle, injected into consumers instead of reached through ambient
//! globals.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{create_cache, IdentityCache};
use crate::callback::CallbackReconciler;
use crate::config::ConfigV1;
use crate::error::SessionError;
use crate::events::{EventBroadcaster, EventKind};
use crate::nav::Navigator;
use crate::provider::{create_session_provider, SessionProvider};
use crate::store::SessionStore;

/// Everything an auth-aware surface needs, created once at startup.
pub struct AuthContext {
    pub config: Arc<ConfigV1>,
    pub provider: Arc<dyn SessionProvider>,
    pub cache: Arc<dyn IdentityCache>,
    pub broadcaster: EventBroadcaster,
    pub navigator: Arc<dyn Navigator>,
    pub store: Arc<SessionStore>,
}

impl AuthContext {
    /// Build the full core from config and bring the store up: the cache
    /// seeds an optimistic identity, the change subscription is armed and
    /// the authoritative fetch is issued.
    pub async fn initialize(
        config: ConfigV1,
        navigator: Arc<dyn Navigator>,
    ) -> Result<AuthContext, SessionError> {
        let config = Arc::new(config);
        let provider = create_session_provider(&config.provider);
        let cache = create_cache(&config.cache)?;
        let broadcaster = EventBroadcaster::new();

        info!(
            "Initializing auth context with provider '{}'",
            provider.name()
        );

        let store = SessionStore::new(
            provider.clone(),
            cache.clone(),
            broadcaster.clone(),
            navigator.clone(),
            config.paths.clone(),
            config.reconciler.clone(),
        );
        store.initialize().await;

        Ok(AuthContext {
            config,
            provider,
            cache,
            broadcaster,
            navigator,
            store,
        })
    }

    /// Mount a reconciler for the callback surface, bounded by the
    /// configured timeout. The address is scrubbed first, like on any
    /// auth-aware mount.
    pub fn mount_callback_surface(&self) -> CallbackReconciler {
        if let Some(clean) =
            crate::sanitize::sanitize_if_needed(&self.navigator.current_address(), &self.config.paths)
        {
            self.navigator.replace_address(&clean);
        }

        CallbackReconciler::mount(
            &self.broadcaster,
            self.navigator.clone(),
            self.store.snapshot().phase,
            &self.config.paths.landing_path,
            Duration::from_millis(self.config.reconciler.callback_timeout_ms),
        )
    }

    /// Forward the platform's cross-tab storage signal into the core. The
    /// broadcaster treats it as equivalent to an auth change.
    pub fn notify_storage_change(&self) {
        self.broadcaster
            .publish(EventKind::StorageChange, self.store.snapshot().phase);
    }

    /// Release every subscription the core holds. Idempotent.
    pub fn shutdown(&self) {
        info!("Shutting down auth context");
        self.store.shutdown();
    }
}
