use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::http_provider::{HttpProviderConfig, HttpSessionProvider};
use super::local_provider::{LocalProviderConfig, LocalSessionProvider};
use crate::error::SessionError;
use crate::models::ProviderSession;

/// What changed on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Listener invoked on every provider-side session change.
pub type ChangeListener = Arc<dyn Fn(SessionChange, Option<ProviderSession>) + Send + Sync>;

/// A session provider wraps the remote identity provider's capability
/// surface: fetch the current session, subscribe to session changes, and
/// sign out. The core is agnostic to the transport underneath.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> &str;
    /// `Ok(None)` means "no live session" and is a normal result, not an
    /// error. `ProviderUnavailable` is reserved for transport failures.
    async fn fetch_current_session(&self) -> Result<Option<ProviderSession>, SessionError>;
    fn subscribe(&self, listener: ChangeListener) -> ProviderSubscription;
    /// Callers must treat local state as signed-out even when this fails.
    async fn sign_out(&self) -> Result<(), SessionError>;
}

/// Configuration options for each session provider.
#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "http")]
    Http(HttpProviderConfig),
    #[serde(rename = "local")]
    Local(LocalProviderConfig),
}

/// Create a session provider from a given config.
pub fn create_session_provider(config: &ProviderConfig) -> Arc<dyn SessionProvider> {
    match config {
        ProviderConfig::Http(cfg) => Arc::new(HttpSessionProvider::new(cfg)),
        ProviderConfig::Local(cfg) => Arc::new(LocalSessionProvider::new(cfg)),
    }
}

type ListenerSlots = Mutex<Vec<(Uuid, ChangeListener)>>;

/// Listener registry shared by the provider implementations. Emission
/// snapshots the listener list first, so a listener may cancel its own
/// subscription while being invoked.
#[derive(Default)]
pub(crate) struct ChangeHub {
    listeners: Arc<ListenerSlots>,
}

impl ChangeHub {
    pub(crate) fn register(&self, listener: ChangeListener) -> ProviderSubscription {
        let id = Uuid::new_v4();
        self.listeners
            .lock()
            .expect("change listener mutex poisoned")
            .push((id, listener));

        ProviderSubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
            canceled: AtomicBool::new(false),
        }
    }

    pub(crate) fn emit(&self, change: SessionChange, session: Option<ProviderSession>) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .expect("change listener mutex poisoned")
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(change, session.clone());
        }
    }
}

/// Cancelable handle for a provider change subscription. Cancellation is
/// idempotent; dropping the handle cancels it.
pub struct ProviderSubscription {
    id: Uuid,
    listeners: Weak<ListenerSlots>,
    canceled: AtomicBool,
}

impl ProviderSubscription {
    pub fn cancel(&self) {
        if self.canceled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .expect("change listener mutex poisoned")
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
