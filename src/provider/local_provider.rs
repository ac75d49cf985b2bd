use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::models::ProviderSession;
use crate::provider::base::{
    ChangeHub, ChangeListener, ProviderSubscription, SessionChange, SessionProvider,
};

/// The config needed for the local in-process provider.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct LocalProviderConfig {
    /// A friendly name for logs.
    pub name: String,
}

/// A provider that holds its session in memory. Used by tests and by
/// embedders that resolve sessions through a channel of their own; drivers
/// call `push_session`/`clear_session` to emulate provider-side changes,
/// and the `fail_*` switches to emulate faults.
pub struct LocalSessionProvider {
    config: LocalProviderConfig,
    session: Mutex<Option<ProviderSession>>,
    hub: ChangeHub,
    fail_fetch: AtomicBool,
    fail_sign_out: AtomicBool,
}

impl LocalSessionProvider {
    pub fn new(config: &LocalProviderConfig) -> Self {
        info!("Creating local session provider '{}'", config.name);
        Self {
            config: config.clone(),
            session: Mutex::new(None),
            hub: ChangeHub::default(),
            fail_fetch: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    /// Install a session and notify subscribers, as after a completed
    /// login or a token refresh.
    pub fn push_session(&self, session: ProviderSession, change: SessionChange) {
        debug!("Local provider session change: {:?}", change);
        *self
            .session
            .lock()
            .expect("local session mutex poisoned") = Some(session.clone());
        self.hub.emit(change, Some(session));
    }

    /// Install a session without notifying subscribers, as when the
    /// session was established by another execution context.
    pub fn seed_session(&self, session: ProviderSession) {
        *self
            .session
            .lock()
            .expect("local session mutex poisoned") = Some(session);
    }

    /// Drop the session and notify subscribers, as after a provider-side
    /// session loss.
    pub fn clear_session(&self) {
        *self
            .session
            .lock()
            .expect("local session mutex poisoned") = None;
        self.hub.emit(SessionChange::SignedOut, None);
    }

    /// Make the next fetch fail with `ProviderUnavailable`.
    pub fn fail_next_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    /// Make sign-out requests fail with `SignOutFailed`.
    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SessionProvider for LocalSessionProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "local"
    }

    async fn fetch_current_session(&self) -> Result<Option<ProviderSession>, SessionError> {
        if self.fail_fetch.swap(false, Ordering::SeqCst) {
            return Err(SessionError::ProviderUnavailable(
                "injected fetch failure".to_string(),
            ));
        }
        Ok(self
            .session
            .lock()
            .expect("local session mutex poisoned")
            .clone())
    }

    fn subscribe(&self, listener: ChangeListener) -> ProviderSubscription {
        self.hub.register(listener)
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        let failed = self.fail_sign_out.load(Ordering::SeqCst);
        *self
            .session
            .lock()
            .expect("local session mutex poisoned") = None;
        self.hub.emit(SessionChange::SignedOut, None);

        if failed {
            Err(SessionError::SignOutFailed(
                "injected sign-out failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
