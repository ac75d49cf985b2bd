use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheRecord, IdentityCache};
use crate::config::{PathsConfig, ReconcilerConfig};
use crate::error::SessionError;
use crate::events::{EventBroadcaster, EventKind, EventSubscription};
use crate::models::{AuthPhase, Identity, ProviderSession};
use crate::nav::Navigator;
use crate::provider::{ProviderSubscription, SessionChange, SessionProvider};
use crate::sanitize::sanitize_if_needed;

/// A consistent point-in-time view of the store. Taken under one lock, so
/// phase and identity can never be observed out of sync.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: AuthPhase,
    pub identity: Option<Identity>,
    pub session: Option<ProviderSession>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.phase.is_authenticated()
    }

    /// Whether a user is signed in on this device.
    pub fn is_logged_in(&self) -> bool {
        self.phase.is_authenticated() && self.identity.is_some()
    }

    /// Safe public identifier for the current user; never sensitive data.
    pub fn public_user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }
}

struct StoreState {
    phase: AuthPhase,
    identity: Option<Identity>,
    session: Option<ProviderSession>,
}

#[derive(Default)]
struct StoreSubscriptions {
    provider: Option<ProviderSubscription>,
    storage: Option<EventSubscription>,
}

/// What a reducer application did to the state.
enum Transition {
    None,
    SignIn(Identity),
    Refresh(Identity),
    SignOut,
}

/// The single in-process source of truth for authentication state.
///
/// The initial fetch and the provider's change notifications race by
/// construction; both feed `apply_session`, one serialized idempotent
/// reducer, and are applied in arrival order. The persisted cache is read
/// once at startup as a rendering hint and never overrides an
/// authoritative answer.
pub struct SessionStore {
    state: Mutex<StoreState>,
    provider: Arc<dyn SessionProvider>,
    cache: Arc<dyn IdentityCache>,
    broadcaster: EventBroadcaster,
    navigator: Arc<dyn Navigator>,
    paths: PathsConfig,
    reconciler: ReconcilerConfig,
    subscriptions: Mutex<StoreSubscriptions>,
}

impl SessionStore {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        cache: Arc<dyn IdentityCache>,
        broadcaster: EventBroadcaster,
        navigator: Arc<dyn Navigator>,
        paths: PathsConfig,
        reconciler: ReconcilerConfig,
    ) -> Arc<Self> {
        Arc::new(SessionStore {
            state: Mutex::new(StoreState {
                phase: AuthPhase::Initializing,
                identity: None,
                session: None,
            }),
            provider,
            cache,
            broadcaster,
            navigator,
            paths,
            reconciler,
            subscriptions: Mutex::new(StoreSubscriptions::default()),
        })
    }

    /// Bring the store up: scrub the address, seed a provisional identity
    /// from the cache, arm the change subscription, then ask the provider
    /// for the authoritative session. The subscription is armed before the
    /// fetch is issued, so the two delivery paths may race; the reducer
    /// absorbs either order.
    pub async fn initialize(self: &Arc<Self>) {
        self.sanitize_address();
        self.seed_from_cache();

        let for_changes: Weak<SessionStore> = Arc::downgrade(self);
        let provider_subscription = self.provider.subscribe(Arc::new(move |change, session| {
            if let Some(store) = for_changes.upgrade() {
                store.on_provider_change(change, session);
            }
        }));

        let for_storage: Weak<SessionStore> = Arc::downgrade(self);
        let storage_subscription =
            self.broadcaster
                .subscribe(EventKind::StorageChange, move |_event| {
                    if let Some(store) = for_storage.upgrade() {
                        store.handle_storage_signal();
                    }
                    Ok(())
                });

        {
            let mut subscriptions = self.lock_subscriptions();
            subscriptions.provider = Some(provider_subscription);
            subscriptions.storage = Some(storage_subscription);
        }

        match self.provider.fetch_current_session().await {
            Ok(session) => self.apply_session(session),
            Err(e) => {
                warn!("Initial session fetch failed: {}", e);
                self.arm_grace_timer();
            }
        }
    }

    /// The single reducer fed by both delivery paths. Idempotent:
    /// re-delivering the current session, or a redundant "no session",
    /// changes nothing and publishes nothing.
    pub fn apply_session(&self, session: Option<ProviderSession>) {
        let (transition, phase) = {
            let mut state = self.lock_state();
            match session {
                Some(new_session) => {
                    let redundant = state.phase == AuthPhase::Authenticated
                        && state
                            .session
                            .as_ref()
                            .map(|current| current.handle == new_session.handle)
                            .unwrap_or(false);
                    if redundant {
                        (Transition::None, state.phase)
                    } else {
                        let was_authenticated = state.phase == AuthPhase::Authenticated;
                        let identity = new_session.identity.clone();
                        state.identity = Some(identity.clone());
                        state.session = Some(new_session);
                        state.phase = AuthPhase::Authenticated;
                        if was_authenticated {
                            (Transition::Refresh(identity), state.phase)
                        } else {
                            (Transition::SignIn(identity), state.phase)
                        }
                    }
                }
                None => match state.phase {
                    AuthPhase::Anonymous => (Transition::None, state.phase),
                    // The sign-out sequence owns this clear; a provider
                    // echo arriving mid-flight must not publish early.
                    AuthPhase::SigningOut => (Transition::None, state.phase),
                    _ => {
                        state.identity = None;
                        state.session = None;
                        state.phase = AuthPhase::Anonymous;
                        (Transition::SignOut, state.phase)
                    }
                },
            }
        };

        match transition {
            Transition::None => {
                debug!("Redundant session delivery, nothing to apply");
            }
            Transition::SignIn(identity) => {
                info!("Session established for user '{}'", identity.id);
                self.mirror_to_cache(Some(identity));
                self.sanitize_address();
                self.broadcaster.publish(EventKind::Login, phase);
                self.broadcaster.publish(EventKind::AuthChange, phase);
            }
            Transition::Refresh(identity) => {
                debug!("Session refreshed for user '{}'", identity.id);
                self.mirror_to_cache(Some(identity));
                self.sanitize_address();
                self.broadcaster.publish(EventKind::AuthChange, phase);
            }
            Transition::SignOut => {
                info!("Session ended, store is anonymous");
                self.mirror_to_cache(None);
                self.sanitize_address();
                self.broadcaster.publish(EventKind::AuthChange, phase);
            }
        }
    }

    /// Sign out everywhere this device can reach, then clear local state
    /// no matter what the provider answered. Steps run in order and none
    /// is skipped on failure.
    pub async fn sign_out(&self) {
        {
            let mut state = self.lock_state();
            state.phase = AuthPhase::SigningOut;
        }

        if let Err(e) = self.provider.sign_out().await {
            warn!("Remote sign-out failed, clearing local state anyway: {}", e);
        }

        let phase = {
            let mut state = self.lock_state();
            state.identity = None;
            state.session = None;
            state.phase = AuthPhase::Anonymous;
            state.phase
        };

        if let Err(e) = self.cache.clear() {
            warn!("Cache clear failed during sign-out: {}", e);
        }
        if let Err(e) = self.cache.clear_contacts() {
            warn!("Contact cleanup failed during sign-out: {}", e);
        }

        self.sanitize_address();
        self.broadcaster.publish(EventKind::Logout, phase);
        self.broadcaster.publish(EventKind::AuthChange, phase);
        info!("Signed out on this device");
    }

    /// A cross-tab storage signal means another execution context changed
    /// the persisted record. Re-read it and reconcile.
    pub fn handle_storage_signal(self: &Arc<Self>) {
        let record = match self.cache.read() {
            Ok(record) => record,
            Err(SessionError::CacheCorrupt(e)) => {
                warn!("Ignoring corrupt cache record on storage signal: {}", e);
                None
            }
            Err(e) => {
                warn!("Cache read failed on storage signal: {}", e);
                return;
            }
        };

        let phase = self.lock_state().phase;
        match (record, phase) {
            (None, AuthPhase::Authenticated) => {
                info!("Another context signed out, dropping the local session");
                self.apply_session(None);
            }
            (Some(_), AuthPhase::Anonymous) => {
                // Another context signed in. The record is only a hint;
                // ask the provider for the authoritative session.
                let store = Arc::clone(self);
                tokio::spawn(async move {
                    match store.provider.fetch_current_session().await {
                        Ok(session) => store.apply_session(session),
                        Err(e) => warn!("Refetch after storage signal failed: {}", e),
                    }
                });
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            phase: state.phase,
            identity: state.identity.clone(),
            session: state.session.clone(),
        }
    }

    /// Release the provider and broadcaster subscriptions. Idempotent.
    pub fn shutdown(&self) {
        let mut subscriptions = self.lock_subscriptions();
        if let Some(subscription) = subscriptions.provider.take() {
            subscription.cancel();
        }
        if let Some(subscription) = subscriptions.storage.take() {
            subscription.cancel();
        }
    }

    fn on_provider_change(
        self: &Arc<Self>,
        change: SessionChange,
        session: Option<ProviderSession>,
    ) {
        debug!("Provider session change: {:?}", change);
        self.sanitize_address();
        match change {
            SessionChange::SignedOut => self.apply_session(None),
            SessionChange::SignedIn | SessionChange::TokenRefreshed => self.apply_session(session),
        }
    }

    /// One optimistic cache read at startup. A present record populates a
    /// provisional identity so surfaces can render without flicker; the
    /// phase stays `Initializing` until an authoritative answer lands.
    fn seed_from_cache(&self) {
        match self.cache.read() {
            Ok(Some(record)) => {
                debug!(
                    "Seeding provisional identity from cache for user '{}'",
                    record.identity.id
                );
                let mut state = self.lock_state();
                if state.phase == AuthPhase::Initializing && state.identity.is_none() {
                    state.identity = Some(record.identity);
                }
            }
            Ok(None) => {}
            Err(SessionError::CacheCorrupt(e)) => {
                warn!("Ignoring corrupt cache record at startup: {}", e);
            }
            Err(e) => {
                warn!("Cache read failed at startup: {}", e);
            }
        }
    }

    /// After a failed fetch the store stays `Initializing` only briefly,
    /// then falls back to `Anonymous` unless an authoritative answer
    /// arrived meanwhile.
    fn arm_grace_timer(self: &Arc<Self>) {
        let grace = Duration::from_millis(self.reconciler.provider_grace_ms);
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(store) = store.upgrade() {
                let still_initializing = store.lock_state().phase == AuthPhase::Initializing;
                if still_initializing {
                    warn!("No session answer within the grace period, falling back to anonymous");
                    store.apply_session(None);
                }
            }
        });
    }

    fn mirror_to_cache(&self, identity: Option<Identity>) {
        let result = match identity {
            Some(identity) => self.cache.write(&CacheRecord::new(identity)),
            None => self.cache.clear(),
        };
        if let Err(e) = result {
            warn!("Cache update failed: {}", e);
        }
    }

    fn sanitize_address(&self) {
        if let Some(clean) = sanitize_if_needed(&self.navigator.current_address(), &self.paths) {
            info!("Scrubbed sensitive tokens from the visible address");
            self.navigator.replace_address(&clean);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("session state mutex poisoned")
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, StoreSubscriptions> {
        self.subscriptions
            .lock()
            .expect("subscription mutex poisoned")
    }
}
