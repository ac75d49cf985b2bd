use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AuthPhase;

/// Coarse-grained lifecycle signals carried process-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Login,
    Logout,
    /// Generic "something changed, re-read the store".
    AuthChange,
    /// The platform's cross-tab storage signal. Equivalent to `AuthChange`
    /// for consumers; delivered to its own subscribers first so the store
    /// can react without hearing its own publications.
    StorageChange,
}

/// Payload delivered to handlers. Carries enough for a listener to
/// re-derive its state without querying the store directly.
#[derive(Debug, Clone, Copy)]
pub struct AuthEvent {
    pub kind: EventKind,
    pub phase: AuthPhase,
}

type HandlerFn = dyn Fn(&AuthEvent) -> Result<(), String> + Send + Sync;

struct Registration {
    id: Uuid,
    handler: Arc<HandlerFn>,
}

type Registry = Mutex<HashMap<EventKind, Vec<Registration>>>;

/// A process-wide, multi-producer/multi-consumer channel for auth
/// lifecycle events.
///
/// Delivery is synchronous, in subscription order, fire-and-forget: a
/// handler returning an error is logged and never prevents delivery to the
/// handlers after it. Handlers may subscribe or cancel from within a
/// delivery; the registry is not locked while handlers run.
#[derive(Clone, Default)]
pub struct EventBroadcaster {
    registry: Arc<Registry>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind. The returned subscription
    /// must be retained; dropping it cancels the registration.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> EventSubscription
    where
        F: Fn(&AuthEvent) -> Result<(), String> + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let mut registry = self.registry.lock().expect("event registry mutex poisoned");
        registry.entry(kind).or_default().push(Registration {
            id,
            handler: Arc::new(handler),
        });

        EventSubscription {
            id,
            kind,
            registry: Arc::downgrade(&self.registry),
            canceled: AtomicBool::new(false),
        }
    }

    /// Publish an event to all subscribers of its kind. A `StorageChange`
    /// additionally reaches `AuthChange` subscribers.
    pub fn publish(&self, kind: EventKind, phase: AuthPhase) {
        let event = AuthEvent { kind, phase };
        self.deliver(kind, &event);
        if kind == EventKind::StorageChange {
            self.deliver(EventKind::AuthChange, &event);
        }
    }

    fn deliver(&self, kind: EventKind, event: &AuthEvent) {
        let handlers: Vec<(Uuid, Arc<HandlerFn>)> = {
            let registry = self.registry.lock().expect("event registry mutex poisoned");
            registry
                .get(&kind)
                .map(|registrations| {
                    registrations
                        .iter()
                        .map(|r| (r.id, r.handler.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        debug!(
            "Delivering {:?} (phase {:?}) to {} handler(s)",
            event.kind,
            event.phase,
            handlers.len()
        );

        for (id, handler) in handlers {
            if let Err(e) = handler(event) {
                warn!("Event handler {} for {:?} failed: {}", id, kind, e);
            }
        }
    }
}

/// Cancelable handle for a broadcaster subscription. Canceling twice, or
/// after the broadcaster is gone, is a no-op; dropping the handle cancels
/// it, so duplicate subscribe/release pairs across remounts are safe.
pub struct EventSubscription {
    id: Uuid,
    kind: EventKind,
    registry: Weak<Registry>,
    canceled: AtomicBool,
}

impl EventSubscription {
    pub fn cancel(&self) {
        if self.canceled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().expect("event registry mutex poisoned");
            if let Some(registrations) = registry.get_mut(&self.kind) {
                registrations.retain(|r| r.id != self.id);
            }
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_handler(counter: Arc<AtomicUsize>) -> impl Fn(&AuthEvent) -> Result<(), String> {
        move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Handlers run in subscription order.
    #[test]
    fn test_delivery_in_subscription_order() {
        let broadcaster = EventBroadcaster::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let order = order.clone();
            broadcaster.subscribe(EventKind::AuthChange, move |_| {
                order.lock().unwrap().push("first");
                Ok(())
            })
        };
        let second = {
            let order = order.clone();
            broadcaster.subscribe(EventKind::AuthChange, move |_| {
                order.lock().unwrap().push("second");
                Ok(())
            })
        };

        broadcaster.publish(EventKind::AuthChange, AuthPhase::Anonymous);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);

        first.cancel();
        second.cancel();
    }

    /// A failing handler does not stop delivery to the handlers after it.
    #[test]
    fn test_failing_handler_does_not_block_delivery() {
        let broadcaster = EventBroadcaster::new();
        let reached = Arc::new(AtomicUsize::new(0));

        let _failing = broadcaster.subscribe(EventKind::Logout, |_| {
            Err("handler exploded".to_string())
        });
        let _counting = broadcaster.subscribe(EventKind::Logout, counter_handler(reached.clone()));

        broadcaster.publish(EventKind::Logout, AuthPhase::Anonymous);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    /// Cancel is idempotent and stops further deliveries.
    #[test]
    fn test_cancel_is_idempotent() {
        let broadcaster = EventBroadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));

        let subscription = broadcaster.subscribe(EventKind::Login, counter_handler(count.clone()));
        broadcaster.publish(EventKind::Login, AuthPhase::Authenticated);

        subscription.cancel();
        subscription.cancel();
        broadcaster.publish(EventKind::Login, AuthPhase::Authenticated);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    /// A storage signal reaches both its own subscribers and `AuthChange`
    /// subscribers.
    #[test]
    fn test_storage_signal_counts_as_auth_change() {
        let broadcaster = EventBroadcaster::new();
        let storage_seen = Arc::new(AtomicUsize::new(0));
        let change_seen = Arc::new(AtomicUsize::new(0));

        let _storage = broadcaster.subscribe(
            EventKind::StorageChange,
            counter_handler(storage_seen.clone()),
        );
        let _change =
            broadcaster.subscribe(EventKind::AuthChange, counter_handler(change_seen.clone()));

        broadcaster.publish(EventKind::StorageChange, AuthPhase::Authenticated);

        assert_eq!(storage_seen.load(Ordering::SeqCst), 1);
        assert_eq!(change_seen.load(Ordering::SeqCst), 1);
    }

    /// A handler may cancel its own subscription during delivery without
    /// deadlocking the registry.
    #[test]
    fn test_handler_may_cancel_during_delivery() {
        let broadcaster = EventBroadcaster::new();
        let slot: Arc<Mutex<Option<EventSubscription>>> = Arc::new(Mutex::new(None));

        let subscription = {
            let slot = slot.clone();
            broadcaster.subscribe(EventKind::AuthChange, move |_| {
                if let Some(own) = slot.lock().unwrap().take() {
                    own.cancel();
                }
                Ok(())
            })
        };
        *slot.lock().unwrap() = Some(subscription);

        broadcaster.publish(EventKind::AuthChange, AuthPhase::Anonymous);
        broadcaster.publish(EventKind::AuthChange, AuthPhase::Anonymous);
    }
}
