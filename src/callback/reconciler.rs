use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{EventBroadcaster, EventKind, EventSubscription};
use crate::models::AuthPhase;
use crate::nav::Navigator;

/// Where the callback surface is in its short life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPhase {
    Pending,
    Completed,
    TimedOut,
}

struct ReconcilerState {
    phase: Mutex<CallbackPhase>,
    navigated: AtomicBool,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ReconcilerState {
    /// Move from `Pending` to a terminal phase, cancel the timer, and
    /// navigate to the landing path exactly once. Later calls are no-ops.
    fn finish(&self, terminal: CallbackPhase) {
        {
            let mut phase = self.phase.lock().expect("callback phase mutex poisoned");
            if *phase != CallbackPhase::Pending {
                return;
            }
            *phase = terminal;
        }

        if let Some(timer) = self
            .timer
            .lock()
            .expect("callback timer mutex poisoned")
            .take()
        {
            timer.abort();
        }

        if !self.navigated.swap(true, Ordering::SeqCst) {
            debug!("Callback surface finished as {:?}", terminal);
            self.navigator.navigate_to(&self.landing_path);
        }
    }
}

/// Bridges the moment a redirect-based login completes and the moment the
/// session store reflects it, then hands control back to normal
/// navigation.
///
/// The reconciler never parses provider tokens itself; the store's own
/// provider subscription picks up the completed session, and the
/// reconciler only watches the resulting events. Fail-open: if the store
/// has not resolved by the deadline, it navigates to the landing path
/// anyway and lets reconciliation finish in the background.
pub struct CallbackReconciler {
    state: Arc<ReconcilerState>,
    subscriptions: Mutex<Vec<EventSubscription>>,
}

impl CallbackReconciler {
    /// Mount on entry to the callback surface. `initial_phase` is the
    /// store's phase at mount time; an already-authenticated store
    /// completes immediately without arming the timer.
    pub fn mount(
        broadcaster: &EventBroadcaster,
        navigator: Arc<dyn Navigator>,
        initial_phase: AuthPhase,
        landing_path: &str,
        timeout: Duration,
    ) -> Self {
        let state = Arc::new(ReconcilerState {
            phase: Mutex::new(CallbackPhase::Pending),
            navigated: AtomicBool::new(false),
            navigator,
            landing_path: landing_path.to_string(),
            timer: Mutex::new(None),
        });

        let reconciler = CallbackReconciler {
            state: state.clone(),
            subscriptions: Mutex::new(Vec::new()),
        };

        if initial_phase.is_authenticated() {
            state.finish(CallbackPhase::Completed);
            return reconciler;
        }

        for kind in [EventKind::Login, EventKind::AuthChange] {
            let on_event = state.clone();
            let subscription = broadcaster.subscribe(kind, move |event| {
                if event.phase.is_authenticated() {
                    on_event.finish(CallbackPhase::Completed);
                }
                Ok(())
            });
            reconciler
                .subscriptions
                .lock()
                .expect("callback subscription mutex poisoned")
                .push(subscription);
        }

        let on_timeout = state.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            info!("Callback surface timed out waiting for the session store, failing open");
            on_timeout.finish(CallbackPhase::TimedOut);
        });
        *state.timer.lock().expect("callback timer mutex poisoned") = Some(timer);

        reconciler
    }

    pub fn phase(&self) -> CallbackPhase {
        *self
            .state
            .phase
            .lock()
            .expect("callback phase mutex poisoned")
    }

    /// Cancel the timer and release the event subscriptions, so no stray
    /// navigation can fire after the surface is gone. Idempotent.
    pub fn unmount(&self) {
        if let Some(timer) = self
            .state
            .timer
            .lock()
            .expect("callback timer mutex poisoned")
            .take()
        {
            timer.abort();
        }

        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("callback subscription mutex poisoned");
        for subscription in subscriptions.drain(..) {
            subscription.cancel();
        }
    }
}

impl Drop for CallbackReconciler {
    fn drop(&mut self) {
        self.unmount();
    }
}
