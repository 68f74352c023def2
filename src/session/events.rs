//! Auth-state notifications. The auth client owns a `ListenerRegistry` and emits
//! one event per state change; the session store (or anything else) registers
//! an `AuthStateListener` and receives a `Subscription` back.
//!
//! Dropping the subscription unsubscribes. Keeping it alive across remounts
//! leaks the listener but stays correct: the store ignores repeated sessions.

use super::Session;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl AuthEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        }
    }
}

/// Receives auth-state changes. Deliveries are serialized: an implementation is
/// never invoked concurrently with itself, and must not emit from inside the
/// callback.
pub trait AuthStateListener: Send + Sync {
    fn on_auth_state_changed(&self, event: AuthEvent, session: Option<&Session>);
}

type Listeners = Mutex<Vec<(u64, Arc<dyn AuthStateListener>)>>;

#[derive(Default)]
struct RegistryInner {
    next_id: Mutex<u64>,
    listeners: Listeners,
    delivery: Mutex<()>,
}

#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<RegistryInner>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn AuthStateListener>) -> Subscription {
        let id = {
            let mut next = self
                .inner
                .next_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *next += 1;
            *next
        };

        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));

        trace!(subscription = id, "auth listener subscribed");

        Subscription {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers `event` to every current listener, one delivery at a time.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let _delivery = self
            .inner
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Snapshot so listeners can unsubscribe others without deadlocking.
        let listeners: Vec<Arc<dyn AuthStateListener>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(event = event.as_str(), listeners = listeners.len(), "emit");

        for listener in listeners {
            listener.on_auth_state_changed(event, session);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`].
#[must_use = "dropping a subscription unsubscribes the listener"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
            trace!(subscription = self.id, "auth listener unsubscribed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::fixtures::session;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(AuthEvent, bool)>>,
    }

    impl AuthStateListener for Recorder {
        fn on_auth_state_changed(&self, event: AuthEvent, session: Option<&Session>) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((event, session.is_some()));
        }
    }

    #[test]
    fn emit_reaches_every_listener() {
        let registry = ListenerRegistry::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let _a = registry.subscribe(first.clone());
        let _b = registry.subscribe(second.clone());

        registry.emit(AuthEvent::SignedIn, Some(&session(true)));

        for recorder in [first, second] {
            let events = recorder.events.lock().unwrap_or_else(PoisonError::into_inner);
            assert_eq!(events.as_slice(), &[(AuthEvent::SignedIn, true)]);
        }
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let subscription = registry.subscribe(recorder.clone());
        assert_eq!(registry.len(), 1);

        subscription.unsubscribe();
        assert!(registry.is_empty());

        registry.emit(AuthEvent::SignedOut, None);
        assert!(recorder
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty());
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry = ListenerRegistry::new();
        let subscription = registry.subscribe(Arc::new(Recorder::default()));
        drop(registry);
        drop(subscription);
    }

    #[test]
    fn event_names_match_wire_names() {
        assert_eq!(AuthEvent::SignedIn.as_str(), "SIGNED_IN");
        assert_eq!(AuthEvent::TokenRefreshed.as_str(), "TOKEN_REFRESHED");
    }
}
