use super::{AuthEvent, AuthStateListener, Identity, Session};
use crate::auth::{AuthApi, AuthClient};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Snapshot of the store. `loading` stays true until the first resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreState {
    pub loading: bool,
    pub session: Option<Session>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            loading: true,
            session: None,
        }
    }
}

impl StoreState {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|session| &session.identity)
    }
}

/// Single source of truth for "who is logged in".
///
/// Written only by [`SessionStore::initialize`] and the listener callback;
/// everything else reads snapshots or subscribes to changes.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<StoreState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Change feed for views; a receiver only wakes when the state really changed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Loads the persisted session. Loading ends whatever the outcome; a failed
    /// lookup keeps whatever session the store already had.
    #[instrument(skip_all)]
    pub async fn initialize<A: AuthApi>(&self, client: &AuthClient<A>) {
        match client.get_session().await {
            Ok(session) => {
                self.apply(session);
            }
            Err(err) => {
                warn!("Failed to load the initial session: {err}");
                self.state.send_if_modified(|state| {
                    let changed = state.loading;
                    state.loading = false;
                    changed
                });
            }
        }
    }

    /// Waits for the first resolution and returns the resolved snapshot.
    pub async fn resolved(&self) -> StoreState {
        let mut receiver = self.subscribe();
        let resolved = receiver.wait_for(|state| !state.loading).await;
        match resolved {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot be closed here.
            Err(_) => self.snapshot(),
        }
    }

    /// Replaces the state atomically. Returns false when nothing changed.
    fn apply(&self, session: Option<Session>) -> bool {
        self.state.send_if_modified(|state| {
            if !state.loading && state.session == session {
                return false;
            }
            *state = StoreState {
                loading: false,
                session,
            };
            true
        })
    }
}

impl AuthStateListener for SessionStore {
    fn on_auth_state_changed(&self, event: AuthEvent, session: Option<&Session>) {
        let changed = self.apply(session.cloned());
        debug!(event = event.as_str(), changed, "auth state changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::fixtures::session;

    #[test]
    fn starts_loading_without_session() {
        let store = SessionStore::new();
        let state = store.snapshot();
        assert!(state.loading);
        assert!(state.session.is_none());
    }

    #[test]
    fn signed_in_event_sets_session_and_ends_loading() {
        let store = SessionStore::new();
        store.on_auth_state_changed(AuthEvent::SignedIn, Some(&session(true)));

        let state = store.snapshot();
        assert!(!state.loading);
        assert_eq!(state.session, Some(session(true)));
        assert_eq!(
            state.identity().map(|identity| identity.email.as_str()),
            Some("ana@example.com")
        );
    }

    #[test]
    fn applying_the_same_session_twice_is_a_noop() {
        let store = SessionStore::new();
        let mut receiver = store.subscribe();

        store.on_auth_state_changed(AuthEvent::SignedIn, Some(&session(true)));
        assert!(receiver.has_changed().unwrap_or(false));
        let _ = receiver.borrow_and_update();
        let before = store.snapshot();

        store.on_auth_state_changed(AuthEvent::SignedIn, Some(&session(true)));
        assert!(!receiver.has_changed().unwrap_or(true));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn signed_out_clears_session() {
        let store = SessionStore::new();
        store.on_auth_state_changed(AuthEvent::SignedIn, Some(&session(true)));
        store.on_auth_state_changed(AuthEvent::SignedOut, None);

        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.session.is_none());
    }

    #[tokio::test]
    async fn resolved_waits_for_first_update() {
        let store = SessionStore::new();
        let writer = store.clone();
        let handle = tokio::spawn(async move {
            writer.on_auth_state_changed(AuthEvent::InitialSession, None);
        });

        let state = store.resolved().await;
        assert!(!state.loading);
        assert!(handle.await.is_ok());
    }
}
