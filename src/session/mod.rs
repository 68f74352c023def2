//! Session state for the dashboard: identity and session values, the
//! auth-state listener contract, and the reactive store that the route guard
//! and views read from.

mod events;
mod store;
pub(crate) mod types;

pub use events::{AuthEvent, AuthStateListener, ListenerRegistry, Subscription};
pub use store::{SessionStore, StoreState};
pub use types::{Identity, PendingVerification, Session};
