//! Gate for protected pages.
//!
//! The guard reads a store snapshot and decides between four outcomes. It
//! never talks to the auth service, except for the explicit re-check from the
//! verification interstitial.

use crate::auth::{AuthApi, AuthContext};
use crate::routes::{Location, NavigationState, Route};
use crate::session::StoreState;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    AuthenticatedUnverified,
    AuthenticatedVerified,
}

impl GuardState {
    #[must_use]
    pub fn evaluate(state: &StoreState) -> Self {
        if state.loading {
            return Self::Loading;
        }
        match &state.session {
            None => Self::Unauthenticated,
            Some(session) if session.is_verified() => Self::AuthenticatedVerified,
            Some(_) => Self::AuthenticatedUnverified,
        }
    }
}

/// Navigation to the sign-in page that replaces the current history entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    pub from: Option<Location>,
    pub replace: bool,
}

impl Redirect {
    #[must_use]
    pub fn to_login(from: &Location) -> Self {
        Self {
            to: Route::Login,
            from: Some(from.clone()),
            replace: true,
        }
    }

    /// State handed to the sign-in page.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        NavigationState {
            email: None,
            from: self.from.clone(),
        }
    }
}

/// Interstitial shown to a signed-in user whose email is not confirmed yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationPrompt {
    pub email: String,
}

impl VerificationPrompt {
    pub const TITLE: &'static str = "Email Verification Required";
    pub const BODY: &'static str =
        "Please check your email and click the verification link to access your account.";
    pub const ACTION: &'static str = "I've Verified My Email";
}

#[derive(Debug, PartialEq)]
pub enum GuardOutcome<T> {
    Waiting,
    Redirect(Redirect),
    VerifyEmail(VerificationPrompt),
    Render(T),
}

/// Pure decision over a snapshot. `children` runs only for a verified session.
pub fn evaluate<T>(
    state: &StoreState,
    location: &Location,
    children: impl FnOnce() -> T,
) -> GuardOutcome<T> {
    match GuardState::evaluate(state) {
        GuardState::Loading => GuardOutcome::Waiting,
        GuardState::Unauthenticated => GuardOutcome::Redirect(Redirect::to_login(location)),
        GuardState::AuthenticatedUnverified => GuardOutcome::VerifyEmail(VerificationPrompt {
            email: state
                .identity()
                .map(|identity| identity.email.clone())
                .unwrap_or_default(),
        }),
        GuardState::AuthenticatedVerified => GuardOutcome::Render(children()),
    }
}

/// Where to go after signing in: the interrupted location, else the dashboard.
#[must_use]
pub fn return_destination(state: &NavigationState) -> Location {
    state
        .from
        .clone()
        .filter(|from| from.route() != Some(Route::Login))
        .unwrap_or_else(|| Location::from(Route::Dashboard))
}

pub struct RouteGuard<'a, A> {
    context: &'a AuthContext<A>,
}

impl<'a, A: AuthApi> RouteGuard<'a, A> {
    #[must_use]
    pub fn new(context: &'a AuthContext<A>) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn context(&self) -> &'a AuthContext<A> {
        self.context
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        GuardState::evaluate(&self.context.store().snapshot())
    }

    pub fn protect<T>(&self, location: &Location, children: impl FnOnce() -> T) -> GuardOutcome<T> {
        let snapshot = self.context.store().snapshot();
        let outcome = evaluate(&snapshot, location, children);
        debug!(
            path = %location,
            state = ?GuardState::evaluate(&snapshot),
            "guard evaluated"
        );
        outcome
    }

    /// "I've Verified My Email": reload the session and evaluate again.
    pub async fn recheck(&self) -> GuardState {
        self.context.reinitialize().await;
        self.state()
    }
}
