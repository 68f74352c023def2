pub mod account;
pub mod campaign;
pub mod open;
pub mod report;
pub mod upload;

// Internal "interpreter" for `Action`.
mod run;

use crate::auth::{
    messages::user_message, AuthClient, AuthContext, AuthError, FileStorage, GoTrueApi,
};
use crate::cli::globals::GlobalArgs;
use crate::routes::{Location, Navigation, Navigator, Route};
use crate::scope::ViewScope;
use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum Action {
    Account(account::Args),
    Open(open::Args),
    Upload(upload::Args),
    Report(report::Args),
    Campaign(campaign::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        run::execute(self).await
    }
}

/// Builds the auth stack from the resolved configuration and loads the
/// stored session.
///
/// # Errors
/// Returns an error if the auth URL is invalid.
pub async fn mount(globals: &GlobalArgs) -> Result<AuthContext<GoTrueApi>> {
    let api = GoTrueApi::new(&globals.auth_url, globals.anon_key.clone())?;
    let storage = Arc::new(FileStorage::new(globals.session_file.clone()));
    let client = Arc::new(AuthClient::new(api, storage));
    let context = AuthContext::mount(client, globals.site_url.clone()).await;
    debug!(signed_in = context.store().session().is_some(), "stored session loaded");
    Ok(context)
}

/// Passes `route` through the guard. Errors unless the page may be shown.
///
/// # Errors
/// Returns the guard's verdict (sign in first, or verify the email) as an
/// error.
pub async fn require(context: &AuthContext<GoTrueApi>, route: Route) -> Result<()> {
    let navigation = Navigator::new(context)
        .navigate_resolved(&Location::from(route), Route::title)
        .await;
    match navigation {
        Navigation::Render(..) => Ok(()),
        other => Err(anyhow!(open::describe(&other))),
    }
}

/// Loads a page's data inside a [`ViewScope`]. Ctrl-C leaves the page: the
/// request still finishes, but its result is dropped and `None` returned.
pub async fn load<F: Future>(view: &'static str, future: F) -> Option<F::Output> {
    let scope = ViewScope::new(view);
    let handle = scope.handle();
    let leave = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => scope.unmount(),
            Err(err) => {
                warn!(view = view, "cannot listen for Ctrl-C: {err}");
                std::future::pending::<()>().await;
            }
        }
    });
    let output = handle.run(future).await;
    leave.abort();
    output
}

/// Wraps an auth failure so the user copy is shown first and the raw service
/// message is kept as the cause.
pub(crate) fn auth_failure(err: AuthError) -> anyhow::Error {
    let copy = user_message(&err);
    anyhow::Error::new(err).context(copy)
}
