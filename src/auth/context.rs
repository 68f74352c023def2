use super::{
    utils::{normalize_email, strong_enough, valid_email, valid_otp},
    AuthApi, AuthClient, AuthError, OAuthProvider, OAuthRedirect, OtpType, SignUpRequest,
    VerifyOtpRequest,
};
use crate::routes::Route;
use crate::session::{PendingVerification, Session, SessionStore, Subscription};
use chrono::Utc;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

/// What a successful sign-up leads to.
#[derive(Clone, Debug, PartialEq)]
pub enum SignUpOutcome {
    /// The service sent a confirmation code; the email must be verified next.
    PendingVerification(PendingVerification),
    /// The service confirmed the email on its own and opened a session.
    SignedIn(Session),
}

/// Injectable auth provider: one store, one client and the subscription that
/// ties them together. Pages call the operations here rather than the client.
pub struct AuthContext<A> {
    store: SessionStore,
    client: Arc<AuthClient<A>>,
    subscription: Mutex<Option<Subscription>>,
    site_url: String,
}

impl<A: AuthApi> AuthContext<A> {
    /// Attaches a fresh store to `client` and resolves the initial session.
    pub async fn mount(client: Arc<AuthClient<A>>, site_url: impl Into<String>) -> Self {
        let store = SessionStore::new();
        let subscription = client.on_auth_state_change(Arc::new(store.clone()));
        store.initialize(&client).await;

        let site_url = site_url.into().trim_end_matches('/').to_string();
        debug!(site_url = %site_url, "auth context mounted");

        Self {
            store,
            client,
            subscription: Mutex::new(Some(subscription)),
            site_url,
        }
    }

    /// Detaches the store from the client. Later auth events no longer reach it.
    pub fn unmount(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            debug!("auth context unmounted");
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Re-reads the persisted session into the store.
    pub async fn reinitialize(&self) {
        self.store.initialize(&self.client).await;
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn client(&self) -> &Arc<AuthClient<A>> {
        &self.client
    }

    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    fn site_link(&self, route: Route) -> String {
        format!("{}{}", self.site_url, route.path())
    }

    /// # Errors
    /// Rejects empty fields, a malformed email or a short password before any
    /// request; otherwise returns the service error.
    #[instrument(skip_all)]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = normalize_email(email);
        let full_name = full_name.trim();

        if email.is_empty() || password.is_empty() || full_name.is_empty() {
            return Err(AuthError::validation("Please fill in all fields"));
        }
        if !valid_email(&email) {
            return Err(AuthError::validation("Please enter a valid email address"));
        }
        if !strong_enough(password) {
            return Err(AuthError::validation(
                "Password should be at least 6 characters",
            ));
        }

        let request = SignUpRequest {
            email: email.clone(),
            password: SecretString::from(password.to_string()),
            full_name: full_name.to_string(),
            redirect_to: Some(self.site_link(Route::Dashboard)),
        };
        let response = self.client.sign_up(&request).await.inspect_err(log_failure)?;

        match response.session {
            Some(session) if session.is_verified() => {
                info!("sign-up confirmed immediately");
                Ok(SignUpOutcome::SignedIn(session))
            }
            _ => {
                info!("sign-up pending email verification");
                Ok(SignUpOutcome::PendingVerification(PendingVerification::new(
                    response.identity.email,
                    Utc::now(),
                )))
            }
        }
    }

    /// # Errors
    /// Rejects anything but six digits locally; otherwise returns the service
    /// error.
    #[instrument(skip_all, fields(otp_type = otp_type.as_str()))]
    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        otp_type: OtpType,
    ) -> Result<Session, AuthError> {
        let code = code.trim();
        if !valid_otp(code) {
            return Err(AuthError::validation("Please enter all 6 digits"));
        }
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::validation("Email is required"));
        }

        let request = VerifyOtpRequest {
            email,
            token: code.to_string(),
            otp_type,
        };
        self.client
            .verify_otp(&request)
            .await
            .inspect_err(log_failure)
    }

    /// # Errors
    /// Rejects empty credentials locally; otherwise returns the service error.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::validation("Please enter your email and password"));
        }

        self.client
            .sign_in_with_password(&email, &SecretString::from(password.to_string()))
            .await
            .inspect_err(log_failure)
    }

    /// Builds the Google redirect; the browser comes back to the dashboard.
    ///
    /// # Errors
    /// Returns an error if the redirect URL or verifier cannot be produced.
    pub fn sign_in_with_google(&self) -> Result<OAuthRedirect, AuthError> {
        self.client
            .sign_in_with_oauth(OAuthProvider::Google, &self.site_link(Route::Dashboard))
            .inspect_err(log_failure)
    }

    /// # Errors
    /// Rejects an empty code locally; otherwise returns the exchange error.
    pub async fn exchange_code(&self, auth_code: &str) -> Result<Session, AuthError> {
        let auth_code = auth_code.trim();
        if auth_code.is_empty() {
            return Err(AuthError::validation("Missing authorization code"));
        }
        self.client
            .exchange_code_for_session(auth_code)
            .await
            .inspect_err(log_failure)
    }

    /// # Errors
    /// Returns the remote revoke error; the local session is gone either way.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.client.sign_out().await.inspect_err(log_failure)
    }

    /// # Errors
    /// Rejects an empty email locally; otherwise returns the service error.
    #[instrument(skip_all)]
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::validation("Email is required"));
        }
        self.client
            .resend(&email, OtpType::Signup)
            .await
            .inspect_err(log_failure)
    }

    /// Sends the reset email; its link opens `/reset-password` on the site.
    ///
    /// # Errors
    /// Rejects an empty email locally; otherwise returns the service error.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::validation("Email is required"));
        }
        let redirect_to = format!("{}/reset-password", self.site_url);
        self.client
            .reset_password_for_email(&email, &redirect_to)
            .await
            .inspect_err(log_failure)
    }

    /// # Errors
    /// Rejects a short password locally and requires a session; otherwise
    /// returns the service error.
    pub async fn update_password(&self, password: &str) -> Result<(), AuthError> {
        if !strong_enough(password) {
            return Err(AuthError::validation(
                "Password should be at least 6 characters",
            ));
        }
        self.client
            .update_user_password(&SecretString::from(password.to_string()))
            .await
            .inspect_err(log_failure)?;
        Ok(())
    }

    /// # Errors
    /// Returns `SessionExpired` without a session, otherwise the service error.
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        self.client.refresh_session().await.inspect_err(log_failure)
    }
}

fn log_failure(err: &AuthError) {
    if err.kind.is_local() {
        debug!("auth input rejected: {err}");
    } else {
        warn!(kind = err.kind.as_str(), status = ?err.status, "auth request failed: {err}");
    }
}
