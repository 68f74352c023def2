use super::{
    pkce::PkcePair, AuthApi, AuthError, AuthErrorKind, OAuthProvider, OtpType, SessionStorage,
    SignUpRequest, SignUpResponse, VerifyOtpRequest,
};
use crate::session::{
    types::StoredSession, AuthEvent, AuthStateListener, Identity, ListenerRegistry, Session,
    Subscription,
};
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Storage key of the persisted session.
pub const SESSION_KEY: &str = "crmdash.auth.token";
/// Storage key of the PKCE verifier between the OAuth redirect and its callback.
pub const CODE_VERIFIER_KEY: &str = "crmdash.auth.code-verifier";

/// A stored session this close to expiry is refreshed before being handed out.
const EXPIRY_MARGIN_SECS: i64 = 30;

/// Where to send the browser for an OAuth sign-in. The verifier is already
/// persisted; it is returned for callers that complete the flow elsewhere.
#[derive(Debug)]
pub struct OAuthRedirect {
    pub provider: OAuthProvider,
    pub url: Url,
    pub code_verifier: SecretString,
}

/// Stateful auth client: wraps an [`AuthApi`], persists the session and emits
/// an [`AuthEvent`] to every subscribed listener after each state change.
pub struct AuthClient<A> {
    api: A,
    storage: Arc<dyn SessionStorage>,
    listeners: ListenerRegistry,
}

impl<A> std::fmt::Debug for AuthClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<A: AuthApi> AuthClient<A> {
    #[must_use]
    pub fn new(api: A, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            api,
            storage,
            listeners: ListenerRegistry::new(),
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Registers a listener. Dropping the returned handle unsubscribes it.
    pub fn on_auth_state_change(&self, listener: Arc<dyn AuthStateListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    /// Current persisted session. An expired session is refreshed first; when
    /// the service rejects the refresh the session is discarded.
    ///
    /// # Errors
    /// Returns an error if storage fails or the refresh could not reach the
    /// service.
    #[instrument(skip_all)]
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.load_session()? else {
            return Ok(None);
        };

        if !session.is_expired_at(Utc::now(), Duration::seconds(EXPIRY_MARGIN_SECS)) {
            return Ok(Some(session));
        }

        debug!("stored session expired, refreshing");
        match self.api.refresh(session.refresh_token()).await {
            Ok(refreshed) => self.commit(AuthEvent::TokenRefreshed, refreshed).map(Some),
            // Offline: keep the stored session for the next attempt.
            Err(err) if err.kind == AuthErrorKind::Network => Err(err),
            Err(err) => {
                warn!("Discarding session after failed refresh: {err}");
                self.storage.remove(SESSION_KEY)?;
                self.listeners.emit(AuthEvent::SignedOut, None);
                Ok(None)
            }
        }
    }

    /// # Errors
    /// Returns the service error unchanged.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, AuthError> {
        let response = self.api.sign_up(request).await?;
        if let Some(session) = &response.session {
            self.commit(AuthEvent::SignedIn, session.clone())?;
        }
        Ok(response)
    }

    /// # Errors
    /// Returns the service error unchanged.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let session = self.api.sign_in_with_password(email, password).await?;
        self.commit(AuthEvent::SignedIn, session)
    }

    /// # Errors
    /// Returns the service error unchanged.
    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<Session, AuthError> {
        let session = self.api.verify_otp(request).await?;
        let event = if request.otp_type == OtpType::Recovery {
            AuthEvent::PasswordRecovery
        } else {
            AuthEvent::SignedIn
        };
        self.commit(event, session)
    }

    /// Starts the PKCE redirect flow. Nothing is sent to the service here.
    ///
    /// # Errors
    /// Returns an error if the verifier cannot be stored.
    pub fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRedirect, AuthError> {
        let pair = PkcePair::generate();
        let url = self
            .api
            .authorize_url(provider, redirect_to, &pair.challenge)?;
        self.storage
            .store(CODE_VERIFIER_KEY, pair.verifier.expose_secret())?;

        Ok(OAuthRedirect {
            provider,
            url,
            code_verifier: pair.verifier,
        })
    }

    /// Completes the OAuth flow with the code from the callback URL.
    ///
    /// # Errors
    /// Returns a provider error when no verifier is stored, otherwise the
    /// service error.
    #[instrument(skip_all)]
    pub async fn exchange_code_for_session(&self, auth_code: &str) -> Result<Session, AuthError> {
        let verifier = self
            .storage
            .load(CODE_VERIFIER_KEY)?
            .map(SecretString::from)
            .ok_or_else(|| {
                AuthError::new(
                    AuthErrorKind::Provider,
                    "No code verifier stored for this sign-in. Start the sign-in again.",
                )
            })?;

        let session = self.api.exchange_code(auth_code, &verifier).await?;
        self.storage.remove(CODE_VERIFIER_KEY)?;
        self.commit(AuthEvent::SignedIn, session)
    }

    /// # Errors
    /// Returns `SessionExpired` without a stored session, otherwise the
    /// service error.
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let current = self
            .load_session()?
            .ok_or_else(AuthError::session_expired)?;
        let session = self.api.refresh(current.refresh_token()).await?;
        self.commit(AuthEvent::TokenRefreshed, session)
    }

    /// Clears the local session even when the remote revoke fails; the remote
    /// error is still returned.
    ///
    /// # Errors
    /// Returns the revoke or storage error.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let current = self.load_session().unwrap_or_else(|err| {
            warn!("Ignoring unreadable session on sign-out: {err}");
            None
        });

        let remote = match &current {
            Some(session) => self.api.sign_out(session.raw_token()).await,
            None => Ok(()),
        };

        self.storage.remove(SESSION_KEY)?;
        self.storage.remove(CODE_VERIFIER_KEY)?;
        self.listeners.emit(AuthEvent::SignedOut, None);
        info!("signed out");

        remote
    }

    /// # Errors
    /// Returns the service error unchanged.
    pub async fn resend(&self, email: &str, otp_type: OtpType) -> Result<(), AuthError> {
        self.api.resend(email, otp_type).await
    }

    /// # Errors
    /// Returns the service error unchanged.
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthError> {
        self.api.recover(email, redirect_to).await
    }

    /// # Errors
    /// Returns `SessionExpired` without a stored session, otherwise the
    /// service error.
    pub async fn update_user_password(&self, password: &SecretString) -> Result<Identity, AuthError> {
        let current = self
            .load_session()?
            .ok_or_else(AuthError::session_expired)?;
        let identity = self
            .api
            .update_password(current.raw_token(), password)
            .await?;
        let session = self.commit(AuthEvent::UserUpdated, current.with_identity(identity))?;
        Ok(session.identity)
    }

    fn load_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(raw) = self.storage.load(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(Some(stored.into())),
            Err(err) => {
                warn!("Discarding unreadable stored session: {err}");
                self.storage.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn commit(&self, event: AuthEvent, session: Session) -> Result<Session, AuthError> {
        let stored = serde_json::to_string(&StoredSession::from(&session))
            .map_err(|err| AuthError::unexpected(format!("failed to encode session: {err}")))?;
        self.storage.store(SESSION_KEY, &stored)?;
        self.listeners.emit(event, Some(&session));
        debug!(event = event.as_str(), verified = session.is_verified(), "session stored");
        Ok(session)
    }
}
