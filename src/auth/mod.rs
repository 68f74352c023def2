//! Authentication against the hosted auth service.
//!
//! Three layers, outermost first:
//!
//! - [`AuthContext`]: the operations the pages call. Validates input locally,
//!   owns the [`SessionStore`](crate::session::SessionStore) and its listener
//!   subscription, and returns `Result<T, AuthError>` without panicking.
//! - [`AuthClient`]: persists the session and PKCE verifier in a
//!   [`SessionStorage`] and emits auth-state events after every change.
//! - [`AuthApi`]: one method per request/response round trip. [`GoTrueApi`]
//!   is the HTTP implementation and the only place remote error payloads are
//!   classified into [`AuthErrorKind`].

mod client;
mod context;
mod error;
mod gotrue;
pub mod messages;
pub mod pkce;
pub mod storage;
pub mod utils;

pub use client::{AuthClient, OAuthRedirect};
pub use context::{AuthContext, SignUpOutcome};
pub use error::{AuthError, AuthErrorKind};
pub use gotrue::GoTrueApi;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

use crate::session::{Identity, Session};
use secrecy::SecretString;
use std::future::Future;
use url::Url;

/// Verification purpose sent with an OTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpType {
    Signup,
    Recovery,
    EmailChange,
    MagicLink,
    Email,
}

impl OtpType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
            Self::MagicLink => "magiclink",
            Self::Email => "email",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SignUpRequest {
    pub email: String,
    pub password: SecretString,
    pub full_name: String,
    pub redirect_to: Option<String>,
}

/// Result of a sign-up call: the created identity, plus a session when the
/// service confirms emails automatically.
#[derive(Clone, Debug)]
pub struct SignUpResponse {
    pub identity: Identity,
    pub session: Option<Session>,
}

#[derive(Clone, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub token: String,
    pub otp_type: OtpType,
}

/// One request/response operation per method against the auth service.
pub trait AuthApi: Send + Sync {
    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl Future<Output = Result<SignUpResponse, AuthError>> + Send;

    fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &SecretString,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn refresh(
        &self,
        refresh_token: &SecretString,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn sign_out(
        &self,
        access_token: &SecretString,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn resend(
        &self,
        email: &str,
        otp_type: OtpType,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn recover(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn update_password(
        &self,
        access_token: &SecretString,
        password: &SecretString,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;

    /// Builds the browser redirect for an OAuth provider. No network call.
    ///
    /// # Errors
    /// Returns an error if the service URL cannot be extended.
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, AuthError>;
}

#[cfg(test)]
pub(crate) mod fake;
