//! In-process `AuthApi` for unit tests. Records every call so tests can assert
//! that local validation kept a request off the wire.

use super::{
    AuthApi, AuthError, AuthErrorKind, OAuthProvider, OtpType, SignUpRequest, SignUpResponse,
    VerifyOtpRequest,
};
use crate::session::{types::fixtures, Identity, Session};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};
use url::Url;

pub(crate) struct FakeAuthApi {
    confirmed: AtomicBool,
    auto_confirm: bool,
    calls: Mutex<Vec<&'static str>>,
    next_error: Mutex<Option<AuthError>>,
}

impl FakeAuthApi {
    pub(crate) const VALID_CODE: &'static str = "123456";

    /// Account whose email is already confirmed.
    pub(crate) fn confirmed() -> Self {
        Self::new(true, false)
    }

    /// Fresh sign-up that must be confirmed with [`Self::VALID_CODE`].
    pub(crate) fn unconfirmed() -> Self {
        Self::new(false, false)
    }

    /// Service configured to confirm emails at sign-up.
    pub(crate) fn auto_confirming() -> Self {
        Self::new(false, true)
    }

    fn new(confirmed: bool, auto_confirm: bool) -> Self {
        Self {
            confirmed: AtomicBool::new(confirmed),
            auto_confirm,
            calls: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
        }
    }

    /// The next call, whatever it is, fails with `err`.
    pub(crate) fn fail_next(&self, err: AuthError) {
        *self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| **call == name).count()
    }

    fn record(&self, name: &'static str) -> Result<(), AuthError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name);
        match self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn identity(&self) -> Identity {
        fixtures::identity(self.confirmed.load(Ordering::SeqCst))
    }

    fn session(&self, access_token: &str) -> Session {
        let now = Utc::now();
        Session::new(
            self.identity(),
            now,
            now + Duration::hours(1),
            SecretString::from(access_token.to_string()),
            SecretString::from("refresh-token".to_string()),
        )
    }
}

impl AuthApi for FakeAuthApi {
    async fn sign_up(&self, _request: &SignUpRequest) -> Result<SignUpResponse, AuthError> {
        self.record("sign_up")?;
        if self.auto_confirm {
            self.confirmed.store(true, Ordering::SeqCst);
            let session = self.session("access-signup");
            return Ok(SignUpResponse {
                identity: session.identity.clone(),
                session: Some(session),
            });
        }
        Ok(SignUpResponse {
            identity: self.identity(),
            session: None,
        })
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &SecretString,
    ) -> Result<Session, AuthError> {
        self.record("sign_in_with_password")?;
        if !self.confirmed.load(Ordering::SeqCst) {
            return Err(AuthError::new(
                AuthErrorKind::EmailNotConfirmed,
                "Email not confirmed",
            ));
        }
        Ok(self.session("access-password"))
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<Session, AuthError> {
        self.record("verify_otp")?;
        if request.token != Self::VALID_CODE {
            return Err(AuthError::new(
                AuthErrorKind::OtpInvalid,
                "Token has expired or is invalid",
            ));
        }
        if request.otp_type == OtpType::Signup || request.otp_type == OtpType::Recovery {
            self.confirmed.store(true, Ordering::SeqCst);
        }
        Ok(self.session("access-otp"))
    }

    async fn exchange_code(
        &self,
        _auth_code: &str,
        _code_verifier: &SecretString,
    ) -> Result<Session, AuthError> {
        self.record("exchange_code")?;
        self.confirmed.store(true, Ordering::SeqCst);
        Ok(self.session("access-oauth"))
    }

    async fn refresh(&self, _refresh_token: &SecretString) -> Result<Session, AuthError> {
        self.record("refresh")?;
        Ok(self.session("access-refreshed"))
    }

    async fn sign_out(&self, _access_token: &SecretString) -> Result<(), AuthError> {
        self.record("sign_out")
    }

    async fn resend(&self, _email: &str, _otp_type: OtpType) -> Result<(), AuthError> {
        self.record("resend")
    }

    async fn recover(&self, _email: &str, _redirect_to: &str) -> Result<(), AuthError> {
        self.record("recover")
    }

    async fn update_password(
        &self,
        _access_token: &SecretString,
        _password: &SecretString,
    ) -> Result<Identity, AuthError> {
        self.record("update_password")?;
        Ok(self.identity())
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, AuthError> {
        let mut url = Url::parse("https://auth.test/auth/v1/authorize")
            .map_err(|err| AuthError::unexpected(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge);
        Ok(url)
    }
}
