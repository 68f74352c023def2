use super::{OtpInput, ResendCooldown, RESEND_COOLDOWN_SECS};
use crate::auth::{messages::user_message, AuthApi, AuthContext, AuthError, OtpType};
use crate::routes::{NavigationState, Route};
use crate::session::{PendingVerification, Session};
use chrono::{DateTime, Utc};
use tracing::info;

/// Result of opening the verification page.
#[derive(Debug, PartialEq)]
pub enum VerificationEntry {
    Ready(VerificationFlow),
    /// No email was carried along; the user has to sign up first.
    Redirect(Route),
}

/// State of the verification page for one pending sign-up.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationFlow {
    pending: PendingVerification,
    input: OtpInput,
    cooldown: ResendCooldown,
    error: Option<String>,
    notice: Option<String>,
}

impl VerificationFlow {
    /// Opens the page with the email handed over by the sign-up page.
    #[must_use]
    pub fn enter(state: &NavigationState) -> VerificationEntry {
        match state.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => {
                VerificationEntry::Ready(Self::new(PendingVerification::new(email, Utc::now())))
            }
            _ => VerificationEntry::Redirect(Route::Signup),
        }
    }

    #[must_use]
    pub fn new(pending: PendingVerification) -> Self {
        Self {
            pending,
            input: OtpInput::new(),
            cooldown: ResendCooldown::new(),
            error: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.pending.email
    }

    #[must_use]
    pub fn pending(&self) -> &PendingVerification {
        &self.pending
    }

    #[must_use]
    pub fn input(&self) -> &OtpInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut OtpInput {
        &mut self.input
    }

    #[must_use]
    pub fn cooldown(&self) -> &ResendCooldown {
        &self.cooldown
    }

    pub fn cooldown_mut(&mut self) -> &mut ResendCooldown {
        &mut self.cooldown
    }

    /// Message shown under the fields after a failed submit or resend.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Submits the entered code. On success the caller navigates to
    /// [`Route::Dashboard`].
    ///
    /// # Errors
    /// Returns the local or remote error; its user copy is kept in
    /// [`Self::error`].
    pub async fn submit<A: AuthApi>(&mut self, context: &AuthContext<A>) -> Result<Session, AuthError> {
        self.error = None;
        self.notice = None;

        let result = match self.input.validate() {
            Ok(code) => {
                context
                    .verify_otp(&self.pending.email, &code, OtpType::Signup)
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(session) => {
                info!("email verified");
                Ok(session)
            }
            Err(err) => {
                self.error = Some(user_message(&err));
                Err(err)
            }
        }
    }

    /// Requests a new code. Refused locally while the cooldown runs; on
    /// success the fields are cleared and a new cooldown starts.
    ///
    /// # Errors
    /// Returns the local or remote error; its user copy is kept in
    /// [`Self::error`].
    pub async fn resend<A: AuthApi>(
        &mut self,
        context: &AuthContext<A>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.error = None;
        self.notice = None;

        let left = self.pending.cooldown_remaining(now);
        self.cooldown.catch_up(u32::try_from(left).unwrap_or(u32::MAX));
        if self.cooldown.is_active() {
            let err = AuthError::validation(format!(
                "Please wait {}s before requesting a new code",
                self.cooldown.remaining()
            ));
            self.error = Some(user_message(&err));
            return Err(err);
        }

        if let Err(err) = context.resend_confirmation(&self.pending.email).await {
            self.error = Some(user_message(&err));
            return Err(err);
        }

        self.input.clear();
        self.cooldown.start();
        self.pending.start_cooldown(now, RESEND_COOLDOWN_SECS);
        self.notice = Some(format!(
            "A new verification code has been sent to {}",
            self.pending.email
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{fake::FakeAuthApi, AuthClient, AuthErrorKind, MemoryStorage};
    use crate::session::types::fixtures::at;
    use std::sync::Arc;

    async fn context() -> AuthContext<FakeAuthApi> {
        let client = Arc::new(AuthClient::new(
            FakeAuthApi::unconfirmed(),
            Arc::new(MemoryStorage::new()),
        ));
        AuthContext::mount(client, "http://localhost:5173").await
    }

    fn flow() -> VerificationFlow {
        VerificationFlow::new(PendingVerification::new("ana@example.com", at(10)))
    }

    fn type_code(flow: &mut VerificationFlow, code: &str) {
        for (index, digit) in code.chars().enumerate() {
            flow.input_mut().input(index, &digit.to_string());
        }
    }

    #[test]
    fn entering_without_email_goes_to_signup() {
        assert_eq!(
            VerificationFlow::enter(&NavigationState::default()),
            VerificationEntry::Redirect(Route::Signup)
        );
        assert_eq!(
            VerificationFlow::enter(&NavigationState::with_email("  ")),
            VerificationEntry::Redirect(Route::Signup)
        );

        let VerificationEntry::Ready(flow) =
            VerificationFlow::enter(&NavigationState::with_email("ana@example.com"))
        else {
            panic!("expected the verification page");
        };
        assert_eq!(flow.email(), "ana@example.com");
    }

    #[tokio::test]
    async fn incomplete_code_stays_local() {
        let context = context().await;
        let mut flow = flow();
        type_code(&mut flow, "123");

        assert!(flow.submit(&context).await.is_err());
        assert_eq!(flow.error(), Some("Please enter all 6 digits"));
        assert_eq!(context.client().api().call_count("verify_otp"), 0);
    }

    #[tokio::test]
    async fn wrong_code_shows_invalid_copy() {
        let context = context().await;
        let mut flow = flow();
        type_code(&mut flow, "000000");

        let err = flow.submit(&context).await.err();
        assert_eq!(err.map(|err| err.kind), Some(AuthErrorKind::OtpInvalid));
        assert_eq!(flow.error(), Some("Invalid OTP. Please check and try again."));
    }

    #[tokio::test]
    async fn correct_code_verifies() -> anyhow::Result<()> {
        let context = context().await;
        let mut flow = flow();
        type_code(&mut flow, FakeAuthApi::VALID_CODE);

        let session = flow.submit(&context).await?;
        assert!(session.is_verified());
        assert!(flow.error().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn resend_clears_fields_and_starts_cooldown() -> anyhow::Result<()> {
        let context = context().await;
        let mut flow = flow();
        type_code(&mut flow, "12");

        flow.resend(&context, at(10)).await?;

        assert_eq!(flow.input().code(), "");
        assert_eq!(flow.cooldown().remaining(), RESEND_COOLDOWN_SECS);
        assert_eq!(flow.pending().cooldown_remaining(at(10)), 60);
        assert!(flow.notice().is_some());

        assert!(flow.resend(&context, at(10)).await.is_err());
        assert_eq!(context.client().api().call_count("resend"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn resend_allowed_once_wall_clock_passes_cooldown() -> anyhow::Result<()> {
        let context = context().await;
        let mut flow = flow();

        flow.resend(&context, at(10)).await?;
        // No ticks were delivered in between.
        flow.resend(&context, at(11)).await?;

        assert_eq!(context.client().api().call_count("resend"), 2);
        Ok(())
    }
}
