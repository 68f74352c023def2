use thiserror::Error;

/// What went wrong, independent of how the auth service phrased it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Rejected locally before any network call.
    Validation,
    EmailExists,
    WeakPassword,
    InvalidEmail,
    SignupDisabled,
    OtpExpired,
    OtpInvalid,
    InvalidCredentials,
    EmailNotConfirmed,
    Provider,
    RateLimited,
    SessionExpired,
    Network,
    Unexpected,
}

impl AuthErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::EmailExists => "email_exists",
            Self::WeakPassword => "weak_password",
            Self::InvalidEmail => "invalid_email",
            Self::SignupDisabled => "signup_disabled",
            Self::OtpExpired => "otp_expired",
            Self::OtpInvalid => "otp_invalid",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotConfirmed => "email_not_confirmed",
            Self::Provider => "provider",
            Self::RateLimited => "rate_limited",
            Self::SessionExpired => "session_expired",
            Self::Network => "network",
            Self::Unexpected => "unexpected",
        }
    }

    /// True for errors raised before the request left the process.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Validation)
    }
}

/// Error returned by every auth operation. `message` is the raw text (local
/// copy for validation errors, the service's message otherwise).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl AuthError {
    #[must_use]
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Validation, message)
    }

    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Unexpected, message)
    }

    #[must_use]
    pub fn session_expired() -> Self {
        Self::new(AuthErrorKind::SessionExpired, "Auth session missing!")
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_decode() {
            AuthErrorKind::Unexpected
        } else {
            AuthErrorKind::Network
        };
        let status = err.status().map(|status| status.as_u16());
        Self {
            kind,
            message: err.to_string(),
            status,
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(format!("{err:#}"))
    }
}
