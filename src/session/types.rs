//! Identity and session values. Raw tokens are kept in `SecretString` and are
//! redacted from `Debug` output; only the storage layer ever exposes them.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The authenticated user as reported by the auth service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub full_name: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Server-issued proof of authentication with an expiry.
#[derive(Clone)]
pub struct Session {
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    raw_token: SecretString,
    refresh_token: SecretString,
}

impl Session {
    #[must_use]
    pub fn new(
        identity: Identity,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        raw_token: SecretString,
        refresh_token: SecretString,
    ) -> Self {
        Self {
            identity,
            issued_at,
            expires_at,
            raw_token,
            refresh_token,
        }
    }

    #[must_use]
    pub fn identity_id(&self) -> Uuid {
        self.identity.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.identity.email
    }

    #[must_use]
    pub fn email_verified_at(&self) -> Option<DateTime<Utc>> {
        self.identity.email_confirmed_at
    }

    /// A session only counts for protected content once the email is confirmed.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.identity.is_verified()
    }

    #[must_use]
    pub fn raw_token(&self) -> &SecretString {
        &self.raw_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// Expired sessions are refreshed ahead of time; `margin` widens the window.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }

    /// Returns the same session carrying an updated identity.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.issued_at == other.issued_at
            && self.expires_at == other.expires_at
            && self.raw_token.expose_secret() == other.raw_token.expose_secret()
            && self.refresh_token.expose_secret() == other.refresh_token.expose_secret()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("raw_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// On-disk shape of a session. Only the storage layer builds this.
#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    identity: Identity,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    access_token: String,
    refresh_token: String,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            identity: session.identity.clone(),
            issued_at: session.issued_at,
            expires_at: session.expires_at,
            access_token: session.raw_token.expose_secret().to_string(),
            refresh_token: session.refresh_token.expose_secret().to_string(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self::new(
            stored.identity,
            stored.issued_at,
            stored.expires_at,
            SecretString::from(stored.access_token),
            SecretString::from(stored.refresh_token),
        )
    }
}

/// A sign-up that still waits for its email to be confirmed with a code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingVerification {
    pub email: String,
    pub requested_at: DateTime<Utc>,
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl PendingVerification {
    #[must_use]
    pub fn new(email: impl Into<String>, requested_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            requested_at,
            cooldown_until: None,
        }
    }

    pub fn start_cooldown(&mut self, now: DateTime<Utc>, seconds: u32) {
        self.cooldown_until = Some(now + Duration::seconds(i64::from(seconds)));
    }

    /// Whole seconds left before another code may be requested.
    #[must_use]
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> u64 {
        self.cooldown_until
            .map(|until| (until - now).num_seconds())
            .filter(|seconds| *seconds > 0)
            .map_or(0, |seconds| seconds.unsigned_abs())
    }
}
