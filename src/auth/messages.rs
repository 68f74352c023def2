//! User-facing copy for auth failures. Classification already happened at the
//! service edge, so this is a plain lookup on [`AuthErrorKind`].

use super::{AuthError, AuthErrorKind};

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Maps an auth error to the message shown next to the form.
#[must_use]
pub fn user_message(err: &AuthError) -> String {
    let copy = match err.kind {
        // Local messages are already written for the user.
        AuthErrorKind::Validation => return err.message.clone(),
        AuthErrorKind::EmailExists => "An account with this email already exists. Try signing in.",
        AuthErrorKind::WeakPassword => "Password is too weak. Use at least 6 characters.",
        AuthErrorKind::InvalidEmail => "Please enter a valid email address.",
        AuthErrorKind::SignupDisabled => "New sign-ups are currently disabled.",
        AuthErrorKind::OtpExpired => "OTP has expired. Please request a new one.",
        AuthErrorKind::OtpInvalid => "Invalid OTP. Please check and try again.",
        AuthErrorKind::InvalidCredentials => "Invalid email or password.",
        AuthErrorKind::EmailNotConfirmed => {
            "Please verify your email before signing in. Check your inbox for the code."
        }
        AuthErrorKind::Provider => "Sign-in with the external provider failed. Please try again.",
        AuthErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
        AuthErrorKind::SessionExpired => "Your session has expired. Please sign in again.",
        AuthErrorKind::Network => "Unable to reach the server. Check your connection.",
        AuthErrorKind::Unexpected => GENERIC_FAILURE,
    };
    copy.to_string()
}
