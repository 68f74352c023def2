//! Small helpers for local input validation. These run before any request is
//! built, so a rejected input never reaches the network.

use regex::Regex;

/// The auth service rejects shorter passwords; checking here saves a round trip.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Number of digits in an email verification code.
pub const OTP_LENGTH: usize = 6;

/// Normalize an email before sending it anywhere.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

#[must_use]
pub fn strong_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// True when `code` is exactly six ASCII digits.
#[must_use]
pub fn valid_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|byte| byte.is_ascii_digit())
}
