//! Email verification with a six-digit code: the field model, the resend
//! cooldown and the page flow that ties them to [`AuthContext`](crate::auth::AuthContext).

mod cooldown;
mod flow;
mod input;

pub use cooldown::{ResendCooldown, RESEND_COOLDOWN_SECS};
pub use flow::{VerificationEntry, VerificationFlow};
pub use input::OtpInput;
