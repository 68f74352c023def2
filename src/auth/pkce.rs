//! PKCE (RFC 7636) pair for the OAuth redirect flow. The verifier stays in
//! local storage until the callback exchanges the code; only the S256
//! challenge is placed in the redirect URL.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

pub const CHALLENGE_METHOD: &str = "s256";

pub struct PkcePair {
    pub verifier: SecretString,
    pub challenge: String,
}

impl PkcePair {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let verifier = Base64UrlUnpadded::encode_string(&bytes);
        Self::from_verifier(SecretString::from(verifier))
    }

    #[must_use]
    pub fn from_verifier(verifier: SecretString) -> Self {
        let challenge = challenge_for(verifier.expose_secret());
        Self {
            verifier,
            challenge,
        }
    }
}

/// `BASE64URL(SHA256(verifier))` without padding.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    Base64UrlUnpadded::encode_string(&digest)
}
