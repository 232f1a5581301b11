//! Bearer secrets and external access tokens.
//!
//! A [`ClientSecret`] is the credential a producer presents on every ingress
//! request and a client presents when opening its real-time connection. It is
//! only ever generated by [`ClientSecret::generate`], which the credential
//! store calls; callers can never choose their own.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes in a generated secret (256 bits).
pub const SECRET_BYTES: usize = 32;

/// High-entropy bearer secret bound to exactly one identity.
///
/// `Debug` is redacted so secrets never end up in log lines.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Generates a fresh secret from the OS CSPRNG, URL-safe base64 encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a secret as presented by a caller (or loaded from storage).
    ///
    /// No validation happens here: an arbitrary presented string simply fails
    /// to resolve in the credential store.
    pub fn from_presented(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the secret as a string slice.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consumes the secret, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(***)")
    }
}

/// Last-known access token issued by the external OAuth platform.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_secret_encodes_256_bits() {
        let secret = ClientSecret::generate();
        let decoded = URL_SAFE_NO_PAD.decode(secret.expose()).unwrap();
        assert_eq!(decoded.len(), SECRET_BYTES);
    }

    #[test]
    fn generated_secret_is_query_safe() {
        let secret = ClientSecret::generate();
        assert!(secret
            .expose()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn generated_secrets_do_not_repeat() {
        let secrets: HashSet<_> = (0..256).map(|_| ClientSecret::generate()).collect();
        assert_eq!(secrets.len(), 256);
    }

    #[test]
    fn debug_output_is_redacted() {
        let secret = ClientSecret::from_presented("super-secret");
        assert_eq!(format!("{:?}", secret), "ClientSecret(***)");

        let token = AccessToken::new("bearer-token");
        assert!(!format!("{:?}", token).contains("bearer-token"));
    }
}
