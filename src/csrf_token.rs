//! Provides the anti-CSRF `state` value used in the OAuth2 redirect.
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use tracing::error;

use crate::error::Error;

/// The anti-CSRF value sent as `state` in the authorization request.
///
/// Either fixed through configuration or generated once at startup from `OsRng`
/// and Base64URL-encoded. Google echoes it back on the callback, where it is
/// compared with the value held in `Config`.
#[derive(Debug, Clone, PartialEq)]
pub struct CSRFToken(pub(crate) String);

impl CSRFToken {
    /// Generates a new token from 32 random bytes.
    /// Returns an `Error::GenToken` if the random generation fails.
    pub fn new() -> Result<Self, Error> {
        let mut key = [0u8; 32];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            error!("Failed to generate CSRF token: {:?}", e);
            Error::GenToken
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(key)))
    }

    /// Returns the token as a string reference.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// A `state` value received on the callback.
///
/// This token **has not been verified yet** and must be checked against the
/// configured `CSRFToken` before the authorization code is used.
#[derive(Debug, Clone)]
pub struct UnCheckedCSRFToken(pub(crate) String);

impl UnCheckedCSRFToken {
    pub fn matches(&self, expected: &CSRFToken) -> bool {
        self.0 == expected.0
    }
}

impl From<String> for UnCheckedCSRFToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use super::{CSRFToken, UnCheckedCSRFToken};

    #[test]
    fn test_csrf_new() {
        let csrf_token = CSRFToken::new().unwrap();
        // 32 bytes, unpadded Base64URL
        assert_eq!(csrf_token.value().len(), 43);
        assert_ne!(csrf_token, CSRFToken::new().unwrap());
    }

    #[test]
    fn test_unchecked_matches() {
        let expected = CSRFToken("random-state".to_string());
        assert!(UnCheckedCSRFToken::from("random-state".to_string()).matches(&expected));
        assert!(!UnCheckedCSRFToken::from("forged".to_string()).matches(&expected));
        assert!(!UnCheckedCSRFToken::from(String::new()).matches(&expected));
    }
}
