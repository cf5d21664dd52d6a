/// Signed, expiring tokens (HS256 JWT) binding a user id to a purpose.
///
/// Password reset links and session cookies both carry one of these. The
/// purpose travels in the `aud` claim, so a token minted for one use is
/// never accepted for the other.
use crate::error::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default lifetime of a password reset token
pub const RESET_TOKEN_TTL_SECS: i64 = 1800;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token purpose
    pub aud: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    PasswordReset,
    Session,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password-reset",
            TokenPurpose::Session => "session",
        }
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies tokens with the process-wide secret key
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    reset_ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, reset_ttl_secs: i64) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            reset_ttl_secs,
        }
    }

    /// Issue a token for `user_id` valid for `ttl_secs` seconds
    pub fn issue(&self, purpose: TokenPurpose, user_id: i64, ttl_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_secs,
            aud: purpose.as_str().to_string(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?)
    }

    /// Verify signature, expiry and purpose, returning the embedded user id.
    ///
    /// Every failure collapses to `None`.
    pub fn verify(&self, purpose: TokenPurpose, token: &str) -> Option<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[purpose.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);

        match decode::<Claims>(token, &self.keys.decoding, &validation) {
            Ok(data) => match data.claims.sub.parse::<i64>() {
                Ok(user_id) => Some(user_id),
                Err(_) => {
                    tracing::debug!("Token subject is not a user id");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(purpose = purpose.as_str(), "Token validation failed: {}", e);
                None
            }
        }
    }

    pub fn issue_reset_token(&self, user_id: i64) -> Result<String> {
        self.issue(TokenPurpose::PasswordReset, user_id, self.reset_ttl_secs)
    }

    pub fn verify_reset_token(&self, token: &str) -> Option<i64> {
        self.verify(TokenPurpose::PasswordReset, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-that-is-long-enough", RESET_TOKEN_TTL_SECS)
    }

    #[test]
    fn test_round_trip() {
        let tokens = service();
        let token = tokens.issue_reset_token(42).unwrap();

        // JWT tokens have 3 parts separated by dots
        assert_eq!(token.matches('.').count(), 2);
        assert_eq!(tokens.verify_reset_token(&token), Some(42));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let token = tokens.issue(TokenPurpose::PasswordReset, 7, 1).unwrap();
        assert_eq!(tokens.verify_reset_token(&token), Some(7));

        std::thread::sleep(std::time::Duration::from_secs(2));
        assert_eq!(tokens.verify_reset_token(&token), None);
    }

    #[test]
    fn test_tampering_any_character_invalidates() {
        let tokens = service();
        let token = tokens.issue_reset_token(1).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(
                tokens.verify_reset_token(&tampered),
                None,
                "tampered token accepted at index {}",
                i
            );
        }
    }

    #[test]
    fn test_purposes_do_not_mix() {
        let tokens = service();
        let session = tokens.issue(TokenPurpose::Session, 3, 60).unwrap();
        assert_eq!(tokens.verify(TokenPurpose::Session, &session), Some(3));
        assert_eq!(tokens.verify_reset_token(&session), None);

        let reset = tokens.issue_reset_token(3).unwrap();
        assert_eq!(tokens.verify(TokenPurpose::Session, &reset), None);
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = service().issue_reset_token(5).unwrap();
        let other = TokenService::new("a-completely-different-secret-key", RESET_TOKEN_TTL_SECS);
        assert_eq!(other.verify_reset_token(&token), None);
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service();
        assert_eq!(tokens.verify_reset_token(""), None);
        assert_eq!(tokens.verify_reset_token("not.a.token"), None);
    }
}
