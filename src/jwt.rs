//! JWT-backed token verifier.
//!
//! A ready-made [`TokenVerifier`] over `jsonwebtoken` for deployments whose
//! identity provider issues signed bearer tokens with the subject id in the
//! `sub` claim. Every decode failure maps to the same opaque error.

use crate::error::StoreError;
use crate::store::TokenVerifier;
use crate::types::UserId;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::fmt;

/// Standard claims shape: subject id plus expiry.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StandardClaims {
    /// Subject (user) identifier.
    pub sub: String,
    /// Expiration timestamp, seconds since the epoch.
    pub exp: usize,
}

/// Token verifier validating JWTs against a decoding key.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("decoding_key", &"<redacted>")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    /// Creates a verifier with explicit key and validation settings.
    pub fn new(decoding_key: DecodingKey, validation: Validation) -> Self {
        Self {
            decoding_key,
            validation,
        }
    }

    /// Creates an HS256 verifier from a shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        Self::new(
            DecodingKey::from_secret(secret),
            Validation::new(Algorithm::HS256),
        )
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify_token(&self, token: &str) -> std::result::Result<UserId, StoreError> {
        let data = decode::<StandardClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| StoreError::from("invalid token"))?;
        UserId::new(&data.claims.sub).map_err(|_| "invalid token".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test-secret";

    #[derive(serde::Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn token_for(sub: &str, secret: &[u8]) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs() as usize
            + 3_600;
        encode(
            &Header::default(),
            &TestClaims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret),
        )
        .expect("encode token")
    }

    #[test]
    fn verify_should_return_subject_for_valid_token() {
        let verifier = JwtVerifier::hs256(SECRET);
        let token = token_for("user_1", SECRET);

        let id = block_on(verifier.verify_token(&token)).unwrap();
        assert_eq!(id.as_str(), "user_1");
    }

    #[test]
    fn verify_should_reject_wrong_secret() {
        let verifier = JwtVerifier::hs256(SECRET);
        let token = token_for("user_1", b"other-secret");

        assert!(block_on(verifier.verify_token(&token)).is_err());
    }

    #[test]
    fn verify_should_reject_garbage_token() {
        let verifier = JwtVerifier::hs256(SECRET);
        assert!(block_on(verifier.verify_token("not-a-jwt")).is_err());
    }

    #[test]
    fn verify_should_reject_invalid_subject() {
        let verifier = JwtVerifier::hs256(SECRET);
        let token = token_for("   ", SECRET);

        assert!(block_on(verifier.verify_token(&token)).is_err());
    }
}
