//! JWT issuing and verification.
//!
//! A single HS256 access token carries the user id and role. Each token
//! gets a unique `jti`; the session table stores a SHA-256 fingerprint of
//! the issued token so a later login can revoke it.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("failed to sign token")]
    Sign,
    #[error("token is expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    /// `admin` or `student`.
    pub role: String,
    /// Unique token id.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtSigner {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role: role.to_owned(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| JwtError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify() {
        let signer = JwtSigner::new("test-secret", 7);
        let user_id = Uuid::new_v4();
        let token = signer.issue(user_id, "student").unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "student");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = JwtSigner::new("secret-a", 7);
        let other = JwtSigner::new("secret-b", 7);
        let token = signer.issue(Uuid::new_v4(), "admin").unwrap();
        assert!(matches!(other.verify(&token), Err(JwtError::Invalid)));
    }

    #[test]
    fn tokens_carry_unique_ids() {
        let signer = JwtSigner::new("test-secret", 7);
        let user_id = Uuid::new_v4();
        let a = signer.verify(&signer.issue(user_id, "student").unwrap()).unwrap();
        let b = signer.verify(&signer.issue(user_id, "student").unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }
}
