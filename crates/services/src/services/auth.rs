use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Failed to issue token")]
    TokenCreation,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Failed to hash password")]
    HashingFailed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: i64,
}

/// Issues and verifies the bearer tokens used by every protected route.
#[derive(Clone)]
pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_token(&self, user_id: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthError::TokenCreation)
    }

    /// Returns the user id the token was issued for.
    pub fn verify_token(&self, token: &str) -> Result<i64, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(data.claims.sub)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|_| AuthError::HashingFailed)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_user_id() {
        let auth = AuthService::new("test-secret");
        let token = auth.issue_token(42).unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), 42);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let auth = AuthService::new("test-secret");
        let other = AuthService::new("different-secret");
        let token = other.issue_token(42).unwrap();
        assert!(matches!(
            auth.verify_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let auth = AuthService::new("test-secret");
        assert!(auth.verify_token("not-a-token").is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
