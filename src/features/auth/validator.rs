use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Issues and verifies the first-party HS256 bearer tokens.
///
/// Verification covers signature and expiry only; the middleware loads the
/// principal from the database afterwards.
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: config.token_ttl,
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    /// Issue a signed token for the given user id
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.token_ttl.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate signature and expiry, returning the subject user id
    pub fn validate_token(&self, token: &str) -> Result<Uuid, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(format!("Not authorized, token failed: {}", e)))?;

        Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AppError::Auth("Not authorized, token failed: invalid subject".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(ttl_secs: u64) -> JwtValidator {
        JwtValidator::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl: Duration::from_secs(ttl_secs),
            jwt_leeway: Duration::from_secs(0),
        })
    }

    #[test]
    fn token_round_trip_returns_subject() {
        let validator = validator(3600);
        let user_id = Uuid::new_v4();

        let token = validator.issue_token(user_id).unwrap();
        assert_eq!(validator.validate_token(&token).unwrap(), user_id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let validator = validator(3600);
        let token = validator.issue_token(Uuid::new_v4()).unwrap();

        let other = JwtValidator::new(&AuthConfig {
            jwt_secret: "other-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_leeway: Duration::from_secs(0),
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // TTL of zero means the token is already at its expiry instant
        let validator = validator(0);
        let token = validator.issue_token(Uuid::new_v4()).unwrap();

        // jsonwebtoken treats exp <= now as expired with zero leeway
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(matches!(
            validator.validate_token(&token),
            Err(AppError::Auth(_))
        ));
    }
}
