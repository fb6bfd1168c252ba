use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::config::JwtConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and verifies HS256 tokens signed with the shared secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_seconds: i64,
}

impl JwtService {
    pub fn new(secret: &Secret<String>, expiry_seconds: i64) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            validation,
            expiry_seconds,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret, config.expiry_seconds)
    }

    pub fn expires_in(&self) -> i64 {
        self.expiry_seconds
    }

    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let claims = Claims {
            username: username.to_string(),
            exp: Utc::now().timestamp() + self.expiry_seconds,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(expiry_seconds: i64) -> JwtService {
        JwtService::new(&Secret::new("secret".to_string()), expiry_seconds)
    }

    #[test]
    fn issued_token_validates_to_username() {
        let jwt = service(3600);
        let token = jwt.issue("alice").unwrap();
        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service(-5);
        let token = jwt.issue("alice").unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = JwtService::new(&Secret::new("other".to_string()), 3600)
            .issue("alice")
            .unwrap();
        assert!(service(3600).validate(&token).is_err());
        assert!(service(3600).validate("not.a.token").is_err());
    }
}
