use anyhow::{anyhow, Context};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and validates access tokens with the configured HMAC key
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(anyhow!("unsupported token algorithm: {other}")),
        };

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm,
            expiry: Duration::minutes(config.token_expiry_minutes as i64),
        })
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .context("failed to sign access token")
    }

    /// Returns the user id from a valid, unexpired token
    pub fn verify(&self, token: &str) -> Option<i64> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::new(self.algorithm))
            .ok()?
            .claims;
        claims.sub.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config(secret: &str, expiry_minutes: u64) -> AuthConfig {
        AuthConfig {
            secret_key: secret.to_string(),
            algorithm: "HS256".to_string(),
            token_expiry_minutes: expiry_minutes,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = TokenIssuer::new(&auth_config("unit-test-secret-key", 60)).unwrap();
        let token = issuer.issue(42).unwrap();
        assert_eq!(issuer.verify(&token), Some(42));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let issuer = TokenIssuer::new(&auth_config("unit-test-secret-key", 60)).unwrap();
        let other = TokenIssuer::new(&auth_config("a-different-secret-key", 60)).unwrap();
        let token = issuer.issue(42).unwrap();
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new(&auth_config("unit-test-secret-key", 60)).unwrap();

        let now = Utc::now();
        let claims = Claims {
            sub: "42".to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret-key"),
        )
        .unwrap();

        assert_eq!(issuer.verify(&token), None);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let issuer = TokenIssuer::new(&auth_config("unit-test-secret-key", 60)).unwrap();
        assert_eq!(issuer.verify("not.a.token"), None);
        assert_eq!(issuer.verify(""), None);
    }

    #[test]
    fn test_unknown_algorithm_fails_construction() {
        let mut config = auth_config("unit-test-secret-key", 60);
        config.algorithm = "RS256".to_string();
        assert!(TokenIssuer::new(&config).is_err());
    }
}
