//! Auth token service
//!
//! Tokens are HS256 JWTs. Each carries a random `jti`; logging out stores
//! that id in Redis until the token would have expired anyway.

use anyhow::Result;
use chrono::Utc;
use common::{cache::RedisPool, error::InfraResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID, as a decimal string
    pub sub: String,
    /// Token ID, the revocation key
    pub jti: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: u64,
}

impl Claims {
    /// The user the token was issued to
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(secret: &str, token_ttl: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    /// Issue a token for a user
    pub fn issue_token(&self, user_id: i64) -> Result<String> {
        let now = Utc::now().timestamp().max(0) as u64;

        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.token_ttl,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Check if a token has been revoked
    pub async fn is_token_revoked(&self, redis_pool: &RedisPool, claims: &Claims) -> InfraResult<bool> {
        redis_pool.exists(&revocation_key(claims)).await
    }

    /// Revoke a token for the rest of its lifetime
    pub async fn revoke_token(&self, redis_pool: &RedisPool, claims: &Claims) -> InfraResult<()> {
        let remaining = claims
            .exp
            .saturating_sub(Utc::now().timestamp().max(0) as u64);
        redis_pool
            .set_with_ttl(&revocation_key(claims), "1", remaining)
            .await
    }
}

fn revocation_key(claims: &Claims) -> String {
    format!("revoked_token:{}", claims.jti)
}
