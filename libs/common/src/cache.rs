//! Redis cache module for the Foodgram backend
//!
//! The services keep short-lived keys here (revoked access tokens). Every
//! key is written with a TTL so the store never grows without bound.

use crate::error::InfraResult;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

/// Where the revocation store lives
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://host:port[/db]`
    pub url: String,
}

impl RedisConfig {
    /// Read `REDIS_URL`, falling back to `redis://localhost:6379`
    pub fn from_env() -> InfraResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

/// Handle to a Redis server
///
/// Opening the handle does not connect; connections are made per command.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Create a new Redis handle from configuration
    pub fn new(config: &RedisConfig) -> InfraResult<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis handle ready for {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> InfraResult<MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key that expires after `ttl_seconds`
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> InfraResult<()> {
        let mut conn = self.get_connection().await?;
        // Redis rejects SETEX with a zero TTL
        let ttl = ttl_seconds.max(1);
        let _: () = conn.set_ex(key, value, ttl).await?;
        Ok(())
    }

    /// Check whether a key is present
    pub async fn exists(&self, key: &str) -> InfraResult<bool> {
        let mut conn = self.get_connection().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    /// Remove a key
    pub async fn delete(&self, key: &str) -> InfraResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// `PING` the server
    pub async fn health_check(&self) -> InfraResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
