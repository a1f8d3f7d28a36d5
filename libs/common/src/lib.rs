//! Common library for the Foodgram backend
//!
//! This crate provides the infrastructure shared by the Foodgram services:
//! PostgreSQL connectivity and migrations, the Redis client used for token
//! revocation, and the infrastructure error type.

pub mod cache;
pub mod database;
pub mod error;

/// Connecting to both stores the way the services do at start-up
///
/// ```rust,no_run
/// use common::{
///     cache::{RedisConfig, RedisPool},
///     database::{DatabaseConfig, health_check, init_pool},
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = init_pool(&DatabaseConfig::from_env()?).await?;
///     let redis = RedisPool::new(&RedisConfig::from_env()?)?;
///
///     println!("database up: {}", health_check(&pool).await?);
///     println!("redis up: {}", redis.health_check().await?);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
