//! Infrastructure error types shared by the Foodgram services

use redis::RedisError;
use sqlx::{Error as SqlxError, migrate::MigrateError};
use thiserror::Error;

/// Failures raised while talking to PostgreSQL or Redis
#[derive(Error, Debug)]
pub enum InfraError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred while applying schema migrations
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),

    /// Invalid connection settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Redis command or connection failure
    #[error("Cache error: {0}")]
    Cache(#[from] RedisError),
}

/// Type alias for Result with InfraError
pub type InfraResult<T> = Result<T, InfraError>;
