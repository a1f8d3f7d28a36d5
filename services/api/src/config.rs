//! Service settings
//!
//! Loaded with the `config` crate from `FOODGRAM_*` environment variables
//! layered over built-in defaults.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

use crate::validation::RecipeLimits;

/// Runtime settings for the API service
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Socket address the HTTP listener binds to
    pub listen_addr: String,
    /// Directory uploaded recipe images are written to
    pub media_root: PathBuf,
    /// Page size used when the caller does not pass `limit`
    pub page_size: u32,
    /// Upper bound for a caller-supplied `limit`
    pub max_page_size: u32,
    /// Smallest accepted `cooking_time`, in minutes
    pub cooking_time_min: i32,
    /// Smallest accepted ingredient `amount`
    pub ingredient_amount_min: i32,
    /// HMAC secret for signing auth tokens
    pub jwt_secret: String,
    /// Lifetime of an issued auth token
    pub token_ttl_seconds: u64,
}

impl Settings {
    /// Load settings from the environment
    ///
    /// # Environment Variables
    /// - `FOODGRAM_LISTEN_ADDR` (default: `0.0.0.0:8000`)
    /// - `FOODGRAM_MEDIA_ROOT` (default: `./media`)
    /// - `FOODGRAM_PAGE_SIZE` (default: 6)
    /// - `FOODGRAM_MAX_PAGE_SIZE` (default: 100)
    /// - `FOODGRAM_COOKING_TIME_MIN` (default: 1)
    /// - `FOODGRAM_INGREDIENT_AMOUNT_MIN` (default: 1)
    /// - `FOODGRAM_JWT_SECRET` (required)
    /// - `FOODGRAM_TOKEN_TTL_SECONDS` (default: 86400)
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("listen_addr", "0.0.0.0:8000")?
            .set_default("media_root", "./media")?
            .set_default("page_size", 6_i64)?
            .set_default("max_page_size", 100_i64)?
            .set_default("cooking_time_min", 1_i64)?
            .set_default("ingredient_amount_min", 1_i64)?
            .set_default("token_ttl_seconds", 86_400_i64)?
            .add_source(Environment::with_prefix("FOODGRAM").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "FOODGRAM_JWT_SECRET must not be empty".to_string(),
            ));
        }
        if settings.page_size == 0 || settings.page_size > settings.max_page_size {
            return Err(ConfigError::Message(format!(
                "FOODGRAM_PAGE_SIZE must be between 1 and {}",
                settings.max_page_size
            )));
        }

        for (var, value) in [
            ("FOODGRAM_COOKING_TIME_MIN", settings.cooking_time_min),
            ("FOODGRAM_INGREDIENT_AMOUNT_MIN", settings.ingredient_amount_min),
        ] {
            if value < 1 {
                return Err(ConfigError::Message(format!(
                    "{var} must be at least 1, got {value}"
                )));
            }
        }

        Ok(settings)
    }

    /// Minimum values enforced on recipe writes
    pub fn recipe_limits(&self) -> RecipeLimits {
        RecipeLimits {
            cooking_time_min: self.cooking_time_min,
            ingredient_amount_min: self.ingredient_amount_min,
        }
    }
}
