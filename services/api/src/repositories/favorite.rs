//! Favorite repository

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

/// Favorite repository for database operations
#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    /// Create a new favorite repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mark a recipe as favorite; `false` if it already was
    pub async fn add(&self, user_id: i64, recipe_id: i64) -> Result<bool> {
        info!("User {} favorites recipe {}", user_id, recipe_id);

        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Unmark a favorite; `false` if it was not marked
    pub async fn remove(&self, user_id: i64, recipe_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
