//! Ingredient catalogue repository

use anyhow::Result;
use sqlx::PgPool;

use crate::models::ingredient::Ingredient;

/// Escape LIKE wildcards in `prefix` and append `%`
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ingredient repository for database operations
#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

impl IngredientRepository {
    /// Create a new ingredient repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ingredients by name, optionally those whose name starts with `prefix`
    /// (case-insensitive)
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        let ingredients = match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => {
                sqlx::query_as::<_, Ingredient>(
                    r#"
                    SELECT id, name, measurement_unit FROM ingredients
                    WHERE LOWER(name) LIKE LOWER($1)
                    ORDER BY name, id
                    "#,
                )
                .bind(like_prefix(prefix))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Ingredient>(
                    "SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(ingredients)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// First id of `ids`, in order, that names no ingredient
    pub async fn first_missing(&self, ids: &[i64]) -> Result<Option<i64>> {
        let missing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::BIGINT[]) WITH ORDINALITY AS wanted(id, position)
            LEFT JOIN ingredients i ON i.id = wanted.id
            WHERE i.id IS NULL
            ORDER BY wanted.position
            LIMIT 1
            "#,
        )
        .bind(ids)
        .fetch_optional(&self.pool)
        .await?;

        Ok(missing)
    }
}
