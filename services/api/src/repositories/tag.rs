//! Tag repository

use anyhow::Result;
use sqlx::PgPool;

use crate::models::tag::Tag;

/// Tag repository for database operations
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    /// Create a new tag repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All tags, by id
    pub async fn list(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// First id of `ids`, in order, that names no tag
    pub async fn first_missing(&self, ids: &[i64]) -> Result<Option<i64>> {
        let missing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::BIGINT[]) WITH ORDINALITY AS wanted(id, position)
            LEFT JOIN tags t ON t.id = wanted.id
            WHERE t.id IS NULL
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
