//! Subscription repository

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::models::{pagination::PageRequest, user::UserResponse};

/// Subscription repository for database operations
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Follow an author; `false` if already following
    pub async fn subscribe(&self, user_id: i64, author_id: i64) -> Result<bool> {
        info!("User {} subscribes to {}", user_id, author_id);

        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Stop following an author; `false` if not following
    pub async fn unsubscribe(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
                .bind(user_id)
                .bind(author_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Authors followed by `user_id`, most recent subscription first
    pub async fn authors(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<UserResponse>, i64)> {
        let authors = sqlx::query_as::<_, UserResponse>(
            r#"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name,
                   TRUE AS is_subscribed
            FROM subscriptions s
            JOIN users u ON u.id = s.author_id
            WHERE s.user_id = $1
            ORDER BY s.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((authors, count))
    }
}
