//! Shopping cart repository
//!
//! Each user owns at most one cart, created on first use.

use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::shopping_list::CartIngredientRow;

/// Id of the user's cart, creating it if needed
async fn cart_id(conn: &mut PgConnection, user_id: i64) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO shopping_carts (user_id) VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Shopping cart repository for database operations
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    /// Create a new cart repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Put a recipe in the user's cart; `false` if it was already there
    pub async fn add(&self, user_id: i64, recipe_id: i64) -> Result<bool> {
        info!("User {} adds recipe {} to cart", user_id, recipe_id);

        let mut tx = self.pool.begin().await?;
        let cart = cart_id(&mut tx, user_id).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO shopping_cart_recipes (cart_id, recipe_id) VALUES ($1, $2)
            ON CONFLICT (cart_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(cart)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    /// Take a recipe out of the user's cart; `false` if it was not there
    pub async fn remove(&self, user_id: i64, recipe_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let cart = cart_id(&mut tx, user_id).await?;

        let result =
            sqlx::query("DELETE FROM shopping_cart_recipes WHERE cart_id = $1 AND recipe_id = $2")
                .bind(cart)
                .bind(recipe_id)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    /// Every ingredient line of every recipe in the user's cart
    pub async fn ingredient_rows(&self, user_id: i64) -> Result<Vec<CartIngredientRow>> {
        let mut tx = self.pool.begin().await?;
        let cart = cart_id(&mut tx, user_id).await?;

        let rows = sqlx::query_as::<_, CartIngredientRow>(
            r#"
            SELECT i.name, i.measurement_unit, ri.amount
            FROM shopping_cart_recipes scr
            JOIN recipe_ingredients ri ON ri.recipe_id = scr.recipe_id
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE scr.cart_id = $1
            "#,
        )
        .bind(cart)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rows)
    }
}
