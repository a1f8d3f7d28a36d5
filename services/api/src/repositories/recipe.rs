//! Recipe repository
//!
//! Reads take the requesting user explicitly; `is_favorited` and
//! `is_in_shopping_cart` are computed against it in SQL.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::info;

use crate::models::{
    pagination::PageRequest,
    recipe::{RecipeFilter, RecipeIngredient, RecipeResponse, RecipeRow, RecipeShort, RecipeWriteRequest},
    tag::Tag,
};

/// Recipe columns of `recipes r`, with flags relative to `viewer.id`
const RECIPE_COLUMNS: &str = r#"
    r.id, r.author_id, r.name, r.text, r.image, r.cooking_time,
    EXISTS (
        SELECT 1 FROM favorites f
        WHERE f.recipe_id = r.id AND f.user_id = viewer.id
    ) AS is_favorited,
    EXISTS (
        SELECT 1 FROM shopping_cart_recipes scr
        JOIN shopping_carts sc ON sc.id = scr.cart_id
        WHERE scr.recipe_id = r.id AND sc.user_id = viewer.id
    ) AS is_in_shopping_cart
"#;

#[derive(FromRow)]
struct RecipeTagRow {
    recipe_id: i64,
    #[sqlx(flatten)]
    tag: Tag,
}

#[derive(FromRow)]
struct RecipeIngredientRow {
    recipe_id: i64,
    #[sqlx(flatten)]
    ingredient: RecipeIngredient,
}

/// Who owns a recipe and which image it references
#[derive(Debug, Clone, FromRow)]
pub struct RecipeOwnership {
    pub author_id: Option<i64>,
    pub image: String,
}

/// Insert the tag and ingredient links of a recipe
async fn insert_associations(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    payload: &RecipeWriteRequest,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1, tag_id FROM UNNEST($2::BIGINT[]) AS t(tag_id)
        "#,
    )
    .bind(recipe_id)
    .bind(&payload.tags)
    .execute(&mut **tx)
    .await?;

    let (ingredient_ids, amounts): (Vec<i64>, Vec<i32>) = payload
        .ingredients
        .iter()
        .map(|line| (line.id, line.amount))
        .unzip();

    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        SELECT $1, ingredient_id, amount
        FROM UNNEST($2::BIGINT[], $3::INT[]) AS t(ingredient_id, amount)
        "#,
    )
    .bind(recipe_id)
    .bind(&ingredient_ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Recipe repository for database operations
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of recipes matching `filter`, newest first, with the total
    /// number of matches
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<(Vec<RecipeResponse>, i64)> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(RECIPE_COLUMNS);
        query.push(", COUNT(*) OVER () AS total FROM recipes r CROSS JOIN (SELECT ");
        query.push_bind(viewer);
        query.push("::BIGINT AS id) AS viewer WHERE TRUE");

        if let Some(author) = filter.author {
            query.push(" AND r.author_id = ").push_bind(author);
        }
        if !filter.tags.is_empty() {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
                     WHERE rt.recipe_id = r.id AND t.slug = ANY(",
                )
                .push_bind(filter.tags.clone())
                .push("))");
        }
        if filter.favorited_only {
            query.push(
                " AND EXISTS (SELECT 1 FROM favorites f \
                 WHERE f.recipe_id = r.id AND f.user_id = viewer.id)",
            );
        }
        if filter.in_cart_only {
            query.push(
                " AND EXISTS (SELECT 1 FROM shopping_cart_recipes scr \
                 JOIN shopping_carts sc ON sc.id = scr.cart_id \
                 WHERE scr.recipe_id = r.id AND sc.user_id = viewer.id)",
            );
        }

        query
            .push(" ORDER BY r.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build_query_as::<RecipeRow>().fetch_all(&self.pool).await?;

        let count = rows.first().map_or(0, |row| row.total);

        let recipes = self.hydrate(rows, viewer).await?;
        Ok((recipes, count))
    }

    /// Full projection of one recipe
    pub async fn get(&self, id: i64, viewer: Option<i64>) -> Result<Option<RecipeResponse>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r \
             CROSS JOIN (SELECT $1::BIGINT AS id) AS viewer WHERE r.id = $2"
        ))
        .bind(viewer)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![row], viewer).await?.pop())
    }

    /// Attach tags, ingredients and author profiles to recipe rows
    async fn hydrate(&self, rows: Vec<RecipeRow>, viewer: Option<i64>) -> Result<Vec<RecipeResponse>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut author_ids: Vec<i64> = rows.iter().filter_map(|row| row.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let tag_rows = sqlx::query_as::<_, RecipeTagRow>(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let ingredient_rows = sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let authors = super::fetch_profiles(&self.pool, &author_ids, viewer).await?;

        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.recipe_id).or_default().push(row.tag);
        }

        let mut ingredients: HashMap<i64, Vec<RecipeIngredient>> = HashMap::new();
        for row in ingredient_rows {
            ingredients.entry(row.recipe_id).or_default().push(row.ingredient);
        }

        let authors: HashMap<i64, _> = authors.into_iter().map(|a| (a.id, a)).collect();

        Ok(rows
            .into_iter()
            .map(|row| RecipeResponse {
                id: row.id,
                tags: tags.remove(&row.id).unwrap_or_default(),
                author: row.author_id.and_then(|id| authors.get(&id).cloned()),
                ingredients: ingredients.remove(&row.id).unwrap_or_default(),
                is_favorited: row.is_favorited,
                is_in_shopping_cart: row.is_in_shopping_cart,
                name: row.name,
                image: row.image,
                text: row.text,
                cooking_time: row.cooking_time,
            })
            .collect())
    }

    /// Author and image of a recipe
    pub async fn ownership(&self, id: i64) -> Result<Option<RecipeOwnership>> {
        let ownership = sqlx::query_as::<_, RecipeOwnership>(
            "SELECT author_id, image FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ownership)
    }

    /// Create a recipe with its tags and ingredient lines
    pub async fn create(
        &self,
        author_id: i64,
        payload: &RecipeWriteRequest,
        image_url: &str,
    ) -> Result<i64> {
        info!("Creating recipe '{}' for user {}", payload.name, author_id);

        let mut tx = self.pool.begin().await?;

        let recipe_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(&payload.name)
        .bind(&payload.text)
        .bind(image_url)
        .bind(payload.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        insert_associations(&mut tx, recipe_id, payload).await?;

        tx.commit().await?;
        Ok(recipe_id)
    }

    /// Replace a recipe's fields, tags and ingredient lines; `false` if the
    /// recipe is gone
    pub async fn update(&self, id: i64, payload: &RecipeWriteRequest, image_url: &str) -> Result<bool> {
        info!("Updating recipe {}", id);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET name = $2, text = $3, image = $4, cooking_time = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.text)
        .bind(image_url)
        .bind(payload.cooking_time)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_associations(&mut tx, id, payload).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Delete a recipe, returning the image it referenced
    pub async fn delete(&self, id: i64) -> Result<Option<String>> {
        info!("Deleting recipe {}", id);

        let image: Option<String> = sqlx::query_scalar("DELETE FROM recipes WHERE id = $1 RETURNING image")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }

    pub async fn short(&self, id: i64) -> Result<Option<RecipeShort>> {
        let recipe = sqlx::query_as::<_, RecipeShort>(
            "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }

    /// An author's recipes, newest first, at most `limit` of them
    pub async fn short_by_author(&self, author_id: i64, limit: Option<i64>) -> Result<Vec<RecipeShort>> {
        let recipes = sqlx::query_as::<_, RecipeShort>(
            r#"
            SELECT id, name, image, cooking_time FROM recipes
            WHERE author_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
