//! Recipe models and related payloads

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{tag::Tag, user::UserResponse};

/// Recipe columns plus the requester-relative flags
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub author_id: Option<i64>,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    /// Rows matching the list filter, before LIMIT/OFFSET
    #[sqlx(default)]
    pub total: i64,
}

/// Ingredient line of a recipe, with the catalogue name resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RecipeIngredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe projection
#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: Option<UserResponse>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Short recipe projection used by favorites, carts and subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// One `{id, amount}` entry of a recipe write payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i32,
}

/// Recipe create/update payload
///
/// `image` is a base64 data URI.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeWriteRequest {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Query parameters for recipe listing
///
/// `tags` may repeat (`?tags=lunch&tags=dinner`) and matches any of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

/// Filter applied to the recipe list, resolved from [`RecipeQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub favorited_only: bool,
    pub in_cart_only: bool,
}

impl From<&RecipeQuery> for RecipeFilter {
    fn from(query: &RecipeQuery) -> Self {
        Self {
            tags: query
                .tags
                .iter()
                .filter(|slug| !slug.is_empty())
                .cloned()
                .collect(),
            author: query.author,
            favorited_only: super::query_flag(query.is_favorited.as_deref()),
            in_cart_only: super::query_flag(query.is_in_shopping_cart.as_deref()),
        }
    }
}
