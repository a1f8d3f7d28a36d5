//! Read-only tag and ingredient catalogue

use axum::{
    Json,
    extract::State,
};

use crate::{
    error::{ApiError, ApiResult, internal},
    extract::{Path, Query},
    messages,
    models::{
        ingredient::{Ingredient, IngredientQuery},
        tag::Tag,
    },
    state::AppState,
};

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    let tags = state
        .tag_repository
        .list()
        .await
        .map_err(internal("list tags"))?;

    Ok(Json(tags))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Tag>> {
    let tag = state
        .tag_repository
        .get(id)
        .await
        .map_err(internal("get tag"))?
        .ok_or(ApiError::NotFound(messages::TAG_NOT_FOUND))?;

    Ok(Json(tag))
}

/// List ingredients, optionally narrowed by `?name=<prefix>`
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    let ingredients = state
        .ingredient_repository
        .list(query.name.as_deref())
        .await
        .map_err(internal("list ingredients"))?;

    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Ingredient>> {
    let ingredient = state
        .ingredient_repository
        .get(id)
        .await
        .map_err(internal("get ingredient"))?
        .ok_or(ApiError::NotFound(messages::INGREDIENT_NOT_FOUND))?;

    Ok(Json(ingredient))
}
