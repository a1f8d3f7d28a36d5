//! Shopping cart handlers

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, internal},
    extract::{CurrentUser, Path},
    messages,
    models::recipe::RecipeShort,
    routes::recipes::load_short,
    shopping_list,
    state::AppState,
};

/// Put a recipe in the caller's cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShort>)> {
    let recipe = load_short(&state, id).await?;

    let added = state
        .cart_repository
        .add(user.id, recipe.id)
        .await
        .map_err(internal("add to cart"))?;
    if !added {
        return Err(ApiError::rule(messages::SHOPPING_CART_ALREADY_ADDED));
    }

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Take a recipe out of the caller's cart
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let recipe = load_short(&state, id).await?;

    let removed = state
        .cart_repository
        .remove(user.id, recipe.id)
        .await
        .map_err(internal("remove from cart"))?;
    if !removed {
        return Err(ApiError::rule(messages::SHOPPING_CART_NOT_PRESENT));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Download the aggregated shopping list as a text file
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let rows = state
        .cart_repository
        .ingredient_rows(user.id)
        .await
        .map_err(internal("load shopping cart"))?;
    if rows.is_empty() {
        return Err(ApiError::rule(messages::SHOPPING_LIST_DOES_NOT_EXIST));
    }

    let items = shopping_list::aggregate(rows);
    info!("User {} downloaded a shopping list of {} items", user.id, items.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", shopping_list::FILE_NAME),
            ),
        ],
        shopping_list::render(&items),
    ))
}
