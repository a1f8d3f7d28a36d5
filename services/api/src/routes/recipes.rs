//! Recipe handlers

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, internal},
    extract::{CurrentUser, MaybeUser, Path, Payload, Query},
    images::{self, DecodedImage},
    messages,
    middleware::AuthUser,
    models::{
        pagination::Page,
        recipe::{RecipeFilter, RecipeQuery, RecipeResponse, RecipeShort, RecipeWriteRequest},
    },
    repositories::recipe::RecipeOwnership,
    state::AppState,
    validation::validate_recipe,
};

/// Run every payload check, including tag and ingredient existence
async fn check_write(state: &AppState, payload: &RecipeWriteRequest) -> ApiResult<DecodedImage> {
    let image = validate_recipe(payload, state.settings.recipe_limits())?;

    let missing_tag = state
        .tag_repository
        .first_missing(&payload.tags)
        .await
        .map_err(internal("check tags"))?;
    if missing_tag.is_some() {
        return Err(ApiError::validation("tags", messages::TAG_DOES_NOT_EXIST));
    }

    let ingredient_ids: Vec<i64> = payload.ingredients.iter().map(|line| line.id).collect();
    let missing_ingredient = state
        .ingredient_repository
        .first_missing(&ingredient_ids)
        .await
        .map_err(internal("check ingredients"))?;
    if missing_ingredient.is_some() {
        return Err(ApiError::validation(
            "ingredients",
            messages::INGREDIENT_DOES_NOT_EXIST,
        ));
    }

    Ok(image)
}

/// Only the author or a superuser may change a recipe
async fn authorize_mutation(state: &AppState, user: &AuthUser, id: i64) -> ApiResult<RecipeOwnership> {
    let ownership = state
        .recipe_repository
        .ownership(id)
        .await
        .map_err(internal("get recipe"))?
        .ok_or(ApiError::NotFound(messages::RECIPE_NOT_FOUND))?;

    if ownership.author_id == Some(user.id) {
        return Ok(ownership);
    }

    let is_superuser = state
        .user_repository
        .is_superuser(user.id)
        .await
        .map_err(internal("check permissions"))?;
    if !is_superuser {
        return Err(ApiError::Forbidden);
    }

    Ok(ownership)
}

async fn load(state: &AppState, id: i64, viewer: Option<i64>) -> ApiResult<RecipeResponse> {
    state
        .recipe_repository
        .get(id, viewer)
        .await
        .map_err(internal("get recipe"))?
        .ok_or(ApiError::NotFound(messages::RECIPE_NOT_FOUND))
}

pub(crate) async fn load_short(state: &AppState, id: i64) -> ApiResult<RecipeShort> {
    state
        .recipe_repository
        .short(id)
        .await
        .map_err(internal("get recipe"))?
        .ok_or(ApiError::NotFound(messages::RECIPE_NOT_FOUND))
}

/// List recipes, newest first
///
/// Filters: `tags` (repeatable slugs, any match), `author`, `is_favorited`,
/// `is_in_shopping_cart`.
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<RecipeQuery>,
) -> ApiResult<Json<Page<RecipeResponse>>> {
    let page = state.page_request(query.page, query.limit);
    let filter = RecipeFilter::from(&query);

    let (recipes, count) = state
        .recipe_repository
        .list(&filter, viewer.id(), page)
        .await
        .map_err(internal("list recipes"))?;

    Ok(Json(Page::new(recipes, count, page, &uri)?))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeResponse>> {
    Ok(Json(load(&state, id, viewer.id()).await?))
}

/// Create a recipe authored by the caller
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(payload): Payload<RecipeWriteRequest>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let image = check_write(&state, &payload).await?;
    let media_root = &state.settings.media_root;

    let image_url = images::store_image(media_root, &image)
        .await
        .map_err(internal("store recipe image"))?;

    let id = match state.recipe_repository.create(user.id, &payload, &image_url).await {
        Ok(id) => id,
        Err(e) => {
            images::remove_image(media_root, &image_url).await;
            return Err(internal("create recipe")(e));
        }
    };

    info!("User {} created recipe {}", user.id, id);
    Ok((StatusCode::CREATED, Json(load(&state, id, Some(user.id)).await?)))
}

/// Replace a recipe; PUT and PATCH both take the full payload
pub async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<RecipeWriteRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    let ownership = authorize_mutation(&state, &user, id).await?;
    let image = check_write(&state, &payload).await?;
    let media_root = &state.settings.media_root;

    let image_url = images::store_image(media_root, &image)
        .await
        .map_err(internal("store recipe image"))?;

    let updated = match state.recipe_repository.update(id, &payload, &image_url).await {
        Ok(updated) => updated,
        Err(e) => {
            images::remove_image(media_root, &image_url).await;
            return Err(internal("update recipe")(e));
        }
    };
    if !updated {
        images::remove_image(media_root, &image_url).await;
        return Err(ApiError::NotFound(messages::RECIPE_NOT_FOUND));
    }

    images::remove_image(media_root, &ownership.image).await;

    info!("User {} updated recipe {}", user.id, id);
    Ok(Json(load(&state, id, Some(user.id)).await?))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    authorize_mutation(&state, &user, id).await?;

    let image = state
        .recipe_repository
        .delete(id)
        .await
        .map_err(internal("delete recipe"))?
        .ok_or(ApiError::NotFound(messages::RECIPE_NOT_FOUND))?;

    images::remove_image(&state.settings.media_root, &image).await;

    info!("User {} deleted recipe {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Add a recipe to the caller's favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShort>)> {
    let recipe = load_short(&state, id).await?;

    let added = state
        .favorite_repository
        .add(user.id, recipe.id)
        .await
        .map_err(internal("add favorite"))?;
    if !added {
        return Err(ApiError::rule(messages::FAVORITE_ALREADY_EXISTS));
    }

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Remove a recipe from the caller's favorites
pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let recipe = load_short(&state, id).await?;

    let removed = state
        .favorite_repository
        .remove(user.id, recipe.id)
        .await
        .map_err(internal("remove favorite"))?;
    if !removed {
        return Err(ApiError::rule(messages::FAVORITE_DOES_NOT_EXIST));
    }

    Ok(StatusCode::NO_CONTENT)
}
