//! User profiles, registration and subscriptions

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, internal},
    extract::{CurrentUser, MaybeUser, Path, Payload, Query},
    messages,
    models::{
        pagination::Page,
        user::{
            CreateUserRequest, SetPasswordRequest, SubscriptionQuery, SubscriptionResponse,
            UserListQuery, UserResponse,
        },
    },
    repositories::unique_user_field,
    state::AppState,
    validation::{validate_new_user, validate_password},
};

/// Attach an author's newest recipes and their recipe count
async fn with_recipes(
    state: &AppState,
    author: UserResponse,
    recipes_limit: Option<i64>,
) -> ApiResult<SubscriptionResponse> {
    // Negative limits are ignored rather than rejected
    let limit = recipes_limit.filter(|limit| *limit >= 0);

    let recipes = state
        .recipe_repository
        .short_by_author(author.id, limit)
        .await
        .map_err(internal("load author recipes"))?;
    let recipes_count = state
        .recipe_repository
        .count_by_author(author.id)
        .await
        .map_err(internal("count author recipes"))?;

    Ok(SubscriptionResponse {
        author,
        recipes,
        recipes_count,
    })
}

/// Get all users, newest first
pub async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Page<UserResponse>>> {
    let page = state.page_request(query.page, query.limit);

    let (users, count) = state
        .user_repository
        .list_profiles(viewer.id(), page)
        .await
        .map_err(internal("list users"))?;

    Ok(Json(Page::new(users, count, page, &uri)?))
}

fn field_taken(field: &str) -> ApiError {
    match field {
        "email" => ApiError::validation("email", messages::EMAIL_TAKEN),
        _ => ApiError::validation("username", messages::USERNAME_TAKEN),
    }
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    Payload(payload): Payload<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    validate_new_user(&payload)?;

    let conflict = state
        .user_repository
        .find_conflict(&payload.email, &payload.username)
        .await
        .map_err(internal("check user uniqueness"))?;
    if let Some(field) = conflict {
        return Err(field_taken(field));
    }

    let user = state
        .user_repository
        .create(&payload)
        .await
        .map_err(|e| match unique_user_field(&e) {
            Some(field) => field_taken(field),
            None => internal("create user")(e),
        })?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_repository
        .profile(id, viewer.id())
        .await
        .map_err(internal("get user"))?
        .ok_or(ApiError::NotFound(messages::USER_NOT_FOUND))?;

    Ok(Json(user))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserResponse>> {
    let profile = state
        .user_repository
        .profile(user.id, Some(user.id))
        .await
        .map_err(internal("get current user"))?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(profile))
}

/// Change the authenticated user's password
pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(payload): Payload<SetPasswordRequest>,
) -> ApiResult<StatusCode> {
    validate_password("new_password", &payload.new_password)?;

    let account = state
        .user_repository
        .find_by_id(user.id)
        .await
        .map_err(internal("get current user"))?
        .ok_or(ApiError::Unauthorized)?;

    let valid = state
        .user_repository
        .verify_password(&account, &payload.current_password)
        .map_err(internal("verify password"))?;
    if !valid {
        return Err(ApiError::validation(
            "current_password",
            messages::INVALID_PASSWORD,
        ));
    }

    state
        .user_repository
        .set_password(user.id, &payload.new_password)
        .await
        .map_err(internal("set password"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Authors the caller follows, each with their newest recipes
pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<Page<SubscriptionResponse>>> {
    let page = state.page_request(query.page, query.limit);

    let (authors, count) = state
        .subscription_repository
        .authors(user.id, page)
        .await
        .map_err(internal("list subscriptions"))?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(with_recipes(&state, author, query.recipes_limit).await?);
    }

    Ok(Json(Page::new(results, count, page, &uri)?))
}

/// Follow an author
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<i64>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let mut author = state
        .user_repository
        .profile(author_id, Some(user.id))
        .await
        .map_err(internal("get author"))?
        .ok_or(ApiError::NotFound(messages::USER_NOT_FOUND))?;

    if author.id == user.id {
        return Err(ApiError::rule(messages::SUBSCRIBE_TO_YOURSELF));
    }

    let created = state
        .subscription_repository
        .subscribe(user.id, author.id)
        .await
        .map_err(internal("subscribe"))?;
    if !created {
        return Err(ApiError::rule(messages::SUBSCRIBE_TWICE));
    }

    author.is_subscribed = true;
    let response = with_recipes(&state, author, query.recipes_limit).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Stop following an author
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .user_repository
        .find_by_id(author_id)
        .await
        .map_err(internal("get author"))?
        .ok_or(ApiError::NotFound(messages::USER_NOT_FOUND))?;

    let removed = state
        .subscription_repository
        .unsubscribe(user.id, author_id)
        .await
        .map_err(internal("unsubscribe"))?;
    if !removed {
        return Err(ApiError::rule(messages::UNSUBSCRIBE_NOT_SUBSCRIBED));
    }

    info!("User {} unsubscribed from {}", user.id, author_id);
    Ok(StatusCode::NO_CONTENT)
}
