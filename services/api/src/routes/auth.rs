//! Token issuance and revocation

use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, internal},
    extract::{CurrentUser, Payload},
    messages,
    models::user::{LoginRequest, TokenResponse},
    state::AppState,
};

/// Issue a token for valid credentials, unless the account is blocked
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let invalid = || ApiError::validation("non_field_errors", messages::INVALID_CREDENTIALS);

    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(internal("look up user"))?
        .ok_or_else(invalid)?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(internal("verify password"))?;
    if !valid {
        return Err(invalid());
    }

    if user.is_blocked {
        info!("Refused token for blocked user {}", user.id);
        return Err(ApiError::rule(messages::USER_BLOCKED));
    }

    let auth_token = state
        .jwt_service
        .issue_token(user.id)
        .map_err(internal("issue token"))?;

    info!("Issued token for user {}", user.id);
    Ok(Json(TokenResponse { auth_token }))
}

/// Revoke the token the request was made with
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<StatusCode> {
    state
        .jwt_service
        .revoke_token(&state.redis_pool, &user.claims)
        .await?;

    info!("Revoked token {} of user {}", user.claims.jti, user.id);
    Ok(StatusCode::NO_CONTENT)
}
