//! Authentication middleware
//!
//! Requests without an `Authorization` header pass through anonymously.
//! A header that is present must carry a valid, unrevoked token.

use axum::{
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{error::ApiError, jwt::Claims, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub claims: Claims,
}

/// Token part of an `Authorization` header value
///
/// Both `Token <jwt>` and `Bearer <jwt>` are accepted.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized
    })?;

    if state
        .jwt_service
        .is_token_revoked(&state.redis_pool, &claims)
        .await?
    {
        return Err(ApiError::Unauthorized);
    }

    let id = claims.user_id().ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(AuthUser { id, claims });

    Ok(next.run(req).await)
}
