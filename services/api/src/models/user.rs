//! User models and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::recipe::RecipeShort;

/// User entity as stored
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// Public user profile
///
/// `is_subscribed` is relative to whoever made the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserResponse {
    /// Profile of a user as seen by somebody not subscribed to them
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed: false,
        }
    }
}

/// Request for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Request for a password change
#[derive(Debug, Clone, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub current_password: String,
}

/// Request for token issuance
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for token issuance
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Author profile with their recipes, as shown to a subscriber
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

/// Query parameters for user listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query parameters for subscription endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Maximum number of recipes embedded per author
    pub recipes_limit: Option<i64>,
}
