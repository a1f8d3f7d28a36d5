//! Error type for the API service
//!
//! Every handler returns [`ApiResult`]; the variants map onto the HTTP
//! statuses and JSON envelopes clients expect.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::InfraError;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

use crate::messages;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// A payload field failed validation
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A domain rule rejected the request (duplicate favorite, self-subscribe, ...)
    #[error("{0}")]
    Rule(String),

    /// The addressed resource does not exist
    #[error("{0}")]
    NotFound(&'static str),

    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed to touch the resource
    #[error("Forbidden")]
    Forbidden,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// PostgreSQL or Redis failure
    #[error("Infrastructure error: {0}")]
    Infra(#[from] InfraError),
}

impl ApiError {
    /// Field-level validation failure
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Domain-rule violation reported in the `errors` envelope
    pub fn rule(message: impl Into<String>) -> Self {
        ApiError::Rule(message.into())
    }
}

/// Log a repository failure and turn it into a 500
///
/// ```ignore
/// state.recipe_repository.delete(id).await.map_err(internal("delete recipe"))?;
/// ```
pub fn internal(action: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
    move |e| {
        error!("Failed to {}: {:#}", action, e);
        ApiError::InternalServerError
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("non_field_errors", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, Value) = match self {
            ApiError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, json!({ field: [message] }))
            }
            ApiError::Rule(message) => (StatusCode::BAD_REQUEST, json!({ "errors": message })),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "detail": message })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": messages::NOT_AUTHENTICATED }),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "detail": messages::PERMISSION_DENIED }),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "detail": messages::INTERNAL_ERROR }),
            ),
            ApiError::Infra(e) => {
                error!("Infrastructure failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": messages::INTERNAL_ERROR }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
