//! Request extractors

use axum::{
    Json,
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{error::ApiError, messages, middleware::AuthUser};

/// The authenticated requester; 401 for anonymous requests
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

/// The requester, if authenticated
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// JSON body whose rejections use the API error envelope
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Payload(value))
    }
}

/// Path parameters; anything that does not parse addresses no resource
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extracted = axum::extract::Path::<T>::from_request_parts(parts, state).await;
        match extracted {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(rejection) => {
                debug!("Unparsable path parameter in {}: {}", parts.uri.path(), rejection.body_text());
                Err(ApiError::NotFound(messages::NOT_FOUND))
            }
        }
    }
}

/// Query string, repeated keys allowed (`?tags=a&tags=b`)
///
/// A `page` that is not a number is an invalid page; other parse failures
/// are reported as validation errors.
#[derive(Debug, Clone)]
pub struct Query<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extracted = axum_extra::extract::Query::<T>::from_request_parts(parts, state).await;
        match extracted {
            Ok(axum_extra::extract::Query(value)) => Ok(Query(value)),
            Err(_) if has_malformed_page(parts.uri.query().unwrap_or_default()) => {
                Err(ApiError::NotFound(messages::INVALID_PAGE))
            }
            Err(rejection) => Err(ApiError::validation(
                "non_field_errors",
                rejection.to_string(),
            )),
        }
    }
}

fn has_malformed_page(query: &str) -> bool {
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .any(|(key, value)| key == "page" && value.parse::<u32>().is_err())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_page_detection() {
        assert!(has_malformed_page("page=abc"));
        assert!(has_malformed_page("tags=lunch&page=-1"));
        assert!(has_malformed_page("page"));
        assert!(!has_malformed_page("page=2&limit=x"));
        assert!(!has_malformed_page(""));
    }
}
