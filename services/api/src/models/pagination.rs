//! Page-number pagination
//!
//! Responses carry `count`, `next`, `previous` and `results`. Links are
//! relative to the request: same path and query, with `page` replaced.

use axum::http::Uri;
use serde::Serialize;

use crate::{
    error::{ApiError, ApiResult},
    messages,
};

/// Page requested by the caller, already clamped to the configured bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Resolve `page`/`limit` query values against the configured sizes
    pub fn new(page: Option<u32>, limit: Option<u32>, default_size: u32, max_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_size).clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

/// One page of results
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap a page of results
    ///
    /// Any page past the first must contain results; otherwise the page
    /// number is out of range and the request is a 404.
    pub fn new(results: Vec<T>, count: i64, request: PageRequest, uri: &Uri) -> ApiResult<Self> {
        if request.page > 1 && results.is_empty() {
            return Err(ApiError::NotFound(messages::INVALID_PAGE));
        }

        let has_next = request.offset() + (results.len() as i64) < count;
        let next = has_next.then(|| page_link(uri, request.page + 1));
        let previous = (request.page > 1).then(|| page_link(uri, request.page - 1));

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

/// Link to `page` of the current request; page 1 drops the parameter
pub fn page_link(uri: &Uri, page: u32) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();

    if page > 1 {
        params.push(format!("page={page}"));
    }

    if params.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), params.join("&"))
    }
}
