//! API models for request and response payloads

pub mod ingredient;
pub mod pagination;
pub mod recipe;
pub mod tag;
pub mod user;

/// Interpret a `0`/`1` style query flag
pub fn query_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("True"))
}
