//! Tag models

use serde::Serialize;
use sqlx::FromRow;

/// Recipe tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}
