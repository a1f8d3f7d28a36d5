//! Ingredient models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ingredient from the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Query parameters for ingredient listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}
