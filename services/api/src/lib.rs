//! Foodgram API service
//!
//! Recipes, tags, ingredients, favorites, subscriptions and shopping carts
//! over PostgreSQL, with token auth backed by Redis.

use sqlx::migrate::Migrator;

pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod jwt;
pub mod messages;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod shopping_list;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;

/// Schema migrations embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
