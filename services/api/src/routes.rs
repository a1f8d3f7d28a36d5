//! API service routes

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{middleware::auth_middleware, state::AppState};

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod recipes;
pub mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/token/login/", post(auth::login))
        .route("/auth/token/logout/", post(auth::logout))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me/", get(users::me))
        .route("/users/set_password/", post(users::set_password))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/:id/", get(users::get_user))
        .route(
            "/users/:id/subscribe/",
            get(users::subscribe).delete(users::unsubscribe),
        )
        .route("/tags/", get(catalog::list_tags))
        .route("/tags/:id/", get(catalog::get_tag))
        .route("/ingredients/", get(catalog::list_ingredients))
        .route("/ingredients/:id/", get(catalog::get_ingredient))
        .route(
            "/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(cart::download_shopping_cart),
        )
        .route(
            "/recipes/:id/",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite/",
            get(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart/",
            get(cart::add_to_cart).delete(cart::remove_from_cart),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let media = ServeDir::new(&state.settings.media_root);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "foodgram-api"
    }))
}
