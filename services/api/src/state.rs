//! Application state shared across handlers

use std::sync::Arc;

use common::cache::RedisPool;
use sqlx::PgPool;

use crate::{
    config::Settings,
    jwt::JwtService,
    models::pagination::PageRequest,
    repositories::{
        UserRepository, cart::CartRepository, favorite::FavoriteRepository,
        ingredient::IngredientRepository, recipe::RecipeRepository,
        subscription::SubscriptionRepository, tag::TagRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub tag_repository: TagRepository,
    pub ingredient_repository: IngredientRepository,
    pub recipe_repository: RecipeRepository,
    pub favorite_repository: FavoriteRepository,
    pub subscription_repository: SubscriptionRepository,
    pub cart_repository: CartRepository,
}

impl AppState {
    /// Wire every repository to one pool
    pub fn new(settings: Settings, pool: PgPool, redis_pool: RedisPool) -> Self {
        let jwt_service = JwtService::new(&settings.jwt_secret, settings.token_ttl_seconds);

        Self {
            settings: Arc::new(settings),
            redis_pool,
            jwt_service,
            user_repository: UserRepository::new(pool.clone()),
            tag_repository: TagRepository::new(pool.clone()),
            ingredient_repository: IngredientRepository::new(pool.clone()),
            recipe_repository: RecipeRepository::new(pool.clone()),
            favorite_repository: FavoriteRepository::new(pool.clone()),
            subscription_repository: SubscriptionRepository::new(pool.clone()),
            cart_repository: CartRepository::new(pool),
        }
    }

    /// Resolve `page`/`limit` against the configured page sizes
    pub fn page_request(&self, page: Option<u32>, limit: Option<u32>) -> PageRequest {
        PageRequest::new(
            page,
            limit,
            self.settings.page_size,
            self.settings.max_page_size,
        )
    }
}
