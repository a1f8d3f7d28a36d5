use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
};
use foodgram_api::{AppState, MIGRATOR, config::Settings, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Foodgram API service");

    let settings = Settings::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;
    if !redis_pool.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    tokio::fs::create_dir_all(&settings.media_root).await?;

    let listen_addr = settings.listen_addr.clone();
    let app = create_router(AppState::new(settings, pool, redis_pool));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Foodgram API listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
