use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod listing_cache;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool},
    error::DatabaseError,
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::{
    config::ServiceConfig,
    listing_cache::CachedListings,
    middleware::{JwtConfig, JwtVerifier},
    repositories::{ListingRepository, ProfileRepository, WishlistRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting Campus Market API service");

    let config = ServiceConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");

    let redis_config = RedisConfig::from_env()?;
    let redis = RedisPool::new(&redis_config).await?;

    let jwt_config = JwtConfig::from_env().map_err(anyhow::Error::msg)?;
    let jwt_verifier = JwtVerifier::new(&jwt_config)?;

    // Initialize repositories
    let listing_repository = ListingRepository::new(pool.clone());
    let listings = CachedListings::new(
        listing_repository.clone(),
        redis,
        config.listings_cache_ttl_seconds,
    );

    let bind_address = config.bind_address.clone();
    let app_state = AppState {
        db_pool: pool.clone(),
        listing_repository,
        listings,
        profile_repository: ProfileRepository::new(pool.clone()),
        wishlist_repository: WishlistRepository::new(pool),
        jwt_verifier,
        config: Arc::new(config),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("API service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
