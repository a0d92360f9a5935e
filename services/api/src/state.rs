//! Application state shared across handlers

use common::cache::RedisPool;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::ServiceConfig,
    listing_cache::CachedListings,
    middleware::JwtVerifier,
    repositories::{ListingRepository, ProfileRepository, WishlistRepository},
};

/// Read path for listings: the repository behind the Redis snapshot
pub type ListingStore = CachedListings<ListingRepository, RedisPool>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub listing_repository: ListingRepository,
    pub listings: ListingStore,
    pub profile_repository: ProfileRepository,
    pub wishlist_repository: WishlistRepository,
    pub jwt_verifier: JwtVerifier,
    pub config: Arc<ServiceConfig>,
}
