//! Snapshot cache in front of the active-listing fetch

use anyhow::Result;
use catalog::{CatalogResult, Listing, ListingSource, TitleMatch};
use common::cache::RedisPool;
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::{debug, warn};
use uuid::Uuid;

const ACTIVE_LISTINGS_KEY: &str = "listings:active";

/// Key-value store holding serialized snapshots
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

impl SnapshotStore for RedisPool {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        RedisPool::get(self, key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        RedisPool::set(self, key, value, Some(ttl_seconds)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        RedisPool::delete(self, key).await
    }
}

/// Listing source serving `fetch_active_listings` from a short-lived snapshot
///
/// Store failures are logged and bypassed; the inner source stays the
/// authority. A TTL of zero disables caching.
///
/// Every invalidation bumps a generation counter. A fetch only writes its
/// snapshot back when no invalidation happened while it was reading, so a
/// slow reader cannot resurrect listings a mutation removed.
#[derive(Clone)]
pub struct CachedListings<S, C> {
    inner: S,
    cache: C,
    ttl_seconds: u64,
    generation: Arc<AtomicU64>,
}

impl<S: ListingSource, C: SnapshotStore> CachedListings<S, C> {
    pub fn new(inner: S, cache: C, ttl_seconds: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_seconds,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Drop the snapshot after a listing mutation
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.drop_snapshot().await;
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    async fn drop_snapshot(&self) {
        if let Err(e) = self.cache.delete(ACTIVE_LISTINGS_KEY).await {
            warn!("Failed to invalidate listings snapshot: {}", e);
        }
    }

    async fn cached(&self) -> Option<Vec<Listing>> {
        match self.cache.get(ACTIVE_LISTINGS_KEY).await {
            Ok(Some(snapshot)) => match serde_json::from_str(&snapshot) {
                Ok(listings) => Some(listings),
                Err(e) => {
                    warn!("Discarding unreadable listings snapshot: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Listings cache unavailable: {}", e);
                None
            }
        }
    }

    /// Write `listings` back unless an invalidation superseded `generation`
    async fn store(&self, listings: &[Listing], generation: u64) {
        if self.generation() != generation {
            debug!("Skipping stale listings snapshot");
            return;
        }

        let snapshot = match serde_json::to_string(listings) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to serialize listings snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set(ACTIVE_LISTINGS_KEY, &snapshot, self.ttl_seconds)
            .await
        {
            warn!("Failed to store listings snapshot: {}", e);
            return;
        }

        // An invalidation may have landed between the check and the write.
        if self.generation() != generation {
            self.drop_snapshot().await;
        }
    }
}

impl<S: ListingSource, C: SnapshotStore> ListingSource for CachedListings<S, C> {
    async fn fetch_active_listings(&self) -> CatalogResult<Vec<Listing>> {
        if self.ttl_seconds == 0 {
            return self.inner.fetch_active_listings().await;
        }

        if let Some(listings) = self.cached().await {
            debug!("Serving {} listings from snapshot", listings.len());
            return Ok(listings);
        }

        let generation = self.generation();
        let listings = self.inner.fetch_active_listings().await?;
        self.store(&listings, generation).await;
        Ok(listings)
    }

    async fn fetch_listing_by_id(&self, id: Uuid) -> CatalogResult<Option<Listing>> {
        self.inner.fetch_listing_by_id(id).await
    }

    async fn search_titles(&self, term: &str, limit: usize) -> CatalogResult<Vec<TitleMatch>> {
        self.inner.search_titles(term, limit).await
    }
}
