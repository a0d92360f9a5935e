//! Listing store collaborator

use std::future::Future;
use uuid::Uuid;

use crate::{
    error::CatalogResult,
    model::{Listing, TitleMatch},
};

/// Read access to the listing store
///
/// Implemented by the database repository and its caching decorator in the
/// API service, and by [`MemorySource`] for in-process use.
pub trait ListingSource: Send + Sync {
    /// Every listing not marked as sold, in no particular order
    fn fetch_active_listings(&self) -> impl Future<Output = CatalogResult<Vec<Listing>>> + Send;

    /// A single listing, sold or not
    fn fetch_listing_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = CatalogResult<Option<Listing>>> + Send;

    /// Up to `limit` active listings whose title contains `term`
    fn search_titles(
        &self,
        term: &str,
        limit: usize,
    ) -> impl Future<Output = CatalogResult<Vec<TitleMatch>>> + Send;
}

/// Listing source over an owned collection
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    listings: Vec<Listing>,
}

impl MemorySource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }
}

impl ListingSource for MemorySource {
    async fn fetch_active_listings(&self) -> CatalogResult<Vec<Listing>> {
        Ok(self
            .listings
            .iter()
            .filter(|listing| !listing.sold)
            .cloned()
            .collect())
    }

    async fn fetch_listing_by_id(&self, id: Uuid) -> CatalogResult<Option<Listing>> {
        Ok(self.listings.iter().find(|listing| listing.id == id).cloned())
    }

    async fn search_titles(&self, term: &str, limit: usize) -> CatalogResult<Vec<TitleMatch>> {
        let needle = term.trim().to_lowercase();
        Ok(self
            .listings
            .iter()
            .filter(|listing| !listing.sold && listing.title.to_lowercase().contains(&needle))
            .take(limit)
            .map(|listing| TitleMatch {
                id: listing.id,
                title: listing.title.clone(),
            })
            .collect())
    }
}
