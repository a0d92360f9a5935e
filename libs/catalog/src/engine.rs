//! Catalog query engine
//!
//! Filters an already-fetched listing collection against a [`Criteria`] and
//! orders the survivors. Evaluation is pure and synchronous: one filter pass
//! followed by one stable sort whose comparators form a total order, so the
//! same (collection, criteria) pair always yields the same sequence.

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use crate::{
    criteria::{Criteria, RawCriteria, SortKey},
    error::CatalogResult,
    model::Listing,
};

/// Default page size
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may request
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Ordered matches and their count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub items: Vec<Listing>,
    pub total: usize,
}

/// One page of a [`QueryResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
}

impl QueryResult {
    /// Cut out a 1-based page; `page` is clamped to at least 1 and `limit`
    /// to `1..=MAX_PAGE_LIMIT`
    pub fn page(self, page: Option<u32>, limit: Option<u32>) -> Page<Listing> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = (page as usize - 1).saturating_mul(limit as usize);

        let items = self
            .items
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Page {
            items,
            page,
            limit,
            total: self.total,
        }
    }
}

/// Validate `raw` and evaluate it against `listings`
///
/// Fails with `InvalidCriteria` before touching the collection.
pub fn query<I>(listings: I, raw: &RawCriteria) -> CatalogResult<QueryResult>
where
    I: IntoIterator<Item = Listing>,
{
    let criteria = Criteria::parse(raw)?;
    Ok(evaluate(listings, &criteria))
}

/// Evaluate already-validated criteria
pub fn evaluate<I>(listings: I, criteria: &Criteria) -> QueryResult
where
    I: IntoIterator<Item = Listing>,
{
    let needle = criteria.needle();

    let mut items: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| criteria.matches(listing, needle.as_deref()))
        .collect();

    items.sort_by(|a, b| compare(criteria.sort, a, b));

    debug!(
        "Catalog query matched {} listings (sort: {})",
        items.len(),
        criteria.sort
    );

    QueryResult {
        total: items.len(),
        items,
    }
}

fn compare(sort: SortKey, a: &Listing, b: &Listing) -> Ordering {
    match sort {
        SortKey::Newest => b
            .created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id)),
        SortKey::PriceAsc => a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)),
        SortKey::PriceDesc => b.price.cmp(&a.price).then_with(|| b.id.cmp(&a.id)),
    }
}
