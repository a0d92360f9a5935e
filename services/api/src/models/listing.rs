//! Listing models for the API service

use catalog::{CatalogError, CatalogResult, RawCriteria};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Query parameters for listing search
///
/// Numeric and boolean parameters arrive as text so a malformed value is
/// reported against its own field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    /// Case-insensitive title search
    pub search: Option<String>,
    /// Category label, slug or "all"
    pub category: Option<String>,
    /// Inclusive lower bound in paise
    pub min_price: Option<String>,
    /// Inclusive upper bound in paise
    pub max_price: Option<String>,
    /// Comma-separated conditions
    pub condition: Option<String>,
    /// Only negotiable listings
    pub negotiable: Option<String>,
    /// newest, price-asc or price-desc
    pub sort: Option<String>,
    /// Page number (1-based)
    pub page: Option<String>,
    /// Number of items per page
    pub limit: Option<String>,
}

impl ListingQuery {
    /// The engine-facing part of the query
    pub fn criteria(&self) -> CatalogResult<RawCriteria> {
        Ok(RawCriteria {
            search: self.search.clone(),
            category: self.category.clone(),
            min_price: parse_param("min_price", self.min_price.as_deref())?,
            max_price: parse_param("max_price", self.max_price.as_deref())?,
            condition: self.condition.clone(),
            negotiable: parse_param("negotiable", self.negotiable.as_deref())?,
            sort: self.sort.clone(),
        })
    }

    /// Requested page and page size, before clamping
    pub fn paging(&self) -> CatalogResult<(Option<u32>, Option<u32>)> {
        Ok((
            parse_param("page", self.page.as_deref())?,
            parse_param("limit", self.limit.as_deref())?,
        ))
    }
}

/// Blank values count as absent
fn parse_param<T: FromStr>(field: &'static str, value: Option<&str>) -> CatalogResult<Option<T>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| CatalogError::InvalidCriteria {
            field,
            reason: format!("'{}' is not a valid value", v),
        }),
    }
}

/// Query parameters for title suggestions
#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    pub q: Option<String>,
}

/// Seller contact details for a listing
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub listing_id: Uuid,
    pub whatsapp_url: Option<String>,
}
