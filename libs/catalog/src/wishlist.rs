//! Wishlist views

use serde::Serialize;
use uuid::Uuid;

use crate::model::Listing;

/// Seller details shown next to a saved listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerSummary {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}

/// A wishlist entry joined with its listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistItem {
    pub entry_id: Uuid,
    pub listing: Listing,
    pub seller: Option<SellerSummary>,
}

/// Keep items whose title or category label contains `term`,
/// case-insensitively; a blank term keeps everything
pub fn filter_wishlist(items: Vec<WishlistItem>, term: &str) -> Vec<WishlistItem> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            item.listing.title.to_lowercase().contains(&needle)
                || item.listing.category.label().to_lowercase().contains(&needle)
        })
        .collect()
}
