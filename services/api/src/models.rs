//! API models for request and response payloads

use catalog::wishlist::WishlistItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod listing;

/// Request for adding a listing to the wishlist
#[derive(Debug, Deserialize)]
pub struct AddWishlistRequest {
    pub listing_id: Uuid,
}

/// Query parameters for the wishlist page
#[derive(Debug, Default, Deserialize)]
pub struct WishlistQuery {
    /// Matches listing title or category
    pub search: Option<String>,
}

/// Wishlist entry with a ready-made contact link
#[derive(Debug, Serialize)]
pub struct WishlistItemResponse {
    #[serde(flatten)]
    pub item: WishlistItem,
    pub whatsapp_url: Option<String>,
}

impl From<WishlistItem> for WishlistItemResponse {
    fn from(item: WishlistItem) -> Self {
        let phone = item
            .seller
            .as_ref()
            .and_then(|seller| seller.phone_number.as_deref());
        let whatsapp_url =
            catalog::contact::whatsapp_link(phone, &item.listing.title).map(String::from);

        Self { item, whatsapp_url }
    }
}
