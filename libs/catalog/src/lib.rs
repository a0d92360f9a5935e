//! Catalog domain for the Campus Market
//!
//! Listings, the criteria that select them and the query engine that turns a
//! fetched collection into an ordered, pageable result. Also home to the
//! field validation rules, the seller contact link, the wishlist filter,
//! scoped image previews and debounced title suggestions.
//!
//! ```rust
//! use catalog::{engine, criteria::RawCriteria};
//!
//! let raw = RawCriteria {
//!     category: Some("Electronics".to_string()),
//!     max_price: Some(100_000),
//!     sort: Some("price-asc".to_string()),
//!     ..Default::default()
//! };
//! let result = engine::query(Vec::new(), &raw).expect("valid criteria");
//! assert_eq!(result.total, 0);
//! ```

pub mod contact;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod model;
pub mod preview;
pub mod search;
pub mod source;
pub mod validation;
pub mod wishlist;

pub use criteria::{CategoryFilter, Criteria, PriceRange, RawCriteria, SortKey};
pub use engine::{Page, QueryResult};
pub use error::{CatalogError, CatalogResult};
pub use model::{Category, Condition, Listing, Price, Profile, TitleMatch, WishlistEntry};
pub use source::{ListingSource, MemorySource};
