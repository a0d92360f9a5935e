//! Marketplace entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};

/// Failure to parse one of the fixed enumerations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Lowercases and folds `-`/`_` separators so "like-new", "Like New" and
/// "LIKE_NEW" compare equal.
fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Listing category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Books,
    Electronics,
    Clothing,
    Furniture,
    Stationery,
    Sports,
    Others,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Books,
        Category::Electronics,
        Category::Clothing,
        Category::Furniture,
        Category::Stationery,
        Category::Sports,
        Category::Others,
    ];

    /// Display label, also the stored representation
    pub fn label(&self) -> &'static str {
        match self {
            Category::Books => "Books",
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Furniture => "Furniture",
            Category::Stationery => "Stationery",
            Category::Sports => "Sports",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Category::ALL
            .into_iter()
            .find(|category| category.label().to_lowercase() == wanted)
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                value: s.to_string(),
            })
    }
}

/// Item condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    New,
    #[serde(rename = "Like New")]
    LikeNew,
    Good,
    Used,
    Fair,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::New,
        Condition::LikeNew,
        Condition::Good,
        Condition::Used,
        Condition::Fair,
    ];

    /// Display label, also the stored representation
    pub fn label(&self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::LikeNew => "Like New",
            Condition::Good => "Good",
            Condition::Used => "Used",
            Condition::Fair => "Fair",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Condition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Condition::ALL
            .into_iter()
            .find(|condition| condition.label().to_lowercase() == wanted)
            .ok_or_else(|| UnknownVariant {
                kind: "condition",
                value: s.to_string(),
            })
    }
}

/// Currency amount in minor units (paise)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const MAX: Price = Price(i64::MAX);
    pub const ZERO: Price = Price(0);

    pub const fn from_minor(minor_units: i64) -> Self {
        Price(minor_units)
    }

    pub const fn from_rupees(rupees: i64) -> Self {
        Price(rupees.saturating_mul(100))
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        match abs % 100 {
            0 => write!(f, "{}₹{}", sign, abs / 100),
            paise => write!(f, "{}₹{}.{:02}", sign, abs / 100, paise),
        }
    }
}

/// A product listed for sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub condition: Condition,
    pub price: Price,
    pub negotiable: bool,
    pub pickup_location: Option<String>,
    pub images: Vec<String>,
    pub sold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Fail with [`CatalogError::Permission`] unless `user_id` owns the listing
    pub fn ensure_owned_by(&self, user_id: Uuid) -> CatalogResult<()> {
        if self.owner_id == user_id {
            Ok(())
        } else {
            Err(CatalogError::Permission)
        }
    }
}

/// Registered student profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub student_id: Option<String>,
    pub phone_number: Option<String>,
    pub hostel_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing saved to a user's wishlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Title-only search hit used for suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub id: Uuid,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parses_labels_and_slugs() {
        assert_eq!("Books".parse::<Category>(), Ok(Category::Books));
        assert_eq!("electronics".parse::<Category>(), Ok(Category::Electronics));
        assert_eq!(" OTHERS ".parse::<Category>(), Ok(Category::Others));

        let err = "Vehicles".parse::<Category>().unwrap_err();
        assert_eq!(err.kind, "category");
        assert_eq!(err.value, "Vehicles");
    }

    #[test]
    fn test_condition_parses_multi_word_forms() {
        assert_eq!("Like New".parse::<Condition>(), Ok(Condition::LikeNew));
        assert_eq!("like-new".parse::<Condition>(), Ok(Condition::LikeNew));
        assert_eq!("LIKE_NEW".parse::<Condition>(), Ok(Condition::LikeNew));
        assert!("Broken".parse::<Condition>().is_err());
    }

    #[test]
    fn test_condition_serializes_as_label() {
        let json = serde_json::to_string(&Condition::LikeNew).unwrap();
        assert_eq!(json, "\"Like New\"");
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Condition::LikeNew);
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_rupees(350).to_string(), "₹350");
        assert_eq!(Price::from_minor(35_050).to_string(), "₹350.50");
        assert_eq!(Price::from_minor(-5).to_string(), "-₹0.05");
    }

    #[test]
    fn test_ensure_owned_by() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "Wooden Study Table".to_string(),
            description: "Sturdy table, minor scratches".to_string(),
            category: Category::Furniture,
            condition: Condition::Good,
            price: Price::from_rupees(1800),
            negotiable: true,
            pickup_location: None,
            images: vec!["https://img.example/table.jpg".to_string()],
            sold: false,
            created_at: now,
            updated_at: now,
        };

        assert!(listing.ensure_owned_by(owner).is_ok());
        assert_eq!(
            listing.ensure_owned_by(Uuid::new_v4()),
            Err(CatalogError::Permission)
        );
    }
}
