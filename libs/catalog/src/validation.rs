//! Field validation for listings and profiles
//!
//! All failures are field-scoped [`CatalogError::Validation`] values so the
//! caller can surface them next to the offending input.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::{
    error::{CatalogError, CatalogResult},
    model::{Category, Condition, Listing, Price},
};

/// Images a listing may carry
pub const MAX_IMAGES: usize = 5;

const MIN_TITLE_CHARS: usize = 5;
const MIN_DESCRIPTION_CHARS: usize = 10;

/// Listing creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    /// Minor units
    pub price: i64,
    #[serde(default)]
    pub negotiable: bool,
    #[serde(default)]
    pub pickup_location: Option<String>,
    pub images: Vec<String>,
}

/// A creation payload that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidListing {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub condition: Condition,
    pub price: Price,
    pub negotiable: bool,
    pub pickup_location: Option<String>,
    pub images: Vec<String>,
}

impl NewListing {
    pub fn validate(self) -> CatalogResult<ValidListing> {
        let images = validate_images(self.images)?;

        Ok(ValidListing {
            title: validate_title(&self.title)?,
            description: validate_description(&self.description)?,
            category: parse_category(&self.category)?,
            condition: parse_condition(&self.condition)?,
            price: validate_price(self.price)?,
            negotiable: self.negotiable,
            pickup_location: optional_text(self.pickup_location),
            images,
        })
    }
}

/// Images to drop from and append to a listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageDelta {
    #[serde(default)]
    pub remove: Vec<String>,
    #[serde(default)]
    pub add: Vec<String>,
}

impl ImageDelta {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    /// Apply to `current`, keeping order: survivors first, then additions
    pub fn apply(&self, current: &[String]) -> CatalogResult<Vec<String>> {
        if let Some(unknown) = self.remove.iter().find(|url| !current.contains(url)) {
            return Err(CatalogError::validation(
                "images",
                format!("image '{}' is not attached to this listing", unknown),
            ));
        }

        let images: Vec<String> = current
            .iter()
            .filter(|url| !self.remove.contains(url))
            .chain(self.add.iter())
            .cloned()
            .collect();

        validate_images(images)
    }
}

/// Listing update payload; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub price: Option<i64>,
    pub negotiable: Option<bool>,
    /// A blank string clears the location
    pub pickup_location: Option<String>,
    pub sold: Option<bool>,
    #[serde(default)]
    pub images: ImageDelta,
}

impl ListingChanges {
    /// Produce the updated listing; timestamps are left for the store
    pub fn apply_to(self, listing: &Listing) -> CatalogResult<Listing> {
        let mut updated = listing.clone();

        if let Some(title) = self.title {
            updated.title = validate_title(&title)?;
        }
        if let Some(description) = self.description {
            updated.description = validate_description(&description)?;
        }
        if let Some(category) = self.category {
            updated.category = parse_category(&category)?;
        }
        if let Some(condition) = self.condition {
            updated.condition = parse_condition(&condition)?;
        }
        if let Some(price) = self.price {
            updated.price = validate_price(price)?;
        }
        if let Some(negotiable) = self.negotiable {
            updated.negotiable = negotiable;
        }
        if self.pickup_location.is_some() {
            updated.pickup_location = optional_text(self.pickup_location);
        }
        if let Some(sold) = self.sold {
            updated.sold = sold;
        }
        if !self.images.is_empty() {
            updated.images = self.images.apply(&listing.images)?;
        }

        Ok(updated)
    }
}

/// Profile update payload; every field is replaced, blanks become `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub student_id: Option<String>,
    pub phone_number: Option<String>,
    pub hostel_details: Option<String>,
}

impl ProfileChanges {
    pub fn validate(self) -> CatalogResult<ProfileChanges> {
        let phone_number = optional_text(self.phone_number);
        if let Some(phone) = phone_number.as_deref() {
            validate_phone_number(phone)?;
        }

        Ok(ProfileChanges {
            full_name: optional_text(self.full_name),
            student_id: optional_text(self.student_id),
            phone_number,
            hostel_details: optional_text(self.hostel_details),
        })
    }
}

pub fn validate_title(title: &str) -> CatalogResult<String> {
    let title = title.trim();
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(CatalogError::validation(
            "title",
            format!("Title must be at least {} characters", MIN_TITLE_CHARS),
        ));
    }
    Ok(title.to_string())
}

pub fn validate_description(description: &str) -> CatalogResult<String> {
    let description = description.trim();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(CatalogError::validation(
            "description",
            format!(
                "Description must be at least {} characters",
                MIN_DESCRIPTION_CHARS
            ),
        ));
    }
    Ok(description.to_string())
}

pub fn validate_price(minor_units: i64) -> CatalogResult<Price> {
    if minor_units <= 0 {
        return Err(CatalogError::validation("price", "Price must be positive"));
    }
    Ok(Price::from_minor(minor_units))
}

/// Between one and [`MAX_IMAGES`] non-blank image URLs
pub fn validate_images(images: Vec<String>) -> CatalogResult<Vec<String>> {
    if images.is_empty() {
        return Err(CatalogError::validation(
            "images",
            "Please upload at least one image",
        ));
    }
    if images.len() > MAX_IMAGES {
        return Err(CatalogError::validation(
            "images",
            format!("Maximum {} images allowed", MAX_IMAGES),
        ));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(CatalogError::validation("images", "Image URL must not be empty"));
    }
    Ok(images)
}

/// Syntactically valid address ending in the institutional `domain`
/// (e.g. `@iiitrkvalley.ac.in`), compared case-insensitively
pub fn validate_institutional_email(email: &str, domain: &str) -> CatalogResult<()> {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    let email = email.trim();
    if email.is_empty() {
        return Err(CatalogError::validation("email", "Email is required"));
    }
    if !regex.is_match(email) {
        return Err(CatalogError::validation("email", "Invalid email format"));
    }
    if !email.to_lowercase().ends_with(&domain.to_lowercase()) {
        return Err(CatalogError::validation(
            "email",
            format!("Please use your institutional email address ({})", domain),
        ));
    }
    Ok(())
}

/// 10 to 15 digits, spaces and a leading `+` allowed
pub fn validate_phone_number(phone: &str) -> CatalogResult<()> {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
        return Err(CatalogError::validation(
            "phone_number",
            "Phone number must contain 10 to 15 digits",
        ));
    }
    Ok(())
}

fn parse_category(value: &str) -> CatalogResult<Category> {
    value
        .parse()
        .map_err(|_| CatalogError::validation("category", "Please select a category"))
}

fn parse_condition(value: &str) -> CatalogResult<Condition> {
    value
        .parse()
        .map_err(|_| CatalogError::validation("condition", "Please select a condition"))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
