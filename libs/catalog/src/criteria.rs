//! Query criteria and their validation
//!
//! [`RawCriteria`] is what arrives from a query string. [`Criteria::parse`]
//! validates it and yields a [`Criteria`], which is valid by construction:
//! the price range can only be built through [`PriceRange::new`].

use std::{collections::BTreeSet, fmt, str::FromStr};

use crate::{
    error::{CatalogError, CatalogResult},
    model::{Category, Condition, Listing, Price},
};

/// Unvalidated criteria as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCriteria {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Comma-separated condition names
    pub condition: Option<String>,
    pub negotiable: Option<bool>,
    pub sort: Option<String>,
}

/// Category facet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("all")
            || trimmed.eq_ignore_ascii_case("all categories")
        {
            return Ok(CategoryFilter::All);
        }

        trimmed
            .parse::<Category>()
            .map(CategoryFilter::Only)
            .map_err(|e| CatalogError::invalid_criteria("category", e.to_string()))
    }
}

/// Inclusive price bounds, min <= max, both non-negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    min: Price,
    max: Price,
}

impl PriceRange {
    pub fn new(min: Price, max: Price) -> CatalogResult<Self> {
        if min < Price::ZERO {
            return Err(CatalogError::invalid_criteria(
                "min_price",
                "must not be negative",
            ));
        }
        if max < Price::ZERO {
            return Err(CatalogError::invalid_criteria(
                "max_price",
                "must not be negative",
            ));
        }
        if min > max {
            return Err(CatalogError::invalid_criteria(
                "price_range",
                format!("min_price {} exceeds max_price {}", min, max),
            ));
        }
        Ok(Self { min, max })
    }

    /// The unbounded range
    pub const fn full() -> Self {
        Self {
            min: Price::ZERO,
            max: Price::MAX,
        }
    }

    pub fn min(&self) -> Price {
        self.min
    }

    pub fn max(&self) -> Price {
        self.max
    }

    pub fn contains(&self, price: Price) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Newest => "newest",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
        })
    }
}

impl FromStr for SortKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "newest" => Ok(SortKey::Newest),
            "price-asc" | "price-low-high" => Ok(SortKey::PriceAsc),
            "price-desc" | "price-high-low" => Ok(SortKey::PriceDesc),
            _ => Err(CatalogError::invalid_criteria(
                "sort",
                format!("unknown sort '{}'", s),
            )),
        }
    }
}

/// Validated criteria driving one engine invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub term: String,
    pub category: CategoryFilter,
    pub price_range: PriceRange,
    pub conditions: BTreeSet<Condition>,
    pub negotiable_only: bool,
    pub sort: SortKey,
}

impl Criteria {
    /// Validate raw criteria, naming the first offending field on failure
    pub fn parse(raw: &RawCriteria) -> CatalogResult<Self> {
        let category = match raw.category.as_deref() {
            Some(category) => category.parse()?,
            None => CategoryFilter::All,
        };

        let price_range = match (raw.min_price, raw.max_price) {
            (None, None) => PriceRange::full(),
            (min, max) => PriceRange::new(
                Price::from_minor(min.unwrap_or(0)),
                max.map(Price::from_minor).unwrap_or(Price::MAX),
            )?,
        };

        let conditions = match raw.condition.as_deref() {
            Some(list) => parse_conditions(list)?,
            None => BTreeSet::new(),
        };

        let sort = match raw.sort.as_deref() {
            Some(sort) => sort.parse()?,
            None => SortKey::Newest,
        };

        Ok(Self {
            term: raw.search.clone().unwrap_or_default(),
            category,
            price_range,
            conditions,
            negotiable_only: raw.negotiable.unwrap_or(false),
            sort,
        })
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = CategoryFilter::Only(category);
        self
    }

    pub fn with_price_range(mut self, price_range: PriceRange) -> Self {
        self.price_range = price_range;
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions = conditions.into_iter().collect();
        self
    }

    pub fn negotiable_only(mut self) -> Self {
        self.negotiable_only = true;
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Lowercased needle, `None` when the term is blank
    pub(crate) fn needle(&self) -> Option<String> {
        let trimmed = self.term.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    /// All facets ANDed; `needle` comes from [`Criteria::needle`]
    pub(crate) fn matches(&self, listing: &Listing, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !listing.title.to_lowercase().contains(needle) {
                return false;
            }
        }

        self.category.matches(listing.category)
            && self.price_range.contains(listing.price)
            && (self.conditions.is_empty() || self.conditions.contains(&listing.condition))
            && (!self.negotiable_only || listing.negotiable)
    }
}

fn parse_conditions(list: &str) -> CatalogResult<BTreeSet<Condition>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<Condition>()
                .map_err(|e| CatalogError::invalid_criteria("condition", e.to_string()))
        })
        .collect()
}
