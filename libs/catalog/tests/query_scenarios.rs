//! End-to-end behaviour of the catalog query engine over a realistic
//! storefront collection.

use catalog::{
    Category, CatalogError, Condition, Criteria, Listing, Price, PriceRange, RawCriteria,
    SortKey, engine,
};
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashSet;
use uuid::Uuid;

fn storefront() -> Vec<Listing> {
    let rows = [
        ("Data Structures and Algorithms Textbook", 850, Category::Books, Condition::Good, true),
        ("TI-84 Plus Graphing Calculator", 1200, Category::Electronics, Condition::LikeNew, false),
        ("IIIT-RKV Branded Hoodie - Large", 450, Category::Clothing, Condition::New, true),
        ("Logitech G402 Gaming Mouse", 950, Category::Electronics, Condition::Used, false),
        ("Operating Systems Concepts Book", 600, Category::Books, Condition::Good, true),
        ("Wooden Study Table", 1800, Category::Furniture, Condition::Good, true),
        ("Scientific Calculator - Casio FX-991ES", 750, Category::Electronics, Condition::LikeNew, false),
        ("Complete Set of Programming Reference Books", 1500, Category::Books, Condition::Good, true),
        ("Samsung Galaxy S20 - 128GB", 12000, Category::Electronics, Condition::Used, true),
        ("Computer Networks Textbook", 550, Category::Books, Condition::LikeNew, false),
        ("Desk Lamp with Adjustable Brightness", 350, Category::Electronics, Condition::Good, true),
        ("Lab Coat - Size Medium", 200, Category::Clothing, Condition::New, false),
    ];

    let start = Utc.with_ymd_and_hms(2024, 8, 1, 10, 0, 0).unwrap();
    rows.into_iter()
        .enumerate()
        .map(|(i, (title, rupees, category, condition, negotiable))| {
            let created = start + Duration::hours(i as i64);
            Listing {
                id: Uuid::from_u128(i as u128 + 1),
                owner_id: Uuid::from_u128(100 + (i as u128 % 4)),
                title: title.to_string(),
                description: format!("{} in {} condition", title, condition),
                category,
                condition,
                price: Price::from_rupees(rupees),
                negotiable,
                pickup_location: Some("Academic Block".to_string()),
                images: vec![format!("https://img.example/{}.jpg", i + 1)],
                sold: false,
                created_at: created,
                updated_at: created,
            }
        })
        .collect()
}

fn rupees(result: &catalog::QueryResult) -> Vec<i64> {
    result
        .items
        .iter()
        .map(|l| l.price.minor_units() / 100)
        .collect()
}

#[test]
fn unfiltered_query_is_a_permutation_of_the_input() {
    let input = storefront();
    let result = engine::query(input.clone(), &RawCriteria::default()).unwrap();

    assert_eq!(result.total, input.len());
    let expected: HashSet<Uuid> = input.iter().map(|l| l.id).collect();
    let actual: HashSet<Uuid> = result.items.iter().map(|l| l.id).collect();
    assert_eq!(actual, expected);

    // Newest first.
    assert_eq!(result.items[0].id, Uuid::from_u128(12));
    assert_eq!(result.items[11].id, Uuid::from_u128(1));
}

#[test]
fn category_filter_excludes_other_categories() {
    for category in Category::ALL {
        let criteria = Criteria::default().with_category(category);
        let result = engine::evaluate(storefront(), &criteria);
        assert!(result.items.iter().all(|l| l.category == category));
    }
}

#[test]
fn electronics_under_a_thousand_ascending() {
    let raw = RawCriteria {
        category: Some("Electronics".to_string()),
        min_price: Some(0),
        max_price: Some(Price::from_rupees(1000).minor_units()),
        sort: Some("price-asc".to_string()),
        ..Default::default()
    };

    let result = engine::query(storefront(), &raw).unwrap();
    assert_eq!(rupees(&result), vec![350, 750, 950]);
    assert_eq!(result.total, 3);
}

#[test]
fn equal_prices_tie_break_on_id_across_runs() {
    let mut input = storefront();
    for listing in input.iter_mut() {
        listing.price = Price::from_rupees(500);
    }

    let asc = Criteria::default().sorted_by(SortKey::PriceAsc);
    let desc = Criteria::default().sorted_by(SortKey::PriceDesc);

    let first = engine::evaluate(input.clone(), &asc);
    let ids: Vec<u128> = first.items.iter().map(|l| l.id.as_u128()).collect();
    assert_eq!(ids, (1..=12).collect::<Vec<u128>>());

    let mut reversed = input.clone();
    reversed.reverse();
    assert_eq!(engine::evaluate(reversed, &asc), first);

    let descending = engine::evaluate(input, &desc);
    let ids: Vec<u128> = descending.items.iter().map(|l| l.id.as_u128()).collect();
    assert_eq!(ids, (1..=12).rev().collect::<Vec<u128>>());
}

#[test]
fn repeated_queries_are_identical() {
    let raw = RawCriteria {
        search: Some("book".to_string()),
        condition: Some("Good,Like New".to_string()),
        sort: Some("price-high-low".to_string()),
        ..Default::default()
    };

    let first = engine::query(storefront(), &raw).unwrap();
    let second = engine::query(storefront(), &raw).unwrap();
    assert_eq!(first, second);
    assert_eq!(rupees(&first), vec![1500, 850, 600, 550]);
}

#[test]
fn single_point_price_range_is_inclusive() {
    let p = Price::from_rupees(750);
    let exact = Criteria::default().with_price_range(PriceRange::new(p, p).unwrap());
    let result = engine::evaluate(storefront(), &exact);
    assert_eq!(rupees(&result), vec![750]);

    let above = Criteria::default()
        .with_price_range(PriceRange::new(Price::from_minor(p.minor_units() + 1), Price::MAX).unwrap());
    let result = engine::evaluate(storefront(), &above);
    assert!(result.items.iter().all(|l| l.price > p));
    assert_eq!(result.total, 6);
}

#[test]
fn negotiable_only_without_matches_is_empty() {
    let mut input = storefront();
    for listing in input.iter_mut() {
        listing.negotiable = false;
    }

    let raw = RawCriteria {
        negotiable: Some(true),
        ..Default::default()
    };
    let result = engine::query(input, &raw).unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.total, 0);
}

#[test]
fn inverted_price_range_is_invalid_criteria() {
    let raw = RawCriteria {
        min_price: Some(Price::from_rupees(5000).minor_units()),
        max_price: Some(Price::from_rupees(1000).minor_units()),
        ..Default::default()
    };

    match engine::query(storefront(), &raw) {
        Err(CatalogError::InvalidCriteria { field, .. }) => assert_eq!(field, "price_range"),
        other => panic!("expected InvalidCriteria, got {:?}", other),
    }
}

#[test]
fn search_pages_through_results() {
    let raw = RawCriteria {
        search: Some("  TEXTBOOK ".to_string()),
        ..Default::default()
    };
    let page = engine::query(storefront(), &raw).unwrap().page(Some(1), Some(1));

    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Computer Networks Textbook");
}
