//! Repositories for database operations

use anyhow::Result;
use catalog::{
    Profile, WishlistEntry,
    validation::ProfileChanges,
    wishlist::{SellerSummary, WishlistItem},
};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

pub mod listing;

pub use listing::ListingRepository;

use listing::{LISTING_COLUMNS, listing_from_row};

fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        student_id: row.get("student_id"),
        phone_number: row.get("phone_number"),
        hostel_details: row.get("hostel_details"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Profile repository for database operations
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a profile by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, full_name, student_id, phone_number, hostel_details,
                   created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Create the profile for a new user, or return the existing one
    pub async fn create(&self, id: Uuid, email: &str) -> Result<Profile> {
        let row = sqlx::query(
            r#"
            INSERT INTO profiles (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET email = profiles.email
            RETURNING id, email, full_name, student_id, phone_number, hostel_details,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        info!("Created profile for user {}", id);
        Ok(profile_from_row(&row))
    }

    /// Replace the editable profile fields
    pub async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = $2, student_id = $3, phone_number = $4, hostel_details = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, full_name, student_id, phone_number, hostel_details,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.full_name)
        .bind(&changes.student_id)
        .bind(&changes.phone_number)
        .bind(&changes.hostel_details)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }
}

/// Wishlist repository for database operations
#[derive(Clone)]
pub struct WishlistRepository {
    pool: PgPool,
}

impl WishlistRepository {
    /// Create a new wishlist repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Save a listing for a user; `None` when it is already saved
    pub async fn add(&self, user_id: Uuid, listing_id: Uuid) -> Result<Option<WishlistEntry>> {
        let row = sqlx::query(
            r#"
            INSERT INTO wishlist_entries (user_id, listing_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, listing_id) DO NOTHING
            RETURNING id, user_id, listing_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| WishlistEntry {
            id: row.get("id"),
            user_id: row.get("user_id"),
            listing_id: row.get("listing_id"),
            created_at: row.get("created_at"),
        }))
    }

    /// Remove one of the user's entries
    pub async fn remove(&self, entry_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlist_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's saved listings with seller details, most recently saved first
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
        let sql = format!(
            r#"
            SELECT w.id AS entry_id, {},
                   p.id AS seller_id, p.full_name AS seller_name, p.phone_number AS seller_phone
            FROM wishlist_entries w
            JOIN listings l ON l.id = w.listing_id
            LEFT JOIN profiles p ON p.id = l.owner_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC
            "#,
            LISTING_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let seller_id: Option<Uuid> = row.try_get("seller_id")?;
                Ok(WishlistItem {
                    entry_id: row.try_get("entry_id")?,
                    listing: listing_from_row(row)?,
                    seller: seller_id.map(|_| SellerSummary {
                        full_name: row.get("seller_name"),
                        phone_number: row.get("seller_phone"),
                    }),
                })
            })
            .collect()
    }
}
