//! Listing repository for database operations

use anyhow::Result;
use catalog::{
    CatalogError, CatalogResult, Listing, ListingSource, Price, TitleMatch,
    validation::ValidListing,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

/// Listing columns plus the ordered image URLs, for queries aliasing
/// `listings` as `l`
pub(crate) const LISTING_COLUMNS: &str = r#"
    l.id, l.owner_id, l.title, l.description, l.category, l.item_condition,
    l.price_paise, l.negotiable, l.pickup_location, l.sold, l.created_at, l.updated_at,
    ARRAY(
        SELECT i.image_url FROM listing_images i
        WHERE i.listing_id = l.id
        ORDER BY i.position
    ) AS images
"#;

/// Map a row selected with [`LISTING_COLUMNS`]
pub(crate) fn listing_from_row(row: &PgRow) -> Result<Listing> {
    let category: String = row.try_get("category")?;
    let condition: String = row.try_get("item_condition")?;

    Ok(Listing {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: category.parse()?,
        condition: condition.parse()?,
        price: Price::from_minor(row.try_get("price_paise")?),
        negotiable: row.try_get("negotiable")?,
        pickup_location: row.try_get("pickup_location")?,
        images: row.try_get("images")?,
        sold: row.try_get("sold")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Listing repository for database operations
#[derive(Clone)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    /// Create a new listing repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get all listings not marked as sold
    pub async fn find_active(&self) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings l WHERE l.sold = FALSE",
            LISTING_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(listing_from_row).collect()
    }

    /// Find a listing by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>> {
        let sql = format!("SELECT {} FROM listings l WHERE l.id = $1", LISTING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(listing_from_row).transpose()
    }

    /// Get every listing of a seller, sold ones included, newest first
    pub async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings l WHERE l.owner_id = $1 ORDER BY l.created_at DESC, l.id DESC",
            LISTING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(listing_from_row).collect()
    }

    /// Active listings whose title contains `term`, newest first
    pub async fn search_titles(&self, term: &str, limit: usize) -> Result<Vec<TitleMatch>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title
            FROM listings
            WHERE sold = FALSE AND title ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TitleMatch {
                id: row.get("id"),
                title: row.get("title"),
            })
            .collect())
    }

    /// Create a listing and its images in one transaction
    pub async fn create(&self, owner_id: Uuid, listing: ValidListing) -> Result<Listing> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO listings (owner_id, title, description, category, item_condition,
                                  price_paise, negotiable, pickup_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.category.label())
        .bind(listing.condition.label())
        .bind(listing.price.minor_units())
        .bind(listing.negotiable)
        .bind(&listing.pickup_location)
        .fetch_one(&mut *tx)
        .await?;

        let id: Uuid = row.get("id");
        insert_images(&mut tx, id, &listing.images).await?;
        tx.commit().await?;

        info!("Created listing {} for user {}", id, owner_id);

        Ok(Listing {
            id,
            owner_id,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            condition: listing.condition,
            price: listing.price,
            negotiable: listing.negotiable,
            pickup_location: listing.pickup_location,
            images: listing.images,
            sold: false,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Persist an updated listing owned by `listing.owner_id`
    ///
    /// Returns `None` when no such listing exists for that owner.
    pub async fn update(&self, listing: &Listing, replace_images: bool) -> Result<Option<Listing>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE listings
            SET title = $3, description = $4, category = $5, item_condition = $6,
                price_paise = $7, negotiable = $8, pickup_location = $9, sold = $10,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING updated_at
            "#,
        )
        .bind(listing.id)
        .bind(listing.owner_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.category.label())
        .bind(listing.condition.label())
        .bind(listing.price.minor_units())
        .bind(listing.negotiable)
        .bind(&listing.pickup_location)
        .bind(listing.sold)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if replace_images {
            sqlx::query("DELETE FROM listing_images WHERE listing_id = $1")
                .bind(listing.id)
                .execute(&mut *tx)
                .await?;
            insert_images(&mut tx, listing.id, &listing.images).await?;
        }

        tx.commit().await?;
        info!("Updated listing {}", listing.id);

        Ok(Some(Listing {
            updated_at: row.get("updated_at"),
            ..listing.clone()
        }))
    }

    /// Delete a listing owned by `owner_id`; images and wishlist entries cascade
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Deleted listing {}", id);
        }
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_images(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: Uuid,
    images: &[String],
) -> Result<()> {
    for (position, url) in images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO listing_images (listing_id, position, image_url) VALUES ($1, $2, $3)",
        )
        .bind(listing_id)
        .bind(position as i16)
        .bind(url)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn store_error(err: anyhow::Error) -> CatalogError {
    CatalogError::Store(err.to_string())
}

impl ListingSource for ListingRepository {
    async fn fetch_active_listings(&self) -> CatalogResult<Vec<Listing>> {
        self.find_active().await.map_err(store_error)
    }

    async fn fetch_listing_by_id(&self, id: Uuid) -> CatalogResult<Option<Listing>> {
        self.find_by_id(id).await.map_err(store_error)
    }

    async fn search_titles(&self, term: &str, limit: usize) -> CatalogResult<Vec<TitleMatch>> {
        ListingRepository::search_titles(self, term, limit)
            .await
            .map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("calc"), "%calc%");
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }
}
