//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use catalog::{
    CatalogError, Criteria, Listing, ListingSource, Profile, TitleMatch, engine,
    search::{MAX_SUGGESTIONS, MIN_SUGGESTION_CHARS},
    validation::{ListingChanges, NewListing, ProfileChanges, validate_institutional_email},
    wishlist::filter_wishlist,
};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{Identity, auth_middleware},
    models::{
        AddWishlistRequest, WishlistItemResponse, WishlistQuery,
        listing::{ContactResponse, ListingQuery, SuggestQuery},
    },
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/listings", post(create_listing))
        .route("/listings/:id", delete(delete_listing).put(update_listing))
        .route("/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/:id", delete(remove_from_wishlist))
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/listings", get(list_listings))
        .route("/listings/suggest", get(suggest_titles))
        .route("/listings/:id", get(get_listing))
        .route("/listings/:id/contact", get(get_listing_contact))
        .route("/users/:id/listings", get(get_user_listings))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "campus-market-api",
        "database": database
    }))
}

/// Search, filter, sort and page the active listings
pub async fn list_listings(
    State(state): State<AppState>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let criteria = query
        .criteria()
        .and_then(|raw| Criteria::parse(&raw))
        .inspect_err(|e| {
            debug!("Rejected listing query: {}", e);
        })?;
    let (page, limit) = query.paging()?;

    let listings = state.listings.fetch_active_listings().await?;
    let page = engine::evaluate(listings, &criteria).page(page, limit);

    Ok(Json(page))
}

/// Title suggestions for the search box
pub async fn suggest_titles(
    State(state): State<AppState>,
    query: Result<Query<SuggestQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let term = query.q.as_deref().unwrap_or_default().trim();
    if term.chars().count() < MIN_SUGGESTION_CHARS {
        return Ok(Json(Vec::<TitleMatch>::new()));
    }

    let matches = state.listings.search_titles(term, MAX_SUGGESTIONS).await?;
    Ok(Json(matches))
}

/// Get a listing by ID
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let listing = state
        .listings
        .fetch_listing_by_id(id)
        .await?
        .ok_or(CatalogError::NotFound("Listing"))?;

    Ok(Json(listing))
}

/// WhatsApp link for contacting the seller of a listing
pub async fn get_listing_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let listing = state
        .listings
        .fetch_listing_by_id(id)
        .await?
        .ok_or(CatalogError::NotFound("Listing"))?;

    let seller = state
        .profile_repository
        .find_by_id(listing.owner_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get seller profile: {}", e);
            ApiError::InternalServerError
        })?;

    let phone = seller.as_ref().and_then(|p| p.phone_number.as_deref());
    let whatsapp_url = catalog::contact::whatsapp_link(phone, &listing.title).map(String::from);

    Ok(Json(ContactResponse {
        listing_id: listing.id,
        whatsapp_url,
    }))
}

/// Get every listing of a seller, newest first
pub async fn get_user_listings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let listings = state
        .listing_repository
        .find_by_owner(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get listings for user {}: {}", id, e);
            ApiError::InternalServerError
        })?;

    Ok(Json(listings))
}

/// Create a listing owned by the caller
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<NewListing>,
) -> ApiResult<impl IntoResponse> {
    let listing = payload.validate().inspect_err(|e| {
        debug!("Rejected listing from {}: {}", identity.user_id, e);
    })?;

    ensure_profile(&state, &identity).await?;

    let listing = state
        .listing_repository
        .create(identity.user_id, listing)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create listing: {}", e);
            ApiError::InternalServerError
        })?;

    state.listings.invalidate().await;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// Update one of the caller's listings
pub async fn update_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ListingChanges>,
) -> ApiResult<impl IntoResponse> {
    let current = find_listing(&state, id).await?;
    current.ensure_owned_by(identity.user_id)?;

    let replace_images = !changes.images.is_empty();
    let updated = changes.apply_to(&current).inspect_err(|e| {
        debug!("Rejected update of listing {}: {}", id, e);
    })?;

    let saved = state
        .listing_repository
        .update(&updated, replace_images)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update listing: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(CatalogError::NotFound("Listing"))?;

    state.listings.invalidate().await;

    Ok(Json(saved))
}

/// Delete one of the caller's listings
pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let current = find_listing(&state, id).await?;
    current.ensure_owned_by(identity.user_id)?;

    let deleted = state
        .listing_repository
        .delete(id, identity.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete listing: {}", e);
            ApiError::InternalServerError
        })?;

    if !deleted {
        return Err(CatalogError::NotFound("Listing").into());
    }

    state.listings.invalidate().await;

    Ok(Json(json!({"message": "Listing deleted successfully"})))
}

/// The caller's wishlist, optionally filtered by title or category
pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<WishlistQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let items = state
        .wishlist_repository
        .find_by_user(identity.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get wishlist: {}", e);
            ApiError::InternalServerError
        })?;

    let items: Vec<WishlistItemResponse> =
        filter_wishlist(items, query.search.as_deref().unwrap_or_default())
            .into_iter()
            .map(WishlistItemResponse::from)
            .collect();

    Ok(Json(items))
}

/// Save a listing to the caller's wishlist
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<AddWishlistRequest>,
) -> ApiResult<impl IntoResponse> {
    find_listing(&state, payload.listing_id).await?;
    ensure_profile(&state, &identity).await?;

    let entry = state
        .wishlist_repository
        .add(identity.user_id, payload.listing_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add wishlist entry: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(CatalogError::Duplicate("Wishlist entry"))?;

    info!(
        "User {} saved listing {} to wishlist",
        identity.user_id, payload.listing_id
    );

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove an entry from the caller's wishlist
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let removed = state
        .wishlist_repository
        .remove(id, identity.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to remove wishlist entry: {}", e);
            ApiError::InternalServerError
        })?;

    if removed {
        Ok(Json(json!({"message": "Removed from wishlist"})))
    } else {
        Err(CatalogError::NotFound("Wishlist entry").into())
    }
}

/// The caller's profile, created on first access
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ensure_profile(&state, &identity).await?))
}

/// Update the caller's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(changes): Json<ProfileChanges>,
) -> ApiResult<impl IntoResponse> {
    let changes = changes.validate().inspect_err(|e| {
        debug!("Rejected profile update from {}: {}", identity.user_id, e);
    })?;

    ensure_profile(&state, &identity).await?;

    let profile = state
        .profile_repository
        .update(identity.user_id, &changes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update profile: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(CatalogError::NotFound("Profile"))?;

    info!("Updated profile {}", identity.user_id);

    Ok(Json(profile))
}

async fn find_listing(state: &AppState, id: Uuid) -> ApiResult<Listing> {
    let listing = state
        .listing_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get listing: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(CatalogError::NotFound("Listing"))?;

    Ok(listing)
}

/// Load the caller's profile, creating it for institutional addresses
async fn ensure_profile(state: &AppState, identity: &Identity) -> ApiResult<Profile> {
    let existing = state
        .profile_repository
        .find_by_id(identity.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get profile: {}", e);
            ApiError::InternalServerError
        })?;

    if let Some(profile) = existing {
        return Ok(profile);
    }

    validate_institutional_email(&identity.email, &state.config.email_domain)?;

    state
        .profile_repository
        .create(identity.user_id, &identity.email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create profile: {}", e);
            ApiError::InternalServerError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ServiceConfig,
        listing_cache::CachedListings,
        middleware::{Claims, JwtConfig, JwtKey, JwtVerifier, TokenType},
        repositories::{ListingRepository, ProfileRepository, WishlistRepository},
    };
    use common::{
        cache::{RedisConfig, RedisPool},
        database::DatabaseConfig,
    };
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use reqwest::StatusCode as HttpStatus;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use std::{
        sync::Arc,
        time::{SystemTime, UNIX_EPOCH},
    };
    use tokio::net::TcpListener;

    const SECRET: &str = "router-test-secret";

    /// State whose pools only connect when a handler touches them
    async fn lazy_state() -> AppState {
        let db_config = DatabaseConfig::from_env().unwrap();
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_lazy(&db_config.database_url)
            .unwrap();
        let redis = RedisPool::new(&RedisConfig::from_env().unwrap())
            .await
            .unwrap();
        let listing_repository = ListingRepository::new(pool.clone());

        AppState {
            db_pool: pool.clone(),
            listings: CachedListings::new(listing_repository.clone(), redis, 0),
            listing_repository,
            profile_repository: ProfileRepository::new(pool.clone()),
            wishlist_repository: WishlistRepository::new(pool),
            jwt_verifier: JwtVerifier::new(&JwtConfig {
                key: JwtKey::Secret(SECRET.to_string()),
            })
            .unwrap(),
            config: Arc::new(ServiceConfig {
                bind_address: "127.0.0.1:0".to_string(),
                email_domain: "@iiitrkvalley.ac.in".to_string(),
                listings_cache_ttl_seconds: 0,
            }),
        }
    }

    async fn spawn_app(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });
        format!("http://{}", address)
    }

    fn bearer(user_id: Uuid, email: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now,
            exp: now + 900,
            token_type: TokenType::Access,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    async fn json_error(response: reqwest::Response) -> Value {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"), "{}", content_type);
        response.json().await.unwrap()
    }

    fn new_listing() -> Value {
        json!({
            "title": "Casio fx-991EX calculator",
            "description": "Works perfectly, used for two semesters",
            "category": "Electronics",
            "condition": "Good",
            "price": 80_000,
            "images": ["https://cdn.example.com/calc.jpg"]
        })
    }

    #[tokio::test]
    async fn test_malformed_price_rejected_as_json() {
        let base = spawn_app(lazy_state().await).await;
        let client = reqwest::Client::new();

        for (query, field) in [
            ("min_price=abc", "min_price"),
            ("max_price=1e3", "max_price"),
            ("negotiable=perhaps", "negotiable"),
            ("page=-1", "page"),
        ] {
            let response = client
                .get(format!("{}/listings?{}", base, query))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), HttpStatus::BAD_REQUEST);

            let body = json_error(response).await;
            assert_eq!(body["field"], field);
            assert!(body["error"].as_str().unwrap().contains(field));
        }
    }

    #[tokio::test]
    async fn test_inverted_price_range_names_range() {
        let base = spawn_app(lazy_state().await).await;

        let response = reqwest::get(format!("{}/listings?min_price=5000&max_price=100", base))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::BAD_REQUEST);
        assert_eq!(json_error(response).await["field"], "price_range");
    }

    #[tokio::test]
    async fn test_short_suggestion_term_returns_nothing() {
        let base = spawn_app(lazy_state().await).await;

        let response = reqwest::get(format!("{}/listings/suggest?q=ca", base))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let base = spawn_app(lazy_state().await).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/listings", base))
            .json(&new_listing())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::UNAUTHORIZED);
        assert_eq!(json_error(response).await["error"], "Unauthorized");

        let response = client
            .get(format!("{}/wishlist", base))
            .header(reqwest::header::AUTHORIZATION, "Bearer not-a-jwt")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_payloads_rejected_before_storage() {
        let base = spawn_app(lazy_state().await).await;
        let client = reqwest::Client::new();
        let auth = bearer(Uuid::new_v4(), "r170001@iiitrkvalley.ac.in");

        let mut listing = new_listing();
        listing["title"] = json!("ab");
        let response = client
            .post(format!("{}/listings", base))
            .header(reqwest::header::AUTHORIZATION, &auth)
            .json(&listing)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::UNPROCESSABLE_ENTITY);
        assert_eq!(json_error(response).await["field"], "title");

        let response = client
            .put(format!("{}/profile", base))
            .header(reqwest::header::AUTHORIZATION, &auth)
            .json(&json!({ "phone_number": "12345" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::UNPROCESSABLE_ENTITY);
        assert_eq!(json_error(response).await["field"], "phone_number");
    }

    async fn migrated_app() -> String {
        let state = lazy_state().await;
        sqlx::migrate!("./migrations")
            .run(&state.db_pool)
            .await
            .unwrap();
        spawn_app(state).await
    }

    async fn create_listing_as(client: &reqwest::Client, base: &str, auth: &str) -> Uuid {
        let response = client
            .post(format!("{}/listings", base))
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&new_listing())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    fn institutional_user() -> String {
        let user_id = Uuid::new_v4();
        bearer(user_id, &format!("{}@iiitrkvalley.ac.in", user_id.simple()))
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_duplicate_wishlist_entry_conflicts() {
        let base = migrated_app().await;
        let client = reqwest::Client::new();
        let listing_id = create_listing_as(&client, &base, &institutional_user()).await;
        let buyer = institutional_user();

        let save = || {
            client
                .post(format!("{}/wishlist", base))
                .header(reqwest::header::AUTHORIZATION, &buyer)
                .json(&json!({ "listing_id": listing_id }))
                .send()
        };

        assert_eq!(save().await.unwrap().status(), HttpStatus::CREATED);
        let response = save().await.unwrap();
        assert_eq!(response.status(), HttpStatus::CONFLICT);
        assert!(json_error(response).await["error"].is_string());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_only_owner_may_modify_listing() {
        let base = migrated_app().await;
        let client = reqwest::Client::new();
        let listing_id = create_listing_as(&client, &base, &institutional_user()).await;
        let stranger = institutional_user();

        let response = client
            .put(format!("{}/listings/{}", base, listing_id))
            .header(reqwest::header::AUTHORIZATION, &stranger)
            .json(&json!({ "price": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::FORBIDDEN);

        let response = client
            .delete(format!("{}/listings/{}", base, listing_id))
            .header(reqwest::header::AUTHORIZATION, &stranger)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::FORBIDDEN);

        let response = reqwest::get(format!("{}/listings/{}", base, listing_id))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::OK);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_non_institutional_email_cannot_create_profile() {
        let base = migrated_app().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{}/profile", base))
            .header(
                reqwest::header::AUTHORIZATION,
                bearer(Uuid::new_v4(), "someone@gmail.com"),
            )
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatus::UNPROCESSABLE_ENTITY);
        assert_eq!(json_error(response).await["field"], "email");
    }
}
