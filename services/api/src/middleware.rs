//! Authentication middleware for JWT token validation
//!
//! The middleware verifies the bearer token and inserts an [`Identity`]
//! snapshot into the request extensions. Handlers that need the caller take
//! it explicitly as `Extension<Identity>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (identity-provider subject)
    pub sub: Uuid,
    /// Email the user registered with
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated caller, passed to handlers explicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Key material for verifying tokens
#[derive(Debug, Clone)]
pub enum JwtKey {
    /// RS256 public key in PEM format
    RsaPublicPem(String),
    /// HS256 shared secret
    Secret(String),
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub key: JwtKey,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: RS256 public key (PEM) or path to a PEM file
    /// - `JWT_SECRET`: HS256 secret, used when no public key is configured
    pub fn from_env() -> Result<Self, String> {
        if let Ok(public_key) = env::var("JWT_PUBLIC_KEY") {
            // If the public key looks like a file path, read from file (try CWD, then project root)
            let public_key = if public_key.starts_with("-----BEGIN") {
                public_key
            } else {
                std::fs::read_to_string(&public_key)
                    .or_else(|_| {
                        let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                        path.push(&public_key);
                        std::fs::read_to_string(path)
                    })
                    .map_err(|e| format!("Failed to read public key file: {}", e))?
                    .trim()
                    .to_string()
            };
            return Ok(JwtConfig {
                key: JwtKey::RsaPublicPem(public_key),
            });
        }

        env::var("JWT_SECRET")
            .map(|secret| JwtConfig {
                key: JwtKey::Secret(secret),
            })
            .map_err(|_| "Neither JWT_PUBLIC_KEY nor JWT_SECRET is set".to_string())
    }
}

/// Verifies access tokens; built once at startup
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        let (decoding_key, algorithm) = match &config.key {
            JwtKey::RsaPublicPem(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
            JwtKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Validate an access token and extract the caller
    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                ApiError::Unauthorized
            })?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized);
        }

        Ok(Identity {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let identity = state.jwt_verifier.verify(token).inspect_err(|_| {
        error!("Authentication failed for {}", req.uri().path());
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
