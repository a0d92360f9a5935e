//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog::CatalogError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message, optionally naming a field
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },

    /// Field-level validation failure
    #[error("Validation failed for {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Entity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            message: rejection.body_text(),
            field: None,
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidCriteria { field, reason } => ApiError::BadRequest {
                message: format!("Invalid {}: {}", field, reason),
                field: Some(field),
            },
            CatalogError::Validation { field, message } => ApiError::Validation { field, message },
            CatalogError::Permission => {
                ApiError::Forbidden("Only the owner can modify this listing".to_string())
            }
            CatalogError::NotFound(entity) => ApiError::NotFound(format!("{} not found", entity)),
            CatalogError::Duplicate(entity) => {
                ApiError::Conflict(format!("{} already exists", entity))
            }
            CatalogError::Store(message) => {
                tracing::error!("Store error: {}", message);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, field) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest { message, field } => (StatusCode::BAD_REQUEST, message, field),
            ApiError::Validation { field, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(field))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        };

        let body = match field {
            Some(field) => json!({ "error": error_message, "field": field }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_errors_map_to_statuses() {
        let cases = [
            (
                CatalogError::InvalidCriteria {
                    field: "price_range",
                    reason: "min exceeds max".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CatalogError::Validation {
                    field: "title",
                    message: "too short".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CatalogError::Permission, StatusCode::FORBIDDEN),
            (CatalogError::NotFound("Listing"), StatusCode::NOT_FOUND),
            (CatalogError::Duplicate("Wishlist entry"), StatusCode::CONFLICT),
            (
                CatalogError::Store("connection reset".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
