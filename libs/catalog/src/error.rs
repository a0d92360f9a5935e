//! Error types for the catalog domain

use thiserror::Error;

/// Errors raised by catalog operations and their collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The query criteria violate the engine's input contract
    #[error("Invalid criteria for {field}: {reason}")]
    InvalidCriteria { field: &'static str, reason: String },

    /// A user-supplied field failed validation
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The acting user does not own the entity
    #[error("Permission denied")]
    Permission,

    /// The entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The entity already exists
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// The backing store failed
    #[error("Store error: {0}")]
    Store(String),
}

impl CatalogError {
    pub(crate) fn invalid_criteria(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidCriteria {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// The offending field, for field-scoped errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidCriteria { field, .. } | Self::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Type alias for Result with CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;
