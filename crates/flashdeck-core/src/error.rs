//! Error types for flashdeck.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CardId, CategoryId};

/// Result type alias using flashdeck's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field as the caller spelled it.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Core error type for flashdeck operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Card not found
    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    /// Category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Caller supplied malformed or unrecognized input.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    /// Write collided with an existing unique value
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A storage invariant was violated (e.g. unexpected row count)
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Validation error carrying a single field failure.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let err = FieldError::new(field, message);
        Error::Validation {
            message: format!("Invalid value for '{}': {}", err.field, err.message),
            errors: vec![err],
        }
    }
}
