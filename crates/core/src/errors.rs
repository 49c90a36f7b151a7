//! Core error types for the Stockfolio client.
//!
//! These errors cover everything that can fail without touching the network:
//! input validation, persisted session storage and configuration parsing.
//! Transport failures live in the client crate's taxonomy.

use std::collections::BTreeMap;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Secret store error: {0}")]
    Secret(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for user input, raised before any request is sent.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Per-field messages in the same shape the backend uses for 400 responses.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        match self {
            Self::MissingField(field) => {
                errors.insert(field.clone(), "is required".to_string());
            }
            Self::InvalidField { field, message } => {
                errors.insert(field.clone(), message.clone());
            }
        }
        errors
    }
}
