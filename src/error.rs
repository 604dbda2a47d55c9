//! Error types for pgqb

use thiserror::Error;

/// Result type alias for pgqb operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum QbError {
    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination value cannot receive the result
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// `model()` invoked on a type with no primary-key column
    #[error("Model '{0}' declares no primary key column")]
    MissingPrimaryKey(&'static str),

    /// `model()` invoked with a single key value on a composite-key type
    #[error("Model '{model}' has a composite primary key ({columns} columns); a single key value was supplied")]
    CompositePrimaryKey {
        model: &'static str,
        columns: usize,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Statement validation error (e.g. an unresolved named parameter)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error raised by a user-installed hook
    #[error("Hook error: {0}")]
    Hook(String),
}

impl QbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid-destination error
    pub fn invalid_destination(message: impl Into<String>) -> Self {
        Self::InvalidDestination(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an invalid-destination error
    pub fn is_invalid_destination(&self) -> bool {
        matches!(self, Self::InvalidDestination(_))
    }
}
