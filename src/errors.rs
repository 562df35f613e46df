//! # Data Model Errors
//!
//! Every failure here is synchronous and detected locally at the point of
//! the offending call. Nothing is retried. A rejected call leaves the
//! entity it was invoked on unchanged.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for data model operations
pub type DataResult<T> = Result<T, DataError>;

/// Data model errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    // Addressing
    #[error("Region out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Buffer size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    // Arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid unit: '{0}'")]
    InvalidUnit(String),

    #[error("Element type mismatch: array holds {expected}, buffer holds {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("File is opened read-only")]
    ReadOnly,

    // Persistent store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DataError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            DataError::OutOfBounds(_) => "NDB_OUT_OF_BOUNDS",
            DataError::SizeMismatch { .. } => "NDB_SIZE_MISMATCH",
            DataError::InvalidArgument(_) => "NDB_INVALID_ARGUMENT",
            DataError::NotFound(_) => "NDB_NOT_FOUND",
            DataError::InvalidUnit(_) => "NDB_INVALID_UNIT",
            DataError::TypeMismatch { .. } => "NDB_TYPE_MISMATCH",
            DataError::AlreadyExists(_) => "NDB_ALREADY_EXISTS",
            DataError::ReadOnly => "NDB_READ_ONLY",
            DataError::Store(_) => "NDB_STORE_FAILED",
        }
    }

    /// Whether the error originates in the persistent store rather than
    /// in the caller's arguments
    pub fn is_store_failure(&self) -> bool {
        matches!(self, DataError::Store(_))
    }
}
