//! # Persistent Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    // Buffer errors
    #[error("Buffer not found: {0}")]
    BufferNotFound(String),

    #[error("Buffer already exists: {0}")]
    BufferExists(String),

    #[error("Byte range {offset}+{len} outside buffer '{key}' of {size} bytes")]
    OutOfRange {
        key: String,
        offset: u64,
        len: usize,
        size: u64,
    },

    #[error("Region shape {actual} does not match buffer shape {expected}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Buffer of shape {shape} with {width}-byte elements is too large")]
    TooLarge { shape: String, width: usize },

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Corrupt container: {0}")]
    Corrupt(String),

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::IoError(e.to_string())
    }
}

impl StoreError {
    /// Integrity failures mean the persisted data cannot be trusted
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, StoreError::Corrupt(_) | StoreError::ChecksumMismatch)
    }
}
