//! CLI-specific error types

use std::fmt;
use std::io;

use crate::errors::DataError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Container already exists
    AlreadyInitialized,
    /// No container in the data directory
    NotInitialized,
    /// Named block or array does not exist
    NotFound,
    /// Data model operation failed
    DataFailure,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "NDB_CLI_CONFIG_ERROR",
            Self::IoError => "NDB_CLI_IO_ERROR",
            Self::AlreadyInitialized => "NDB_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "NDB_CLI_NOT_INITIALIZED",
            Self::NotFound => "NDB_CLI_NOT_FOUND",
            Self::DataFailure => "NDB_CLI_DATA_FAILURE",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already holds a container",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory holds no container. Run 'ndblock init' first.",
        )
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(CliErrorCode::NotFound, what)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<DataError> for CliError {
    fn from(e: DataError) -> Self {
        Self::new(CliErrorCode::DataFailure, format!("{} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
