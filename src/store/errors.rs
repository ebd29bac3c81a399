//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by fact sources and record stores
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "QC_STORE_IO",
            StoreError::Corrupt(_) => "QC_STORE_CORRUPT",
            StoreError::Conflict(_) => "QC_STORE_CONFLICT",
            StoreError::Unavailable(_) => "QC_STORE_UNAVAILABLE",
            StoreError::InvalidKey(_) => "QC_STORE_INVALID_KEY",
        }
    }

    pub(crate) fn lock_poisoned() -> Self {
        StoreError::Unavailable("Lock poisoned".to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
