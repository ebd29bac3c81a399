//! CLI errors
//!
//! A CLI error ends the process, except `InvalidRequest`, which only
//! fails the one request line. Engine errors never end the process.

use std::io;

use thiserror::Error;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Io(String),

    #[error("Data directory already initialized")]
    AlreadyInitialized,

    #[error("Data directory not initialized. Run 'quarterclose init' first.")]
    NotInitialized,

    #[error("{0}")]
    Boot(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl CliError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "QC_CLI_CONFIG_ERROR",
            CliError::Io(_) => "QC_CLI_IO_ERROR",
            CliError::AlreadyInitialized => "QC_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized => "QC_CLI_NOT_INITIALIZED",
            CliError::Boot(_) => "QC_CLI_BOOT_FAILED",
            CliError::InvalidRequest(_) => "QC_INVALID_REQUEST",
        }
    }

    /// Whether the serving loop can keep going after this error
    pub fn is_request_scoped(&self) -> bool {
        matches!(self, CliError::InvalidRequest(_))
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidRequest(format!("JSON error: {}", e))
    }
}
