use alloy_primitives::hex::FromHexError;
use create3::Create3Error;

/// Error types of the create3 commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Deployment protocol error
    #[error("Deployment error: {0}")]
    Create3(#[from] Create3Error),

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// Invalid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for the create3 commands
pub type Result<T> = std::result::Result<T, CliError>;
