//! Error types for advperm

use thiserror::Error;

/// The main error type for advperm operations
#[derive(Debug, Error)]
pub enum AdvPermError {
    #[error("Store not initialized")]
    NotInitialized,

    #[error("Already init at {0}")]
    AlreadyInitialized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid member reference: {0}")]
    InvalidMember(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Permission rule {0} not found")]
    RuleNotFound(u64),
}

/// Result type alias for advperm operations
pub type Result<T> = std::result::Result<T, AdvPermError>;
