//! Error types for the node cache.
//!
//! `StorageError` covers the embedded store and its adapter. `ApiError` is what
//! configuration, the project accessor and the CLI surface to callers.

use thiserror::Error;

/// Errors raised by the embedded node store and its adapter
#[derive(Debug, Error)]
pub enum StorageError {
    /// Initialization failed on every attempt
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Secondary index lookup failed; callers fall back to a full scan
    #[error("Secondary index unavailable: {0}")]
    IndexUnavailable(String),

    /// Concurrent transaction touched the same keys; sled retries these
    #[error("Transaction conflict")]
    TransactionConflict,

    #[error("Invalid record {key}: {reason}")]
    InvalidRecord { key: String, reason: String },
}

/// Errors surfaced by configuration, project accessors and tooling
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Import error: {0}")]
    ImportError(String),

    /// A cache operation reported failure; details are in the log
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for ApiError {
    fn from(err: sled::Error) -> Self {
        ApiError::StorageError(StorageError::Database(err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::StorageError(StorageError::Serialization(err))
    }
}
