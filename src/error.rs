//! Error types for the triage core.

use thiserror::Error;

/// Errors reported by a media store adapter.
///
/// Payloads are strings so the error can be cloned into UI messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Catalog database error: {0}")]
    Database(String),

    #[error("Invalid pagination token: {0}")]
    InvalidToken(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Join(err.to_string())
    }
}

/// Errors captured in the feed manager's error slot.
///
/// All of them are recoverable by retrying the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    #[error("Cannot read the media store: {0}")]
    Permission(String),

    #[error("Page load failed: {0}")]
    Fetch(StoreError),

    #[error("Batch delete failed: {0}")]
    Delete(StoreError),
}

/// Errors raised while loading settings or installing the log subscriber.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid log directive: {0}")]
    LogFilter(String),

    #[error("Logging already initialized: {0}")]
    LogInit(String),
}
