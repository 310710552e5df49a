//! Error types surfaced by the data layer.
//!
//! Remote-side failures are absorbed by the fallback path and normally never
//! reach a caller; the variants here are the ones that do.

use crate::infra::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// Table name outside the registry. Never retried, never falls back.
    #[error("Unknown table: '{0}'")]
    InvalidTable(String),

    /// Update referenced an id absent from the local cache (or the remote table).
    #[error("Record '{id}' not found in {table}")]
    NotFound { table: String, id: String },

    /// Create with an id that already exists in the local partition.
    #[error("Record '{id}' already exists in {table}")]
    DuplicateId { table: String, id: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Local persistent store failure.
    #[error("Local store error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A queued operation was dropped before initialization drained it.
    #[error("Operation cancelled before the data service finished initializing")]
    Cancelled,
}

impl From<sqlx::Error> for DataError {
    fn from(e: sqlx::Error) -> Self {
        DataError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
