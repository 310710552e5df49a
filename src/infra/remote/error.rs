//! Remote failure classification.
//!
//! The kind is decided where the response is decoded (the REST client), so the
//! data service only ever matches on `RemoteErrorKind`.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// "relation does not exist": retrying will not create the table.
    TableMissing,
    /// Update targeted a row the remote table does not have.
    NotFound,
    /// Network, auth, rate limit, schema mismatch, anything else.
    Transient,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteErrorKind::TableMissing => "table missing",
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::Transient => "transient",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Remote error ({kind}): {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn table_missing(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::TableMissing, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transient, message)
    }

    pub fn is_table_missing(&self) -> bool {
        self.kind == RemoteErrorKind::TableMissing
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::transient(e.to_string())
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
