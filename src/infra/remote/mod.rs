//! The remote table store the data service talks to when online.

pub mod error;
pub mod rest;

pub use error::{RemoteError, RemoteErrorKind, RemoteResult};
pub use rest::{RestConfig, RestConnector, RestRemoteStore};

use crate::domain::model::{Record, Table};
use crate::domain::query::Query;
use async_trait::async_trait;
use std::sync::Arc;

/// Table-oriented query API of the remote store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Record>>;

    /// Inserts one or many rows, returning them as stored.
    async fn insert(&self, table: Table, rows: &[Record]) -> RemoteResult<Vec<Record>>;

    /// Updates a row by id, returning it as stored. `NotFound` if no row matched.
    async fn update(&self, table: Table, id: &str, patch: &Record) -> RemoteResult<Record>;

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()>;

    /// Trivial query proving the table exists.
    async fn probe(&self, table: Table) -> RemoteResult<()> {
        self.select(table, &Query::new().limit(1)).await.map(|_| ())
    }
}

/// Builds remote clients. Split from `RemoteStore` because reachability and
/// client construction are separate initialization steps.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Basic network reachability of the remote endpoint.
    async fn probe_network(&self) -> bool;

    async fn connect(&self) -> RemoteResult<Arc<dyn RemoteStore>>;
}

/// Connector for deployments without a remote: always offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineConnector;

#[async_trait]
impl RemoteConnector for OfflineConnector {
    async fn probe_network(&self) -> bool {
        false
    }

    async fn connect(&self) -> RemoteResult<Arc<dyn RemoteStore>> {
        Err(RemoteError::transient("no remote store configured"))
    }
}
