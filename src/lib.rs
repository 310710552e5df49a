pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{BackupDocument, DataService, InitReport, RestoreReport};
pub use domain::model::{Record, Table, TableRecord, TypedTable};
pub use domain::{ConnectionMode, ConnectionStatus, Query, RetryPolicy};
pub use error::{DataError, Result};
pub use infra::config::DataLayerConfig;
pub use storage::{KeyValueStore, LocalCache, MemoryKeyValueStore, SqliteKeyValueStore};
