//! The offline-first Data Service.
//!
//! This module sits between the application and its two stores:
//! 1.  The remote table store (used while online, per table, unless the table
//!     is known to be missing remotely).
//! 2.  The local cache (used when offline, for missing tables, and as the
//!     fallback when remote retries are exhausted).
//!
//! Every write is sanitized against the table whitelist before it reaches
//! either store, so both hold data shaped like the remote schema.

use crate::app::pending::{PendingOperation, PendingQueue};
use crate::domain::connection::{ConnectionHandle, ConnectionMode, ConnectionStatus};
use crate::domain::model::{
    record_id, sanitize, stamp_new, stamp_update, IntoTable, Record, Table, TypedTable,
};
use crate::domain::query::Query;
use crate::domain::retry::{RetryOutcome, RetryPolicy};
use crate::error::{DataError, Result};
use crate::infra::config::DataLayerConfig;
use crate::infra::remote::{
    OfflineConnector, RemoteConnector, RemoteErrorKind, RemoteResult, RemoteStore, RestConnector,
};
use crate::storage::{KeyValueStore, LocalCache, SqliteKeyValueStore};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{oneshot, watch, Mutex};
use tracing::{debug, error, info, warn};

/// Outcome of migrating one table's cached records during initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSyncStats {
    pub table: String,
    pub attempted: usize,
    pub migrated: usize,
    pub already_remote: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitReport {
    pub status: ConnectionStatus,
    pub synced: Vec<TableSyncStats>,
    pub pending_drained: usize,
    /// False when `initialize` had already run and this call was a no-op.
    pub performed: bool,
}

struct Inner {
    connector: Arc<dyn RemoteConnector>,
    remote: RwLock<Option<Arc<dyn RemoteStore>>>,
    local: LocalCache,
    connection: ConnectionHandle,
    retry: RetryPolicy,
    pending: PendingQueue,
    init_lock: Mutex<()>,
}

/// Cheap-to-clone handle; clones share all state.
#[derive(Clone)]
pub struct DataService {
    inner: Arc<Inner>,
}

impl DataService {
    pub fn new(connector: Arc<dyn RemoteConnector>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_retry_policy(connector, store, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        connector: Arc<dyn RemoteConnector>,
        store: Arc<dyn KeyValueStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                remote: RwLock::new(None),
                local: LocalCache::new(store),
                connection: ConnectionHandle::new(),
                retry,
                pending: PendingQueue::new(),
                init_lock: Mutex::new(()),
            }),
        }
    }

    /// Builds the service from configuration: SQLite local store, REST remote
    /// when `REMOTE_URL` is set, offline-only otherwise.
    pub async fn from_config(config: &DataLayerConfig) -> Result<Self> {
        let store = SqliteKeyValueStore::connect(&config.local_store_url).await?;
        let connector: Arc<dyn RemoteConnector> = match config.rest_config() {
            Some(rest) => Arc::new(RestConnector::new(rest)),
            None => {
                info!("REMOTE_URL not set; data service will run offline-only");
                Arc::new(OfflineConnector)
            }
        };
        Ok(Self::with_retry_policy(
            connector,
            Arc::new(store),
            config.retry_policy(),
        ))
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.pending.is_closed()
    }

    pub fn connection(&self) -> ConnectionHandle {
        self.inner.connection.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.connection.snapshot()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.connection.subscribe()
    }

    pub fn local_cache(&self) -> &LocalCache {
        &self.inner.local
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    pub fn pending_operations(&self) -> usize {
        self.inner.pending.len()
    }

    fn remote_client(&self) -> Option<Arc<dyn RemoteStore>> {
        self.inner
            .remote
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_remote_client(&self, remote: Option<Arc<dyn RemoteStore>>) {
        *self
            .inner
            .remote
            .write()
            .unwrap_or_else(PoisonError::into_inner) = remote;
    }

    /// Forces online mode. Only possible once a remote client exists.
    pub fn force_online(&self) -> bool {
        if self.remote_client().is_none() {
            warn!("force_online requested but no remote client has been constructed");
            return false;
        }
        if !self.inner.connection.promote_online() {
            // Already online: still tell observers the request was honoured.
            self.inner.connection.publish();
        }
        info!("connection mode forced online");
        true
    }

    // ---------------------------------------------------------------------
    // Initialization
    // ---------------------------------------------------------------------

    /// Connects, probes every table, migrates cached records, drains queued
    /// operations and publishes the resulting status. Idempotent.
    pub async fn initialize(&self) -> Result<InitReport> {
        let _guard = self.inner.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(InitReport {
                status: self.status(),
                synced: Vec::new(),
                pending_drained: 0,
                performed: false,
            });
        }

        info!("initializing data service");
        self.inner.connection.clear_missing();

        let mut synced = Vec::new();
        if let Some(remote) = self.connect_remote().await {
            self.probe_tables(&remote).await;
            synced = self.sync_local_to_remote(&remote).await;
        }

        let pending = self.inner.pending.close();
        let pending_drained = pending.len();
        if pending_drained > 0 {
            info!(count = pending_drained, "draining operations queued before initialization");
        }
        for op in pending {
            debug!(operation = %op.label, "running queued operation");
            (op.run)().await;
        }

        self.inner.connection.publish();
        let status = self.status();
        info!(
            mode = ?status.mode,
            missing_tables = status.missing_tables.len(),
            "data service initialized"
        );

        Ok(InitReport {
            status,
            synced,
            pending_drained,
            performed: true,
        })
    }

    /// Reachability probe, client construction and verification query.
    async fn connect_remote(&self) -> Option<Arc<dyn RemoteStore>> {
        if !self.inner.connector.probe_network().await {
            warn!("remote store unreachable; starting in offline mode");
            self.set_remote_client(None);
            self.inner.connection.set_mode(ConnectionMode::Offline);
            return None;
        }

        let remote = match self.inner.connector.connect().await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "failed to construct remote client; starting in offline mode");
                self.set_remote_client(None);
                self.inner.connection.set_mode(ConnectionMode::Offline);
                return None;
            }
        };

        // A missing table still proves the connection works. Other failures are
        // tolerated too: we hold a constructed client, and verification hiccups
        // are common.
        match remote.probe(Table::Users).await {
            Ok(()) => debug!("remote verification query succeeded"),
            Err(e) if e.is_table_missing() => {
                debug!(error = %e, "verification table missing; connection is working")
            }
            Err(e) => warn!(error = %e, "remote verification failed; keeping the constructed client online"),
        }

        self.set_remote_client(Some(remote.clone()));
        self.inner.connection.set_mode(ConnectionMode::Online);
        Some(remote)
    }

    async fn probe_tables(&self, remote: &Arc<dyn RemoteStore>) {
        for table in Table::ALL {
            match remote.probe(table).await {
                Ok(()) => debug!(table = %table, "remote table available"),
                Err(e) if e.is_table_missing() => {
                    self.inner.connection.mark_missing(table);
                    warn!(table = %table, "remote table missing; it will be served from the local cache");
                }
                // Flaky networks must not produce false "missing" verdicts.
                Err(e) => warn!(table = %table, error = %e, "table probe failed; assuming it exists"),
            }
        }
    }

    /// One-shot, best-effort push of cached records. Each table's cache is
    /// cleared after all its records were attempted, whatever their outcome.
    /// Tables missing remotely keep their cache: it is their only copy.
    async fn sync_local_to_remote(&self, remote: &Arc<dyn RemoteStore>) -> Vec<TableSyncStats> {
        let mut report = Vec::new();

        for table in Table::ALL {
            if self.inner.connection.is_missing(table) {
                continue;
            }
            let records = match self.inner.local.load(table).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(table = %table, error = %e, "cannot read local cache for sync");
                    continue;
                }
            };
            if records.is_empty() {
                continue;
            }

            let mut stats = TableSyncStats {
                table: table.to_string(),
                attempted: records.len(),
                ..Default::default()
            };

            for record in records {
                let Some(id) = record_id(&record) else {
                    stats.failed += 1;
                    warn!(table = %table, "cached record without id skipped during sync");
                    continue;
                };

                match remote.select(table, &Query::by_id(&id)).await {
                    Ok(rows) if !rows.is_empty() => {
                        stats.already_remote += 1;
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        stats.failed += 1;
                        warn!(table = %table, id = %id, error = %e, "sync existence check failed");
                        continue;
                    }
                }

                let row = sanitize(table, &record);
                match remote.insert(table, std::slice::from_ref(&row)).await {
                    Ok(_) => stats.migrated += 1,
                    Err(e) => {
                        stats.failed += 1;
                        warn!(table = %table, id = %id, error = %e, "failed to sync cached record");
                    }
                }
            }

            if let Err(e) = self.inner.local.clear(table).await {
                warn!(table = %table, error = %e, "failed to clear local cache after sync");
            }
            info!(
                table = %table,
                migrated = stats.migrated,
                already_remote = stats.already_remote,
                failed = stats.failed,
                "local cache synced to remote"
            );
            report.push(stats);
        }

        report
    }

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------

    /// Runs `op` now if initialized, otherwise queues it and waits for the drain.
    async fn run_or_defer<T, F, Fut>(&self, label: String, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(DataService) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if self.is_initialized() {
            return op(self.clone()).await;
        }

        let (tx, rx) = oneshot::channel();
        let service = self.clone();
        let op_label = label.clone();
        let pending = PendingOperation {
            label: label.clone(),
            run: Box::new(move || {
                Box::pin(async move {
                    let result = op(service).await;
                    if let Err(ref e) = result {
                        warn!(operation = %op_label, error = %e, "queued operation failed");
                    }
                    let _ = tx.send(result);
                })
            }),
        };

        match self.inner.pending.push(pending) {
            Ok(()) => debug!(operation = %label, "operation queued until initialization"),
            // The drain started between our check and the push.
            Err(op) => (op.run)().await,
        }
        rx.await.map_err(|_| DataError::Cancelled)?
    }

    /// Attempts `op` remotely with retries. `Ok(None)` means "serve locally".
    async fn try_remote<T, F, Fut>(&self, table: Table, action: &'static str, op: F) -> Result<Option<T>>
    where
        F: Fn(Arc<dyn RemoteStore>) -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        if !self.inner.connection.should_use_remote(table) {
            return Ok(None);
        }
        let Some(remote) = self.remote_client() else {
            return Ok(None);
        };

        let connection = self.inner.connection.clone();
        let outcome = self
            .inner
            .retry
            .run(|| op(remote.clone()), || connection.should_use_remote(table))
            .await;

        match outcome {
            RetryOutcome::Success(value) => Ok(Some(value)),
            RetryOutcome::TableMissing(e) => {
                if connection.mark_missing(table) {
                    warn!(table = %table, action, error = %e, "remote table missing; falling back to local cache");
                }
                Ok(None)
            }
            RetryOutcome::Rejected(e) => Err(DataError::Remote(e)),
            RetryOutcome::Exhausted(e) => {
                error!(
                    table = %table,
                    action,
                    retries = self.inner.retry.max_retries,
                    error = %e,
                    "remote retries exhausted; switching to offline mode"
                );
                connection.demote_offline();
                Ok(None)
            }
            RetryOutcome::Abandoned(e) => {
                debug!(table = %table, action, error = %e, "remote no longer usable; falling back to local cache");
                Ok(None)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Generic verbs
    // ---------------------------------------------------------------------

    pub async fn create(&self, table: impl IntoTable, data: Record) -> Result<Record> {
        let table = table.into_table()?;
        self.run_or_defer(format!("create {}", table), move |svc| async move {
            svc.create_now(table, data).await
        })
        .await
    }

    pub async fn read(&self, table: impl IntoTable, query: Query) -> Result<Vec<Record>> {
        let table = table.into_table()?;
        self.run_or_defer(format!("read {}", table), move |svc| async move {
            svc.read_now(table, query).await
        })
        .await
    }

    pub async fn update(&self, table: impl IntoTable, id: &str, data: Record) -> Result<Record> {
        let table = table.into_table()?;
        let id = id.to_string();
        self.run_or_defer(format!("update {}", table), move |svc| async move {
            svc.update_now(table, &id, data).await
        })
        .await
    }

    pub async fn delete(&self, table: impl IntoTable, id: &str) -> Result<()> {
        let table = table.into_table()?;
        let id = id.to_string();
        self.run_or_defer(format!("delete {}", table), move |svc| async move {
            svc.delete_now(table, &id).await
        })
        .await
    }

    /// Batched create with per-item fallback. Items that fail individually are
    /// logged and left out of the result.
    pub async fn bulk_create(&self, table: impl IntoTable, items: Vec<Record>) -> Result<Vec<Record>> {
        let table = table.into_table()?;
        self.run_or_defer(format!("bulk create {}", table), move |svc| async move {
            Ok(svc.bulk_create_now(table, items).await)
        })
        .await
    }

    /// Reads a table and decodes its rows into the table's typed view.
    pub async fn read_typed<T: TypedTable>(&self, query: Query) -> Result<Vec<T>> {
        self.read(T::TABLE, query)
            .await?
            .into_iter()
            .map(T::from_record)
            .collect()
    }

    async fn create_now(&self, table: Table, data: Record) -> Result<Record> {
        let record = stamp_new(table, &data);

        let inserted = self
            .try_remote(table, "create", |remote| {
                let row = record.clone();
                async move { remote.insert(table, std::slice::from_ref(&row)).await }
            })
            .await?;

        match inserted {
            Some(rows) => Ok(rows.into_iter().next().unwrap_or(record)),
            None => self.inner.local.insert(table, record).await,
        }
    }

    async fn read_now(&self, table: Table, query: Query) -> Result<Vec<Record>> {
        let query_ref = &query;
        let rows = self
            .try_remote(table, "read", |remote| async move {
                remote.select(table, query_ref).await
            })
            .await?;

        match rows {
            Some(rows) => {
                // A live success outweighs an earlier demotion.
                if self.inner.connection.promote_online() {
                    info!(table = %table, "remote read succeeded; back online");
                }
                Ok(rows)
            }
            None => self.inner.local.read(table, &query).await,
        }
    }

    async fn update_now(&self, table: Table, id: &str, data: Record) -> Result<Record> {
        let patch = stamp_update(table, &data);
        let patch_ref = &patch;

        let updated = self
            .try_remote(table, "update", |remote| async move {
                remote.update(table, id, patch_ref).await
            })
            .await;

        match updated {
            Ok(Some(row)) => Ok(row),
            Ok(None) => self.inner.local.apply_patch(table, id, patch).await,
            Err(DataError::Remote(e)) if e.kind == RemoteErrorKind::NotFound => {
                Err(DataError::NotFound {
                    table: table.to_string(),
                    id: id.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_now(&self, table: Table, id: &str) -> Result<()> {
        let deleted = self
            .try_remote(table, "delete", |remote| async move { remote.delete(table, id).await })
            .await?;

        if deleted.is_none() {
            let removed = self.inner.local.delete(table, id).await?;
            if !removed {
                debug!(table = %table, id, "delete of absent local record ignored");
            }
        }
        Ok(())
    }

    async fn bulk_create_now(&self, table: Table, items: Vec<Record>) -> Vec<Record> {
        if items.is_empty() {
            return Vec::new();
        }

        if self.inner.connection.should_use_remote(table) {
            if let Some(remote) = self.remote_client() {
                let rows: Vec<Record> = items.iter().map(|item| stamp_new(table, item)).collect();
                match remote.insert(table, &rows).await {
                    Ok(inserted) => {
                        info!(table = %table, count = inserted.len(), "bulk insert succeeded");
                        return inserted;
                    }
                    Err(e) if e.is_table_missing() => {
                        self.inner.connection.mark_missing(table);
                        warn!(table = %table, error = %e, "remote table missing; bulk create falls back to per-item create");
                    }
                    Err(e) => {
                        warn!(table = %table, error = %e, "bulk insert failed; falling back to per-item create")
                    }
                }
            }
        }

        let mut created = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match self.create_now(table, item).await {
                Ok(record) => created.push(record),
                Err(e) => warn!(table = %table, index, error = %e, "bulk item failed; skipped"),
            }
        }
        created
    }
}
