//! Shared test support: a scriptable in-memory remote store and connector.

#![allow(dead_code)]

use async_trait::async_trait;
use bizdata_sync::domain::model::record_id;
use bizdata_sync::infra::remote::{RemoteConnector, RemoteError, RemoteResult, RemoteStore};
use bizdata_sync::{DataService, MemoryKeyValueStore, Query, Record, RetryPolicy, Table};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory stand-in for the remote table API.
///
/// Tables can be scripted to be missing ("relation does not exist") or to fail
/// with transient errors. Every call is counted per table.
#[derive(Default)]
pub struct MockRemote {
    rows: Mutex<HashMap<Table, Vec<Record>>>,
    missing: Mutex<HashSet<Table>>,
    failing: Mutex<HashSet<Table>>,
    failing_ids: Mutex<HashSet<String>>,
    fail_batches: AtomicBool,
    calls: Mutex<HashMap<Table, usize>>,
    total_calls: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_missing(tables: &[Table]) -> Arc<Self> {
        let remote = Self::new();
        for table in tables {
            remote.set_missing(*table, true);
        }
        remote
    }

    pub fn set_missing(&self, table: Table, missing: bool) {
        let mut set = self.missing.lock().unwrap();
        if missing {
            set.insert(table);
        } else {
            set.remove(&table);
        }
    }

    /// Every call on `table` fails with a transient error.
    pub fn set_failing(&self, table: Table, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(table);
        } else {
            set.remove(&table);
        }
    }

    /// Inserts containing a row with this id fail with a transient error.
    pub fn fail_inserts_of(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    /// Multi-row inserts fail with a transient error.
    pub fn fail_batches(&self) {
        self.fail_batches.store(true, Ordering::SeqCst);
    }

    pub fn seed(&self, table: Table, records: Vec<Record>) {
        self.rows
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .extend(records);
    }

    pub fn rows(&self, table: Table) -> Vec<Record> {
        self.rows
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn ids(&self, table: Table) -> Vec<String> {
        self.rows(table).iter().filter_map(record_id).collect()
    }

    pub fn calls_for(&self, table: Table) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&table)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, table: Table) -> RemoteResult<()> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(table).or_default() += 1;

        if self.missing.lock().unwrap().contains(&table) {
            return Err(RemoteError::table_missing(format!(
                "relation \"public.{}\" does not exist",
                table
            )));
        }
        if self.failing.lock().unwrap().contains(&table) {
            return Err(RemoteError::transient("request timed out"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Record>> {
        self.enter(table)?;
        Ok(query.apply(&self.rows(table)))
    }

    async fn insert(&self, table: Table, rows: &[Record]) -> RemoteResult<Vec<Record>> {
        self.enter(table)?;
        if rows.len() > 1 && self.fail_batches.load(Ordering::SeqCst) {
            return Err(RemoteError::transient("batch insert rejected"));
        }
        {
            let failing_ids = self.failing_ids.lock().unwrap();
            if rows
                .iter()
                .filter_map(record_id)
                .any(|id| failing_ids.contains(&id))
            {
                return Err(RemoteError::transient("insert timed out"));
            }
        }

        let mut all = self.rows.lock().unwrap();
        let stored = all.entry(table).or_default();
        for row in rows {
            let id = record_id(row);
            if stored.iter().any(|r| record_id(r) == id) {
                return Err(RemoteError::transient(
                    "duplicate key value violates unique constraint",
                ));
            }
        }
        stored.extend(rows.iter().cloned());
        Ok(rows.to_vec())
    }

    async fn update(&self, table: Table, id: &str, patch: &Record) -> RemoteResult<Record> {
        self.enter(table)?;
        let mut all = self.rows.lock().unwrap();
        let stored = all.entry(table).or_default();
        let row = stored
            .iter_mut()
            .find(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| RemoteError::not_found(format!("no row '{}' in {}", id, table)))?;
        for (key, value) in patch {
            row.insert(key.clone(), value.clone());
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        self.enter(table)?;
        let mut all = self.rows.lock().unwrap();
        if let Some(stored) = all.get_mut(&table) {
            stored.retain(|r| record_id(r).as_deref() != Some(id));
        }
        Ok(())
    }
}

/// Hands out a shared `MockRemote`, or simulates an unreachable endpoint.
pub struct MockConnector {
    pub remote: Arc<MockRemote>,
    pub reachable: bool,
    pub connect_fails: bool,
    pub connects: AtomicUsize,
}

impl MockConnector {
    pub fn online(remote: Arc<MockRemote>) -> Arc<Self> {
        Arc::new(Self {
            remote,
            reachable: true,
            connect_fails: false,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            remote: MockRemote::new(),
            reachable: false,
            connect_fails: false,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn broken_client(remote: Arc<MockRemote>) -> Arc<Self> {
        Arc::new(Self {
            remote,
            reachable: true,
            connect_fails: true,
            connects: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RemoteConnector for MockConnector {
    async fn probe_network(&self) -> bool {
        self.reachable
    }

    async fn connect(&self) -> RemoteResult<Arc<dyn RemoteStore>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.connect_fails {
            return Err(RemoteError::transient("client library failed to load"));
        }
        let remote: Arc<dyn RemoteStore> = self.remote.clone();
        Ok(remote)
    }
}

/// Three retries, 1ms backoff unit.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

pub fn service_with(connector: Arc<MockConnector>, store: MemoryKeyValueStore) -> DataService {
    DataService::with_retry_policy(connector, Arc::new(store), fast_retry())
}

/// Initialized service talking to `remote`.
pub async fn online_service(remote: Arc<MockRemote>) -> DataService {
    let service = service_with(MockConnector::online(remote), MemoryKeyValueStore::new());
    service.initialize().await.unwrap();
    service
}

/// Initialized service with no reachable remote.
pub async fn offline_service() -> DataService {
    let service = service_with(MockConnector::unreachable(), MemoryKeyValueStore::new());
    service.initialize().await.unwrap();
    service
}

/// Builds a record from a `json!` object literal.
pub fn record(value: JsonValue) -> Record {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().filter_map(record_id).collect()
}
