//! Table-partitioned offline cache: one JSON array of records per table name.
//!
//! Every mutation reads the table's whole array, changes it, and writes the
//! whole array back. Mutations of the same table are serialized; different
//! tables never contend.

use crate::domain::model::{
    record_id, stamp_new, stamp_update, Record, Table, ID_FIELD,
};
use crate::domain::query::Query;
use crate::error::{DataError, Result};
use crate::storage::kv::KeyValueStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
    write_locks: Arc<HashMap<Table, Mutex<()>>>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let write_locks = Table::ALL.iter().map(|t| (*t, Mutex::new(()))).collect();
        Self {
            store,
            write_locks: Arc::new(write_locks),
        }
    }

    async fn lock(&self, table: Table) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match self.write_locks.get(&table) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    /// The table's full array; an absent key is an empty table.
    pub async fn load(&self, table: Table) -> Result<Vec<Record>> {
        match self.store.get(table.as_str()).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn save(&self, table: Table, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.store.set(table.as_str(), raw).await
    }

    pub async fn clear(&self, table: Table) -> Result<()> {
        let _guard = self.lock(table).await;
        self.store.remove(table.as_str()).await
    }

    pub async fn count(&self, table: Table) -> Result<usize> {
        Ok(self.load(table).await?.len())
    }

    /// Sanitizes and stamps `data`, then appends it.
    pub async fn create(&self, table: Table, data: &Record) -> Result<Record> {
        self.insert(table, stamp_new(table, data)).await
    }

    /// Appends an already stamped record. Fails if its id is taken.
    pub async fn insert(&self, table: Table, record: Record) -> Result<Record> {
        let id = record_id(&record).ok_or_else(|| {
            DataError::InvalidPayload(format!("record for {} has no id", table))
        })?;

        let _guard = self.lock(table).await;
        let mut records = self.load(table).await?;
        if records.iter().any(|r| record_id(r).as_deref() == Some(id.as_str())) {
            return Err(DataError::DuplicateId {
                table: table.to_string(),
                id,
            });
        }
        records.push(record.clone());
        self.save(table, &records).await?;
        Ok(record)
    }

    pub async fn read(&self, table: Table, query: &Query) -> Result<Vec<Record>> {
        let records = self.load(table).await?;
        Ok(query.apply(&records))
    }

    pub async fn get(&self, table: Table, id: &str) -> Result<Option<Record>> {
        let records = self.load(table).await?;
        Ok(records
            .into_iter()
            .find(|r| record_id(r).as_deref() == Some(id)))
    }

    /// Sanitizes `data` and merges it over the stored record.
    pub async fn update(&self, table: Table, id: &str, data: &Record) -> Result<Record> {
        self.apply_patch(table, id, stamp_update(table, data)).await
    }

    /// Merges an already prepared patch. `NotFound` if the id is absent.
    pub async fn apply_patch(&self, table: Table, id: &str, patch: Record) -> Result<Record> {
        let _guard = self.lock(table).await;
        let mut records = self.load(table).await?;
        let existing = records
            .iter_mut()
            .find(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| DataError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in patch {
            if key != ID_FIELD {
                existing.insert(key, value);
            }
        }
        let updated = existing.clone();
        self.save(table, &records).await?;
        Ok(updated)
    }

    /// Removes by id. Removing an absent id is not an error; returns whether a
    /// record was removed.
    pub async fn delete(&self, table: Table, id: &str) -> Result<bool> {
        let _guard = self.lock(table).await;
        let mut records = self.load(table).await?;
        let before = records.len();
        records.retain(|r| record_id(r).as_deref() != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.save(table, &records).await?;
        Ok(true)
    }
}
