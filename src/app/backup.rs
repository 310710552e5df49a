//! Whole-dataset backup and destructive restore.
//!
//! Restore is not transactional: a failure partway through leaves the table
//! being restored partially replaced, and the error is returned to the caller.

use crate::app::data_service::DataService;
use crate::domain::model::{now_timestamp, record_id, Record, Table};
use crate::domain::query::Query;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};
use utoipa::ToSchema;

pub const BACKUP_VERSION: u32 = 1;

/// Every registered table, read in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackupDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    /// Table name to its records.
    #[schema(value_type = Object)]
    pub tables: BTreeMap<String, Vec<Record>>,
}

fn default_version() -> u32 {
    BACKUP_VERSION
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TableRestoreStats {
    pub table: String,
    pub deleted: usize,
    pub requested: usize,
    pub restored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RestoreReport {
    pub tables: Vec<TableRestoreStats>,
}

impl RestoreReport {
    pub fn restored(&self) -> usize {
        self.tables.iter().map(|t| t.restored).sum()
    }
}

impl DataService {
    pub async fn create_backup(&self) -> Result<BackupDocument> {
        let mut tables = BTreeMap::new();
        for table in Table::ALL {
            let records = self.read(table, Query::new()).await?;
            tables.insert(table.to_string(), records);
        }

        let doc = BackupDocument {
            version: BACKUP_VERSION,
            created_at: now_timestamp(),
            tables,
        };
        info!(
            records = doc.tables.values().map(Vec::len).sum::<usize>(),
            "backup created"
        );
        Ok(doc)
    }

    /// Replaces every table present in `doc` with the document's records.
    ///
    /// All table names are validated before anything is deleted.
    pub async fn restore_backup(&self, doc: &BackupDocument) -> Result<RestoreReport> {
        let plan = doc
            .tables
            .iter()
            .map(|(name, records)| Ok((Table::parse(name)?, records)))
            .collect::<Result<Vec<(Table, &Vec<Record>)>>>()?;

        let mut report = RestoreReport::default();
        for (table, records) in plan {
            let mut stats = TableRestoreStats {
                table: table.to_string(),
                requested: records.len(),
                ..Default::default()
            };

            let current = self.read(table, Query::new()).await?;
            for record in &current {
                let Some(id) = record_id(record) else {
                    warn!(table = %table, "record without id left in place during restore");
                    continue;
                };
                self.delete(table, &id).await?;
                stats.deleted += 1;
            }

            let restored = self.bulk_create(table, records.clone()).await?;
            stats.restored = restored.len();
            if stats.restored < stats.requested {
                warn!(
                    table = %table,
                    requested = stats.requested,
                    restored = stats.restored,
                    "some records could not be restored"
                );
            }
            report.tables.push(stats);
        }

        info!(records = report.restored(), "backup restored");
        Ok(report)
    }
}
