pub mod backup;
pub mod data_service;
pub mod pending;
pub mod summaries;
pub mod tables;

pub use backup::{BackupDocument, RestoreReport, TableRestoreStats, BACKUP_VERSION};
pub use data_service::{DataService, InitReport, TableSyncStats};
pub use summaries::{AttendanceCounts, CustomerStatement, DashboardStats, EmployeeSummary};
pub use tables::Filters;
