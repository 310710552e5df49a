//! Shared connection state: online/offline mode and the missing-table set.
//!
//! One `ConnectionHandle` is owned by the data service and can be cloned out to
//! anything that needs to observe the mode (e.g. a status indicator).

use crate::domain::model::{now_timestamp, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Not yet determined (before the first initialization).
    #[default]
    Unknown,
    Online,
    Offline,
}

#[derive(Debug, Default)]
pub struct ConnectionState {
    pub mode: ConnectionMode,
    pub missing_tables: BTreeSet<Table>,
}

impl ConnectionState {
    pub fn is_online(&self) -> bool {
        self.mode == ConnectionMode::Online
    }

    /// Remote is attempted only while online and for tables not known missing.
    pub fn should_use_remote(&self, table: Table) -> bool {
        self.is_online() && !self.missing_tables.contains(&table)
    }
}

/// Snapshot published to status observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub mode: ConnectionMode,
    pub missing_tables: Vec<Table>,
    pub changed_at: String,
}

impl ConnectionStatus {
    pub fn is_online(&self) -> bool {
        self.mode == ConnectionMode::Online
    }
}

#[derive(Clone)]
pub struct ConnectionHandle {
    state: Arc<RwLock<ConnectionState>>,
    status_tx: Arc<watch::Sender<ConnectionStatus>>,
}

impl ConnectionHandle {
    pub fn new() -> Self {
        let state = ConnectionState::default();
        let (status_tx, _) = watch::channel(Self::status_of(&state));
        Self {
            state: Arc::new(RwLock::new(state)),
            status_tx: Arc::new(status_tx),
        }
    }

    fn status_of(state: &ConnectionState) -> ConnectionStatus {
        ConnectionStatus {
            mode: state.mode,
            missing_tables: state.missing_tables.iter().copied().collect(),
            changed_at: now_timestamp(),
        }
    }

    // Writers never hold the lock across an await, so a poisoned lock still
    // carries a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, ConnectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConnectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> ConnectionMode {
        self.read().mode
    }

    pub fn is_online(&self) -> bool {
        self.read().is_online()
    }

    pub fn is_missing(&self, table: Table) -> bool {
        self.read().missing_tables.contains(&table)
    }

    pub fn should_use_remote(&self, table: Table) -> bool {
        self.read().should_use_remote(table)
    }

    pub fn missing_tables(&self) -> Vec<Table> {
        self.read().missing_tables.iter().copied().collect()
    }

    pub fn snapshot(&self) -> ConnectionStatus {
        Self::status_of(&self.read())
    }

    /// Sets the mode without notifying observers (initialization publishes once at the end).
    pub fn set_mode(&self, mode: ConnectionMode) {
        self.write().mode = mode;
    }

    /// Returns true if the table was not already flagged.
    pub fn mark_missing(&self, table: Table) -> bool {
        self.write().missing_tables.insert(table)
    }

    pub fn clear_missing(&self) {
        self.write().missing_tables.clear();
    }

    /// Switches to offline and notifies observers. Returns false if already offline.
    pub fn demote_offline(&self) -> bool {
        let changed = {
            let mut state = self.write();
            let changed = state.mode != ConnectionMode::Offline;
            state.mode = ConnectionMode::Offline;
            changed
        };
        if changed {
            self.publish();
        }
        changed
    }

    /// Switches to online and notifies observers. Returns false if already online.
    pub fn promote_online(&self) -> bool {
        let changed = {
            let mut state = self.write();
            let changed = state.mode != ConnectionMode::Online;
            state.mode = ConnectionMode::Online;
            changed
        };
        if changed {
            self.publish();
        }
        changed
    }

    pub fn publish(&self) {
        let status = self.snapshot();
        self.status_tx.send_replace(status);
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}
