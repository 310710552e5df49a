//! Initialization protocol: connectivity, table probes, startup sync and the
//! pending-operations queue.

mod common;

use bizdata_sync::{ConnectionMode, KeyValueStore, LocalCache, MemoryKeyValueStore, Query, Table};
use common::{ids, record, service_with, MockConnector, MockRemote};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_pending(service: &bizdata_sync::DataService, count: usize) {
    for _ in 0..500 {
        if service.pending_operations() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("expected {} queued operations, found {}", count, service.pending_operations());
}

#[tokio::test]
async fn test_unreachable_remote_starts_offline() {
    let connector = MockConnector::unreachable();
    let service = service_with(connector.clone(), MemoryKeyValueStore::new());

    let report = service.initialize().await.unwrap();
    assert!(report.performed);
    assert_eq!(report.status.mode, ConnectionMode::Offline);
    assert!(report.synced.is_empty());
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);

    let created = service
        .create(Table::Users, record(json!({ "username": "admin" })))
        .await
        .unwrap();
    assert!(!created["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_client_construction_failure_starts_offline() {
    let remote = MockRemote::new();
    let service = service_with(MockConnector::broken_client(remote.clone()), MemoryKeyValueStore::new());

    let report = service.initialize().await.unwrap();
    assert_eq!(report.status.mode, ConnectionMode::Offline);
    assert_eq!(remote.total_calls(), 0);
    assert!(!service.force_online());
}

#[tokio::test]
async fn test_verification_failure_keeps_the_client_online() {
    let remote = MockRemote::new();
    remote.set_failing(Table::Users, true);
    let service = service_with(MockConnector::online(remote), MemoryKeyValueStore::new());

    let report = service.initialize().await.unwrap();
    assert_eq!(report.status.mode, ConnectionMode::Online);
    assert!(report.status.missing_tables.is_empty());
}

#[tokio::test]
async fn test_initialize_probes_every_table_and_is_idempotent() {
    let remote = MockRemote::with_missing(&[Table::Products, Table::FamilyGroups]);
    let connector = MockConnector::online(remote.clone());
    let service = service_with(connector.clone(), MemoryKeyValueStore::new());

    let mut status_rx = service.subscribe_status();
    let report = service.initialize().await.unwrap();
    assert!(report.performed);
    assert!(service.is_initialized());
    assert_eq!(report.status.mode, ConnectionMode::Online);
    assert_eq!(
        report.status.missing_tables,
        vec![Table::FamilyGroups, Table::Products]
    );
    for table in Table::ALL {
        assert!(remote.calls_for(table) >= 1, "{} was not probed", table);
    }

    status_rx.changed().await.unwrap();
    assert_eq!(status_rx.borrow().mode, ConnectionMode::Online);

    let calls = remote.total_calls();
    let again = service.initialize().await.unwrap();
    assert!(!again.performed);
    assert_eq!(remote.total_calls(), calls);
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_startup_sync_migrates_cached_records() {
    let store = MemoryKeyValueStore::new();
    let cache = LocalCache::new(Arc::new(store.clone()));

    // Written while offline in an earlier session. One row carries a column the
    // remote schema does not have.
    store
        .set(
            "customers",
            json!([
                { "id": "C1", "name": "Acme", "legacy_code": "X9", "created_at": "2024-01-01T00:00:00.000Z" },
                { "id": "C2", "name": "Globex" }
            ])
            .to_string(),
        )
        .await
        .unwrap();
    cache
        .create(Table::Products, &record(json!({ "id": "P1", "name": "Widget" })))
        .await
        .unwrap();

    let remote = MockRemote::with_missing(&[Table::Products]);
    remote.seed(Table::Customers, vec![record(json!({ "id": "C2", "name": "Globex" }))]);

    let service = service_with(MockConnector::online(remote.clone()), store.clone());
    let report = service.initialize().await.unwrap();

    let stats = report
        .synced
        .iter()
        .find(|s| s.table == "customers")
        .expect("customers were synced");
    assert_eq!(stats.attempted, 2);
    assert_eq!(stats.migrated, 1);
    assert_eq!(stats.already_remote, 1);
    assert_eq!(stats.failed, 0);

    assert_eq!(remote.ids(Table::Customers), vec!["C2", "C1"]);
    let migrated = remote
        .rows(Table::Customers)
        .into_iter()
        .find(|r| r["id"] == "C1")
        .unwrap();
    assert!(migrated.get("legacy_code").is_none());
    assert_eq!(migrated["created_at"], "2024-01-01T00:00:00.000Z");

    // Synced table is cleared; the missing table keeps its only copy.
    assert_eq!(cache.count(Table::Customers).await.unwrap(), 0);
    assert_eq!(cache.count(Table::Products).await.unwrap(), 1);
    assert!(report.synced.iter().all(|s| s.table != "products"));
}

#[tokio::test]
async fn test_partial_sync_failure_still_clears_the_table() {
    let store = MemoryKeyValueStore::new();
    let cache = LocalCache::new(Arc::new(store.clone()));
    for id in ["S1", "S2", "S3"] {
        cache
            .create(Table::SalaryRecords, &record(json!({ "id": id, "employee_id": "E1" })))
            .await
            .unwrap();
    }

    let remote = MockRemote::new();
    remote.fail_inserts_of("S2");
    let service = service_with(MockConnector::online(remote.clone()), store);
    let report = service.initialize().await.unwrap();

    let stats = report
        .synced
        .iter()
        .find(|s| s.table == "salary_records")
        .unwrap();
    assert_eq!((stats.migrated, stats.failed), (2, 1));
    assert_eq!(remote.ids(Table::SalaryRecords), vec!["S1", "S3"]);
    assert_eq!(cache.count(Table::SalaryRecords).await.unwrap(), 0);
    assert_eq!(report.status.mode, ConnectionMode::Online);
}

#[tokio::test]
async fn test_operations_before_initialize_are_queued_and_drained_in_order() {
    let remote = MockRemote::new();
    let service = service_with(MockConnector::online(remote.clone()), MemoryKeyValueStore::new());

    let svc = service.clone();
    let create = tokio::spawn(async move {
        svc.create(Table::Customers, record(json!({ "id": "C1", "name": "Acme" })))
            .await
    });
    wait_for_pending(&service, 1).await;

    let svc = service.clone();
    let read = tokio::spawn(async move { svc.read(Table::Customers, Query::new()).await });
    wait_for_pending(&service, 2).await;

    assert_eq!(remote.ids(Table::Customers), Vec::<String>::new());

    let report = service.initialize().await.unwrap();
    assert_eq!(report.pending_drained, 2);
    assert_eq!(service.pending_operations(), 0);

    let created = create.await.unwrap().unwrap();
    assert_eq!(created["id"], "C1");
    let rows = read.await.unwrap().unwrap();
    assert_eq!(ids(&rows), vec!["C1"]);
    assert_eq!(remote.ids(Table::Customers), vec!["C1"]);

    // After the drain, calls run immediately.
    let rows = service.get_customers(Default::default()).await.unwrap();
    assert_eq!(ids(&rows), vec!["C1"]);
    assert_eq!(service.pending_operations(), 0);
}

#[tokio::test]
async fn test_failed_queued_operation_does_not_stop_the_drain() {
    let service = service_with(MockConnector::unreachable(), MemoryKeyValueStore::new());

    let svc = service.clone();
    let failing = tokio::spawn(async move {
        svc.update(Table::Bills, "missing", record(json!({ "status": "paid" })))
            .await
    });
    wait_for_pending(&service, 1).await;

    let svc = service.clone();
    let ok = tokio::spawn(async move {
        svc.create(Table::Bills, record(json!({ "id": "B1", "total_amount": 10 })))
            .await
    });
    wait_for_pending(&service, 2).await;

    let report = service.initialize().await.unwrap();
    assert_eq!(report.pending_drained, 2);
    assert!(failing.await.unwrap().is_err());
    assert_eq!(ok.await.unwrap().unwrap()["id"], "B1");
}
