//! Bulk create with per-item fallback, and backup / restore.

mod common;

use bizdata_sync::{BackupDocument, ConnectionMode, DataError, DataService, Query, Record, Table};
use common::{ids, offline_service, online_service, record, MockRemote};
use serde_json::json;
use std::collections::BTreeMap;

#[tokio::test]
async fn test_bulk_create_uses_one_batch_when_online() {
    let remote = MockRemote::new();
    let service = online_service(remote.clone()).await;
    let before = remote.calls_for(Table::Products);

    let created = service
        .bulk_create(
            Table::Products,
            vec![
                record(json!({ "id": "P1", "name": "Bolt", "weight": 3 })),
                record(json!({ "id": "P2", "name": "Nut" })),
            ],
        )
        .await
        .unwrap();

    assert_eq!(ids(&created), vec!["P1", "P2"]);
    assert_eq!(remote.calls_for(Table::Products), before + 1);
    assert!(remote.rows(Table::Products)[0].get("weight").is_none());
}

#[tokio::test]
async fn test_bulk_create_skips_items_that_fail_individually() {
    let remote = MockRemote::new();
    remote.fail_batches();
    remote.fail_inserts_of("B");
    let service = online_service(remote.clone()).await;

    // B already exists locally, so once the remote gives up on it the local
    // create fails too.
    service
        .local_cache()
        .create(Table::Customers, &record(json!({ "id": "B", "name": "old" })))
        .await
        .unwrap();

    let created = service
        .bulk_create(
            Table::Customers,
            vec![
                record(json!({ "id": "A", "name": "a" })),
                record(json!({ "id": "B", "name": "b" })),
                record(json!({ "id": "C", "name": "c" })),
            ],
        )
        .await
        .unwrap();

    assert_eq!(ids(&created), vec!["A", "C"]);
    assert_eq!(remote.ids(Table::Customers), vec!["A"]);
    // B exhausted its retries, so C was served locally.
    assert_eq!(service.connection().mode(), ConnectionMode::Offline);
    let local = service
        .local_cache()
        .read(Table::Customers, &Query::new())
        .await
        .unwrap();
    assert_eq!(ids(&local), vec!["B", "C"]);
    assert_eq!(local[0]["name"], "old");
}

#[tokio::test]
async fn test_bulk_create_offline_with_duplicate() {
    let service = offline_service().await;
    service
        .create_family_group(record(json!({ "id": "F2", "name": "Existing" })))
        .await
        .unwrap();

    let created = service
        .bulk_create(
            "family_groups",
            vec![
                record(json!({ "id": "F1", "name": "One" })),
                record(json!({ "id": "F2", "name": "Two" })),
                record(json!({ "id": "F3", "name": "Three" })),
            ],
        )
        .await
        .unwrap();
    assert_eq!(ids(&created), vec!["F1", "F3"]);

    assert!(service.bulk_create(Table::Products, Vec::new()).await.unwrap().is_empty());
}

async fn seed_dataset(service: &DataService) {
    service
        .create_customer(record(json!({ "id": "C1", "name": "Acme", "balance": 10 })))
        .await
        .unwrap();
    service
        .create_customer(record(json!({ "id": "C2", "name": "Globex" })))
        .await
        .unwrap();
    service
        .create_employee(record(json!({ "id": "E1", "name": "Ann", "salary": 1200 })))
        .await
        .unwrap();
    service
        .create_attendance(record(json!({ "id": "AT1", "employee_id": "E1", "date": "2024-03-01", "status": "present" })))
        .await
        .unwrap();
}

fn without_updated_at(records: &[Record]) -> BTreeMap<String, Record> {
    records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.remove("updated_at");
            (r["id"].as_str().unwrap().to_string(), r)
        })
        .collect()
}

async fn assert_round_trip(service: &DataService) {
    seed_dataset(service).await;
    let backup = service.create_backup().await.unwrap();
    assert_eq!(backup.tables.len(), Table::ALL.len());
    assert_eq!(backup.tables["customers"].len(), 2);

    // Drift after the backup is undone by the restore.
    service
        .update_customer("C1", record(json!({ "name": "Changed" })))
        .await
        .unwrap();
    service
        .create_customer(record(json!({ "id": "C3", "name": "Later" })))
        .await
        .unwrap();
    service.delete_employee("E1").await.unwrap();

    let report = service.restore_backup(&backup).await.unwrap();
    let customers = report.tables.iter().find(|t| t.table == "customers").unwrap();
    assert_eq!((customers.deleted, customers.requested, customers.restored), (3, 2, 2));

    let restored = service.create_backup().await.unwrap();
    for table in Table::ALL {
        let name = table.as_str();
        assert_eq!(
            without_updated_at(&restored.tables[name]),
            without_updated_at(&backup.tables[name]),
            "{} differs after restore",
            name
        );
    }
}

#[tokio::test]
async fn test_backup_restore_round_trip_offline() {
    let service = offline_service().await;
    assert_round_trip(&service).await;
}

#[tokio::test]
async fn test_backup_restore_round_trip_online() {
    let remote = MockRemote::new();
    let service = online_service(remote.clone()).await;
    assert_round_trip(&service).await;
    assert_eq!(remote.ids(Table::Employees), vec!["E1"]);
    assert_eq!(service.connection().mode(), ConnectionMode::Online);
}

#[tokio::test]
async fn test_restore_rejects_unknown_tables_before_deleting_anything() {
    let service = offline_service().await;
    seed_dataset(&service).await;

    let mut tables = BTreeMap::new();
    tables.insert("customers".to_string(), Vec::new());
    tables.insert("widgets".to_string(), Vec::new());
    let doc = BackupDocument {
        version: 1,
        created_at: String::new(),
        tables,
    };

    let err = service.restore_backup(&doc).await.unwrap_err();
    assert!(matches!(err, DataError::InvalidTable(ref name) if name == "widgets"));
    assert_eq!(service.get_customers(Default::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_restore_only_touches_tables_in_the_document() {
    let service = offline_service().await;
    seed_dataset(&service).await;

    let doc: BackupDocument = serde_json::from_value(json!({
        "tables": { "customers": [ { "id": "C9", "name": "Only" } ] }
    }))
    .unwrap();
    service.restore_backup(&doc).await.unwrap();

    let customers = service.get_customers(Default::default()).await.unwrap();
    assert_eq!(ids(&customers), vec!["C9"]);
    assert_eq!(service.get_employees(Default::default()).await.unwrap().len(), 1);
}
