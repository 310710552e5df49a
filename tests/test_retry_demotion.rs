//! Retry policy and online -> offline demotion.

mod common;

use bizdata_sync::infra::remote::{RemoteError, RemoteErrorKind};
use bizdata_sync::{ConnectionMode, Query, RetryPolicy, Table};
use bizdata_sync::domain::RetryOutcome;
use common::{ids, offline_service, online_service, record, MockRemote};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_exhausted_retries_demote_to_offline_and_fall_back() {
    let remote = MockRemote::new();
    remote.set_failing(Table::Attendance, true);
    let service = online_service(remote.clone()).await;

    // A transient probe failure is not a "missing" verdict.
    assert!(!service.connection().is_missing(Table::Attendance));
    assert_eq!(service.status().mode, ConnectionMode::Online);

    let mut status_rx = service.subscribe_status();
    let before = remote.calls_for(Table::Attendance);

    let entry = service
        .create_attendance(record(json!({ "id": "A1", "employee_id": "E1", "status": "present" })))
        .await
        .unwrap();
    assert_eq!(entry["id"], "A1");

    // One attempt plus three retries.
    assert_eq!(remote.calls_for(Table::Attendance), before + 4);
    assert_eq!(service.connection().mode(), ConnectionMode::Offline);
    assert_eq!(service.local_cache().count(Table::Attendance).await.unwrap(), 1);

    status_rx.changed().await.unwrap();
    assert_eq!(status_rx.borrow().mode, ConnectionMode::Offline);

    // Other tables now skip the remote entirely.
    let customers_before = remote.calls_for(Table::Customers);
    let rows = service.read(Table::Customers, Query::new()).await.unwrap();
    assert!(rows.is_empty());
    service
        .create(Table::Customers, record(json!({ "id": "C1", "name": "Acme" })))
        .await
        .unwrap();
    assert_eq!(remote.calls_for(Table::Customers), customers_before);
    assert_eq!(service.local_cache().count(Table::Customers).await.unwrap(), 1);
}

#[tokio::test]
async fn test_force_online_needs_a_client() {
    let remote = MockRemote::new();
    remote.set_failing(Table::Payments, true);
    let service = online_service(remote.clone()).await;

    service
        .read(Table::Payments, Query::new())
        .await
        .unwrap();
    assert_eq!(service.connection().mode(), ConnectionMode::Offline);

    assert!(service.force_online());
    assert_eq!(service.connection().mode(), ConnectionMode::Online);

    remote.set_failing(Table::Payments, false);
    remote.seed(Table::Payments, vec![record(json!({ "id": "P1", "amount": 10 }))]);
    let rows = service.read(Table::Payments, Query::new()).await.unwrap();
    assert_eq!(ids(&rows), vec!["P1"]);

    let offline = offline_service().await;
    assert!(!offline.force_online());
    assert_eq!(offline.connection().mode(), ConnectionMode::Offline);
}

#[test]
fn test_linear_backoff() {
    let policy = RetryPolicy::new(3, Duration::from_millis(10));
    assert_eq!(policy.delay_for(3), Duration::from_millis(10));
    assert_eq!(policy.delay_for(2), Duration::from_millis(20));
    assert_eq!(policy.delay_for(1), Duration::from_millis(30));

    let defaults = RetryPolicy::default();
    assert_eq!(defaults.max_retries, 3);
    assert_eq!(defaults.base_delay, Duration::from_millis(1000));
}

#[tokio::test]
async fn test_retry_outcomes() {
    let policy = RetryPolicy::new(3, Duration::from_millis(1));

    let attempts = AtomicUsize::new(0);
    let outcome = policy
        .run(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RemoteError::transient("timeout")) }
            },
            || true,
        )
        .await;
    assert!(matches!(outcome, RetryOutcome::Exhausted(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    let attempts = AtomicUsize::new(0);
    let outcome = policy
        .run(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(RemoteError::transient("timeout"))
                    } else {
                        Ok(n)
                    }
                }
            },
            || true,
        )
        .await;
    assert!(matches!(outcome, RetryOutcome::Success(2)));

    let attempts = AtomicUsize::new(0);
    let outcome = policy
        .run(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RemoteError::table_missing("relation does not exist")) }
            },
            || true,
        )
        .await;
    assert!(matches!(outcome, RetryOutcome::TableMissing(ref e) if e.kind == RemoteErrorKind::TableMissing));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    let outcome = policy
        .run(|| async { Err::<(), _>(RemoteError::not_found("no row")) }, || true)
        .await;
    assert!(matches!(outcome, RetryOutcome::Rejected(_)));

    // Demoted elsewhere: stop retrying immediately.
    let attempts = AtomicUsize::new(0);
    let outcome = policy
        .run(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RemoteError::transient("timeout")) }
            },
            || false,
        )
        .await;
    assert!(matches!(outcome, RetryOutcome::Abandoned(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
