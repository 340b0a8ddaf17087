//! Integration tests for the record / history / list operations over in-memory stores

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tracking_api::domain::{CheckpointStatus, TrackingError};
use tracking_api::infra::{
    CheckpointStore, InMemoryCheckpointStore, InMemoryUnitStore, Metrics, UnitStore,
};
use tracking_api::services::{GetHistory, ListUnits, RecordCheckpoint};

const UNIT_A: &str = "123e4567-e89b-12d3-a456-426614174000";
const UNIT_B: &str = "9b2f1c3e-7d4a-4e8b-a1c2-3d4e5f6a7b8c";

struct App {
    checkpoints: Arc<InMemoryCheckpointStore>,
    units: Arc<InMemoryUnitStore>,
    metrics: Arc<Metrics>,
    record: Arc<RecordCheckpoint>,
    history: GetHistory,
    list: ListUnits,
}

fn app() -> App {
    let checkpoints = Arc::new(InMemoryCheckpointStore::new());
    let units = Arc::new(InMemoryUnitStore::new());
    let metrics = Arc::new(Metrics::new());
    App {
        record: Arc::new(RecordCheckpoint::with_metrics(
            checkpoints.clone(),
            units.clone(),
            metrics.clone(),
        )),
        history: GetHistory::with_metrics(checkpoints.clone(), metrics.clone()),
        list: ListUnits::new(units.clone()),
        checkpoints,
        units,
        metrics,
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 8, 12, 34, 56).unwrap() + Duration::milliseconds(789)
}

#[tokio::test]
async fn test_full_journey_then_duplicate() {
    let app = app();
    let t = base_time();

    let created = app.record.execute(UNIT_A, "CREATED", t).await.unwrap();
    assert_eq!(created.timestamp(), "2025-10-08T12:34:56.789Z");
    app.record.execute(UNIT_A, "PICKED_UP", t + Duration::hours(1)).await.unwrap();
    app.record.execute(UNIT_A, "DELIVERED", t + Duration::hours(2)).await.unwrap();

    let err = app.record.execute(UNIT_A, "DELIVERED", t + Duration::hours(3)).await.unwrap_err();
    assert!(matches!(err, TrackingError::DuplicateRequest { .. }));
    assert_eq!(err.kind(), "DuplicateRequest");

    let history = app.history.execute(UNIT_A).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|c| c.status()).collect();
    assert_eq!(
        statuses,
        vec![CheckpointStatus::Created, CheckpointStatus::PickedUp, CheckpointStatus::Delivered]
    );
    assert!(history.iter().all(|c| c.unit_id() == UNIT_A && c.history().is_empty()));

    let unit = app.units.find_by_id(UNIT_A).await.unwrap().unwrap();
    assert_eq!(unit.status, CheckpointStatus::Delivered);
    assert_eq!(unit.checkpoints.len(), 2);
    assert!(unit.checkpoints.iter().all(|e| e.date.ends_with("GMT+0000 (Coordinated Universal Time)")));

    assert_eq!(app.metrics.checkpoints_recorded(), 3);
    assert_eq!(app.metrics.duplicate_total(), 1);
}

#[tokio::test]
async fn test_history_of_unknown_unit_is_empty() {
    let app = app();
    app.record.execute(UNIT_A, "CREATED", base_time()).await.unwrap();

    assert!(app.history.execute(UNIT_B).await.unwrap().is_empty());
    assert!(app.history.execute("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_units_are_independent() {
    let app = app();
    let t = base_time();

    app.record.execute(UNIT_A, "IN_TRANSIT", t).await.unwrap();
    // Same status on another unit is not a duplicate
    app.record.execute(UNIT_B, "IN_TRANSIT", t).await.unwrap();
    app.record.execute(UNIT_B, "EXCEPTION", t + Duration::minutes(5)).await.unwrap();

    assert_eq!(app.history.execute(UNIT_A).await.unwrap().len(), 1);
    assert_eq!(app.history.execute(UNIT_B).await.unwrap().len(), 2);

    let in_transit: Vec<_> =
        app.list.execute(Some("IN_TRANSIT")).await.unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(in_transit, vec![UNIT_A]);
    assert_eq!(app.list.execute(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_distinct_updates_grow_history_by_one_each() {
    let app = app();
    let t = base_time();
    let sequence = [
        "CREATED",
        "PICKED_UP",
        "IN_TRANSIT",
        "AT_FACILITY",
        "IN_TRANSIT",
        "OUT_FOR_DELIVERY",
        "EXCEPTION",
        "OUT_FOR_DELIVERY",
        "DELIVERED",
    ];

    for (i, status) in sequence.iter().enumerate() {
        app.record.execute(UNIT_A, status, t + Duration::minutes(i as i64)).await.unwrap();

        let unit = app.units.find_by_id(UNIT_A).await.unwrap().unwrap();
        assert_eq!(unit.status.as_str(), *status);
        assert_eq!(unit.checkpoints.len(), i);
        assert_eq!(app.checkpoints.find_by_unit_id(UNIT_A).await.unwrap().len(), i + 1);
    }

    // Checkpoint ids are unique across the whole sequence
    let history = app.history.execute(UNIT_A).await.unwrap();
    let mut ids: Vec<&str> = history.iter().map(|c| c.id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), sequence.len());
}

#[tokio::test]
async fn test_invalid_status_leaves_stores_untouched() {
    let app = app();

    let err = app.record.execute(UNIT_A, "LOST_IN_SPACE", base_time()).await.unwrap_err();

    assert_eq!(err.kind(), "InvalidStatus");
    assert!(err.to_string().starts_with("Invalid status 'LOST_IN_SPACE'. Valid statuses are: "));
    assert_eq!(app.checkpoints.count().await.unwrap(), 0);
    assert_eq!(app.units.count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_status_single_winner() {
    let app = app();
    app.record.execute(UNIT_A, "CREATED", base_time()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let record = app.record.clone();
        handles.push(tokio::spawn(async move {
            record.execute(UNIT_A, "IN_TRANSIT", base_time() + Duration::seconds(i)).await
        }));
    }

    let mut ok = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(TrackingError::DuplicateRequest { .. }) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(app.history.execute(UNIT_A).await.unwrap().len(), 2);
    let unit = app.units.find_by_id(UNIT_A).await.unwrap().unwrap();
    assert_eq!(unit.checkpoints.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_checkpoint_creates_unit_once() {
    let app = app();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let record = app.record.clone();
        handles.push(tokio::spawn(async move {
            record.execute(UNIT_B, "CREATED", base_time()).await
        }));
    }

    let successes = count_successes(handles).await;

    assert_eq!(successes, 1);
    assert_eq!(app.units.count().await.unwrap(), 1);
    assert_eq!(app.checkpoints.count().await.unwrap(), 1);
}

async fn count_successes(
    handles: Vec<tokio::task::JoinHandle<Result<tracking_api::domain::Checkpoint, TrackingError>>>,
) -> usize {
    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    ok
}
