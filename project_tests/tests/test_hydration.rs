//! # Hydration Round Trip
//!
//! Detections journaled by one process are recovered by the next boot.

use std::sync::Arc;

use lib_firewatch::core::{EventStore, UniformConfidence};
use lib_firewatch::ingestors::{FireLog, IngestionEndpoint, LogHydrator};
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn test_journaled_detections_survive_restart() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("fire_log.txt");
    std::fs::write(
        &log_path,
        "Tue Feb  3 02:19:37 2026 - FIRE at 12.971678, 77.594545\nsensor rebooted\n",
    )
    .unwrap();

    // First boot: hydrate, then ingest two live detections with journaling on.
    let estimator = Arc::new(UniformConfidence::default());
    let store = Arc::new(EventStore::new());
    let report = LogHydrator::new(estimator.clone()).hydrate_into(&log_path, &store);
    assert_eq!((report.accepted, report.skipped), (1, 1));

    let ingestion = IngestionEndpoint::new(Arc::clone(&store), estimator.clone())
        .with_journal(Arc::new(FireLog::new(&log_path)));
    ingestion.ingest(&json!({"lat": 13.0, "lon": 77.6})).await.unwrap();
    ingestion.ingest(&json!({"lat": 13.1, "lon": 77.7, "confidence": 0.9})).await.unwrap();
    assert!(ingestion.ingest(&json!({"lat": "x", "lon": 77.7})).await.is_err());

    // Second boot.
    let restarted = EventStore::new();
    let report = LogHydrator::new(estimator).hydrate_into(&log_path, &restarted);
    assert_eq!(report.accepted, 3);
    let lats: Vec<f64> = restarted.read_all().iter().map(|e| e.lat).collect();
    assert_eq!(lats, vec![12.971678, 13.0, 13.1]);
}

#[test]
fn test_out_of_order_log_times_seed_non_decreasing() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("fire_log.txt");
    std::fs::write(
        &log_path,
        "2026-11-01T06:30:00Z - FIRE at 1.0, 1.0\n\
         2026-11-01T06:10:00Z - FIRE at 2.0, 2.0\n\
         2026-11-01T05:50:00Z - FIRE at 3.0, 3.0\n\
         2026-11-01T07:00:00Z - FIRE at 4.0, 4.0\n",
    )
    .unwrap();

    let store = EventStore::new();
    let report =
        LogHydrator::new(Arc::new(UniformConfidence::default())).hydrate_into(&log_path, &store);
    assert_eq!(report.accepted, 4);

    let events = store.read_all();
    let lats: Vec<f64> = events.iter().map(|e| e.lat).collect();
    assert_eq!(lats, vec![1.0, 2.0, 3.0, 4.0]);
    assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
    assert_eq!(events[2].time, events[0].time);
}
