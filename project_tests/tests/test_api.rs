//! # HTTP API Integration Tests
//!
//! Drives the real router over TCP with the crate's own client.

use futures_util::future::join_all;
use lib_firewatch::core::confidence::{SYNTH_CONFIDENCE_MAX, SYNTH_CONFIDENCE_MIN};
use lib_firewatch::model::{DetectionPayload, FireEvent, FirmsReport, StatusReport};
use lib_firewatch::retrieve::{ApiClient, FeedError, FireFeed, HttpFireFeed};
use project_tests::{hotspots, spawn_server};
use reqwest::Method;
use serde_json::{json, Value};

fn payload(lat: f64, lon: f64, confidence: Option<f64>) -> DetectionPayload {
    DetectionPayload { lat, lon, confidence }
}

#[tokio::test]
async fn test_post_then_get_includes_event_with_server_time() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let client = ApiClient::new(&server.base_url()).unwrap();

    let before = chrono::Utc::now();
    let ack: Value = client
        .post_json(
            "api/local-fires",
            &json!({"lat": 12.971678, "lon": 77.594545, "confidence": 0.8, "time": "2001-01-01T00:00:00Z"}),
        )
        .await
        .unwrap();
    assert_eq!(ack, json!({"status": "ok"}));

    let (events, _): (Vec<FireEvent>, _) = client.get_json("api/local-fires").await.unwrap();
    assert_eq!(events.len(), 1);
    let event = events[0];
    assert_eq!((event.lat, event.lon, event.confidence), (12.971678, 77.594545, 0.8));
    assert!(event.time >= before);
}

#[tokio::test]
async fn test_missing_confidence_is_synthesized_in_range() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let feed = HttpFireFeed::new(&server.base_url()).unwrap();
    for i in 0..25 {
        feed.report_detection(&payload(i as f64, 0.0, None)).await.unwrap();
    }
    let fires = feed.local_fires().await.unwrap();
    assert_eq!(fires.events.len(), 25);
    assert!(fires
        .events
        .iter()
        .all(|e| (SYNTH_CONFIDENCE_MIN..=SYNTH_CONFIDENCE_MAX).contains(&e.confidence)));
}

#[tokio::test]
async fn test_six_hundred_ingestions_return_last_five_hundred_in_order() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let feed = HttpFireFeed::new(&server.base_url()).unwrap();
    for i in 0..600 {
        feed.report_detection(&payload(i as f64 / 10.0, 1.0, Some(0.5))).await.unwrap();
    }
    let fires = feed.local_fires().await.unwrap();
    assert_eq!(fires.events.len(), 500);
    assert_eq!(fires.total, 600);
    let lats: Vec<f64> = fires.events.iter().map(|e| e.lat).collect();
    let expected: Vec<f64> = (100..600).map(|i| i as f64 / 10.0).collect();
    assert_eq!(lats, expected);
    assert!(fires.events.windows(2).all(|w| w[0].time <= w[1].time));
}

#[tokio::test]
async fn test_concurrent_ingestion_is_never_lost() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let feed = HttpFireFeed::new(&server.base_url()).unwrap();
    let posts = (0..50).map(|i| {
        let feed = feed.clone();
        async move { feed.report_detection(&payload(i as f64, 2.0, None)).await }
    });
    let results = join_all(posts).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(server.store.total_accepted(), 50);
    assert_eq!(feed.local_fires().await.unwrap().events.len(), 50);
}

#[tokio::test]
async fn test_invalid_detections_are_rejected_without_mutation() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let client = ApiClient::new(&server.base_url()).unwrap();

    for body in [
        json!({"lon": 77.5}),
        json!({"lat": "north", "lon": 77.5}),
        json!({"lat": 12.9, "lon": null}),
        json!({"lat": 120.0, "lon": 77.5}),
        json!({"lat": 12.9, "lon": 77.5, "confidence": 3}),
        json!("lat=12.9"),
    ] {
        let response = client
            .request::<Value, Value>(Method::POST, "api/local-fires", None, Some(&body))
            .await
            .unwrap();
        assert_eq!(response.status, 400, "{body}");
        let error: Value = serde_json::from_str(response.error_body.as_deref().unwrap()).unwrap();
        assert_eq!(error["error_type"], "ValidationError");
    }
    assert_eq!(server.store.total_accepted(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let response = reqwest::Client::new()
        .post(format!("{}api/local-fires", server.base_url()))
        .header("content-type", "application/json")
        .body("{\"lat\": 12.9,")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error_type"], "MalformedBody");
}

#[tokio::test]
async fn test_status_reports_totals() {
    let server = spawn_server(hotspots(120)).await.unwrap();
    let feed = HttpFireFeed::new(&server.base_url()).unwrap();
    for i in 0..5 {
        feed.report_detection(&payload(i as f64, 3.0, None)).await.unwrap();
    }
    let status: StatusReport = feed.status().await.unwrap();
    assert_eq!(status.system, "active");
    assert_eq!(status.satellite_points, 120);
    assert_eq!(status.local_points, 5);
}

#[tokio::test]
async fn test_firms_caps_fires_but_reports_full_count() {
    let server = spawn_server(hotspots(2500)).await.unwrap();
    let feed = HttpFireFeed::new(&server.base_url()).unwrap();
    let report: FirmsReport = feed.firms().await.unwrap();
    assert_eq!(report.count, 2500);
    assert_eq!(report.fires.len(), 2000);
    assert_eq!(report.fires[0], server.dataset.snapshot()[0]);
}

#[tokio::test]
async fn test_health_and_banner() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let http = reqwest::Client::new();
    let health = http.get(format!("{}health", server.base_url())).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");
    let banner = http.get(server.base_url()).send().await.unwrap();
    assert!(banner.status().is_success());
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let server = spawn_server(Vec::new()).await.unwrap();
    let url = server.base_url();
    drop(server);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let feed = HttpFireFeed::new(&url).unwrap();
    assert!(matches!(feed.status().await, Err(FeedError::Transport(_))));
}
