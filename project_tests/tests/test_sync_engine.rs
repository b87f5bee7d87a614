//! # Client Sync Engine Tests
//!
//! Runs the engine against a scripted feed and a recording surface.

use std::sync::Arc;
use std::time::Duration;

use lib_firewatch::model::View;
use lib_firewatch::sync::{ClientSyncEngine, MapState, RefreshOutcome, SyncConfig};
use project_tests::{events, hotspots, RecordingSurface, Render, ScriptedFeed};

/// Engine with every gate open, so tests control refreshes directly.
fn ungated() -> SyncConfig {
    SyncConfig {
        status_gate: Duration::ZERO,
        local_gate: Duration::ZERO,
        analytics_gate: Duration::ZERO,
        ..SyncConfig::default()
    }
}

fn engine(feed: &Arc<ScriptedFeed>, surface: &Arc<RecordingSurface>, config: SyncConfig) -> ClientSyncEngine {
    ClientSyncEngine::new(feed.clone(), surface.clone(), config)
}

#[tokio::test]
async fn test_manual_and_scheduled_triggers_share_one_gate() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_status(10, 3);
    let engine = engine(&feed, &surface, SyncConfig::default());

    assert_eq!(engine.refresh(View::Status).await, RefreshOutcome::Rendered);
    // Second trigger well inside the 3 s gate.
    assert_eq!(engine.refresh_status().await, RefreshOutcome::Gated);
    assert_eq!(feed.calls(), vec!["status"]);
    assert_eq!(
        surface.renders(),
        vec![Render::Status { satellite_points: 10, local_points: 3 }]
    );
}

#[tokio::test]
async fn test_satellite_700_records_build_one_cluster_of_700() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_firms(hotspots(700));
    let engine = engine(&feed, &surface, ungated());

    assert_eq!(engine.map_state().await, MapState::Uninitialized);
    assert_eq!(engine.load_satellite().await, RefreshOutcome::Rendered);
    assert_eq!(engine.map_state().await, MapState::ClusterPresent);
    assert_eq!(
        surface.renders(),
        vec![Render::InitMap, Render::AttachCluster { len: 700 }]
    );

    // Presence check: a second load does nothing.
    assert_eq!(engine.load_satellite().await, RefreshOutcome::Unchanged);
    assert_eq!(feed.calls(), vec!["firms"]);
}

#[tokio::test]
async fn test_satellite_reload_tears_down_and_rebuilds_without_reinit() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_firms(hotspots(5));
    feed.push_firms(hotspots(8));
    let engine = engine(&feed, &surface, ungated());

    engine.load_satellite().await;
    surface.clear();
    assert_eq!(engine.reload_satellite().await, RefreshOutcome::Rendered);
    assert_eq!(
        surface.renders(),
        vec![Render::TeardownCluster, Render::AttachCluster { len: 8 }]
    );
    assert_eq!(surface.count(|r| *r == Render::InitMap), 0);
}

#[tokio::test]
async fn test_failed_first_load_leaves_map_uninitialized_and_reload_skips() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_firms_failure();
    let engine = engine(&feed, &surface, ungated());

    assert_eq!(engine.load_satellite().await, RefreshOutcome::Failed);
    assert_eq!(engine.map_state().await, MapState::Uninitialized);
    assert_eq!(engine.reload_satellite().await, RefreshOutcome::Unchanged);
    assert!(surface.renders().is_empty());
}

#[tokio::test]
async fn test_failed_reload_keeps_current_cluster_and_next_reload_retries() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_firms(hotspots(3));
    feed.push_firms_failure();
    feed.push_firms(hotspots(4));
    let engine = engine(&feed, &surface, ungated());

    engine.load_satellite().await;
    surface.clear();
    assert_eq!(engine.reload_satellite().await, RefreshOutcome::Failed);
    assert_eq!(engine.map_state().await, MapState::ClusterPresent);
    assert!(surface.renders().is_empty());

    // Server healthy again: the next scheduled reload swaps the layer.
    assert_eq!(engine.reload_satellite().await, RefreshOutcome::Rendered);
    assert_eq!(feed.calls(), vec!["firms", "firms", "firms"]);
    assert_eq!(
        surface.renders(),
        vec![Render::TeardownCluster, Render::AttachCluster { len: 4 }]
    );
    assert_eq!(engine.map_state().await, MapState::ClusterPresent);
}

#[tokio::test]
async fn test_local_view_replaces_last_twenty_and_recentres_only_on_new_data() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_firms(hotspots(1));
    feed.push_local(events(30), 30);
    feed.push_local(events(30), 30);
    feed.push_local(events(31), 31);
    let engine = engine(&feed, &surface, ungated());
    engine.load_satellite().await;
    surface.clear();

    assert_eq!(engine.refresh_local().await, RefreshOutcome::Rendered);
    let first = surface.renders();
    let newest = events(30)[29];
    assert_eq!(
        first[1..],
        [
            Render::LocalMarkers { count: 20 },
            Render::Recenter { lat: newest.lat, lon: newest.lon },
        ]
    );
    match &first[0] {
        Render::List { entries } => {
            assert_eq!(entries.len(), 20);
            assert!(entries[0].starts_with("Fire #11 "), "{}", entries[0]);
            assert!(entries[19].starts_with("Fire #30 "), "{}", entries[19]);
        }
        other => panic!("expected list, got {other:?}"),
    }
    assert_eq!(engine.watermark().await, 30);

    // Same total: full redraw, no recentre.
    surface.clear();
    engine.refresh_local().await;
    assert_eq!(surface.count(|r| matches!(r, Render::Recenter { .. })), 0);
    assert_eq!(surface.count(|r| matches!(r, Render::LocalMarkers { count: 20 })), 1);

    // One new event: recentre again.
    surface.clear();
    engine.refresh_local().await;
    assert_eq!(surface.count(|r| matches!(r, Render::Recenter { .. })), 1);
    assert_eq!(engine.watermark().await, 31);
}

#[tokio::test]
async fn test_local_view_before_map_only_updates_list() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_local(events(3), 3);
    let engine = engine(&feed, &surface, ungated());

    assert_eq!(engine.refresh_local().await, RefreshOutcome::Rendered);
    assert_eq!(surface.renders().len(), 1);
    assert!(matches!(&surface.renders()[0], Render::List { entries } if entries.len() == 3));
    assert_eq!(engine.watermark().await, 0);
}

#[tokio::test]
async fn test_stale_local_response_is_discarded() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_firms(hotspots(1));
    // First request answers last.
    feed.push_local_delayed(events(1), 1, Duration::from_millis(200));
    feed.push_local_delayed(events(2), 2, Duration::from_millis(10));
    let engine = engine(&feed, &surface, ungated());
    engine.load_satellite().await;
    surface.clear();

    let (slow, fast) = tokio::join!(engine.refresh_local(), engine.refresh_local());
    assert_eq!(fast, RefreshOutcome::Rendered);
    assert_eq!(slow, RefreshOutcome::Stale);
    assert_eq!(engine.watermark().await, 2);
    assert_eq!(surface.count(|r| matches!(r, Render::List { .. })), 1);
}

#[tokio::test]
async fn test_failed_poll_keeps_last_render_and_next_poll_recovers() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_local(events(4), 4);
    feed.push_local_failure();
    feed.push_local(events(5), 5);
    let engine = engine(&feed, &surface, ungated());

    assert_eq!(engine.refresh_local().await, RefreshOutcome::Rendered);
    assert_eq!(engine.refresh_local().await, RefreshOutcome::Failed);
    assert_eq!(surface.renders().len(), 1);
    assert_eq!(engine.refresh_local().await, RefreshOutcome::Rendered);
    assert_eq!(surface.renders().len(), 2);
}

#[tokio::test]
async fn test_unmounted_view_ignores_responses() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_status(1, 1);
    feed.push_local(events(2), 2);
    surface.unmount(View::Status);
    surface.unmount(View::Local);
    let engine = engine(&feed, &surface, ungated());

    assert_eq!(engine.refresh_status().await, RefreshOutcome::Unmounted);
    assert_eq!(engine.refresh_local().await, RefreshOutcome::Unmounted);
    assert!(surface.renders().is_empty());
}

#[tokio::test]
async fn test_analytics_trend_keeps_ten_and_rebuilds_chart() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_status(700, 0);
    for total in 1..=12u64 {
        feed.push_local(events(total as usize), total);
    }
    let engine = engine(&feed, &surface, ungated());

    for _ in 0..12 {
        assert_eq!(engine.refresh_analytics().await, RefreshOutcome::Rendered);
    }
    assert_eq!(engine.trend().await, (3..=12).collect::<Vec<u64>>());

    let renders = surface.renders();
    assert_eq!(surface.count(|r| *r == Render::TeardownChart), 12);
    assert_eq!(
        renders[renders.len() - 3..],
        [
            Render::Totals { satellite_points: 700, local_points: 12 },
            Render::TeardownChart,
            Render::DrawChart { values: (3..=12).collect() },
        ]
    );
}

#[tokio::test]
async fn test_run_loop_polls_until_shutdown() {
    let feed = Arc::new(ScriptedFeed::new());
    let surface = Arc::new(RecordingSurface::new());
    feed.push_status(2, 2);
    feed.push_firms(hotspots(2));
    feed.push_local(events(2), 2);
    let config = SyncConfig {
        status_every: Duration::from_millis(20),
        local_every: Duration::from_millis(20),
        analytics_every: Duration::from_millis(20),
        ..ungated()
    };
    let engine = Arc::new(engine(&feed, &surface, config));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let handle = tokio::spawn(Arc::clone(&engine).run(shutdown_tx.subscribe()));
    tokio::time::sleep(Duration::from_millis(150)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    assert_eq!(engine.map_state().await, MapState::ClusterPresent);
    assert!(surface.count(|r| matches!(r, Render::Status { .. })) >= 2);
    assert!(surface.count(|r| matches!(r, Render::DrawChart { .. })) >= 1);
}
