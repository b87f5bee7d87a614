//! # Project Test Support
//!
//! Shared fixtures for the integration tests under `tests/`:
//!
//! - [`spawn_server`]: the real axum router on an ephemeral local port.
//! - [`ScriptedFeed`]: a [`FireFeed`] answering from a queue of scripted
//!   replies, each with an optional delay, so tests can force out-of-order
//!   responses.
//! - [`RecordingSurface`]: a [`DisplaySurface`] that records every render
//!   call and can unmount views.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use std::collections::{HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lib_firewatch::core::{EventStore, SpatialCluster, UniformConfidence};
use lib_firewatch::http::{build_router, AppState};
use lib_firewatch::ingestors::{IngestionEndpoint, SatelliteDataset};
use lib_firewatch::model::{FireEvent, FirmsReport, SatelliteHotspot, StatusReport, View};
use lib_firewatch::retrieve::{FeedError, FireFeed, LocalFires};
use lib_firewatch::sync::DisplaySurface;
use tokio::task::JoinHandle;

/// A running test server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<EventStore>,
    pub dataset: Arc<SatelliteDataset>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Base URL with a trailing slash, ready for `ApiClient::new`.
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serves a fresh store and the given satellite hotspots on `127.0.0.1:0`.
pub async fn spawn_server(hotspots: Vec<SatelliteHotspot>) -> anyhow::Result<TestServer> {
    let store = Arc::new(EventStore::new());
    let dataset = Arc::new(SatelliteDataset::from_hotspots(hotspots));
    let ingestion = Arc::new(IngestionEndpoint::new(
        Arc::clone(&store),
        Arc::new(UniformConfidence::default()),
    ));
    let app = build_router(AppState::new(Arc::clone(&dataset), ingestion));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(TestServer {
        addr,
        store,
        dataset,
        handle,
    })
}

/// `n` hotspots spread over a few degrees.
pub fn hotspots(n: usize) -> Vec<SatelliteHotspot> {
    (0..n)
        .map(|i| SatelliteHotspot {
            lat: 10.0 + (i % 50) as f64 * 0.1,
            lon: 75.0 + (i / 50) as f64 * 0.1,
            intensity: 300.0 + i as f64,
        })
        .collect()
}

/// `n` local events with latitudes `0..n`.
pub fn events(n: usize) -> Vec<FireEvent> {
    (0..n)
        .map(|i| FireEvent {
            lat: i as f64 * 0.01,
            lon: 77.0,
            confidence: 0.7,
            time: Utc::now(),
        })
        .collect()
}

/// One scripted reply.
pub enum Reply<T> {
    Ok(T),
    Fail,
}

struct Scripted<T> {
    delay: Duration,
    reply: Reply<T>,
}

/// A [`FireFeed`] replaying queued replies. When a queue is empty the last
/// successful reply of that kind is repeated.
#[derive(Default)]
pub struct ScriptedFeed {
    status: Mutex<VecDeque<Scripted<StatusReport>>>,
    firms: Mutex<VecDeque<Scripted<FirmsReport>>>,
    local: Mutex<VecDeque<Scripted<LocalFires>>>,
    last_status: Mutex<Option<StatusReport>>,
    last_firms: Mutex<Option<FirmsReport>>,
    last_local: Mutex<Option<LocalFires>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, satellite_points: usize, local_points: u64) {
        let report = StatusReport {
            system: "active".to_string(),
            satellite_points,
            local_points,
            time: Utc::now(),
        };
        push(&self.status, Duration::ZERO, Reply::Ok(report));
    }

    pub fn push_firms(&self, fires: Vec<SatelliteHotspot>) {
        let report = FirmsReport {
            count: fires.len(),
            fires,
        };
        push(&self.firms, Duration::ZERO, Reply::Ok(report));
    }

    pub fn push_firms_failure(&self) {
        push(&self.firms, Duration::ZERO, Reply::Fail);
    }

    pub fn push_local(&self, events: Vec<FireEvent>, total: u64) {
        self.push_local_delayed(events, total, Duration::ZERO);
    }

    pub fn push_local_delayed(&self, events: Vec<FireEvent>, total: u64, delay: Duration) {
        push(&self.local, delay, Reply::Ok(LocalFires { events, total }));
    }

    pub fn push_local_failure(&self) {
        push(&self.local, Duration::ZERO, Reply::Fail);
    }

    /// Endpoint names in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    async fn answer<T: Clone>(
        &self,
        name: &'static str,
        queue: &Mutex<VecDeque<Scripted<T>>>,
        last: &Mutex<Option<T>>,
    ) -> Result<T, FeedError> {
        lock(&self.calls).push(name);
        let next = lock(queue).pop_front();
        let (delay, reply) = match next {
            Some(scripted) => (scripted.delay, scripted.reply),
            None => match lock(last).clone() {
                Some(value) => (Duration::ZERO, Reply::Ok(value)),
                None => (Duration::ZERO, Reply::Fail),
            },
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Ok(value) => {
                *lock(last) = Some(value.clone());
                Ok(value)
            }
            Reply::Fail => Err(FeedError::Status {
                status: 503,
                body: format!("scripted {name} failure"),
            }),
        }
    }
}

fn push<T>(queue: &Mutex<VecDeque<Scripted<T>>>, delay: Duration, reply: Reply<T>) {
    lock(queue).push_back(Scripted { delay, reply });
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl FireFeed for ScriptedFeed {
    async fn status(&self) -> Result<StatusReport, FeedError> {
        self.answer("status", &self.status, &self.last_status).await
    }

    async fn firms(&self) -> Result<FirmsReport, FeedError> {
        self.answer("firms", &self.firms, &self.last_firms).await
    }

    async fn local_fires(&self) -> Result<LocalFires, FeedError> {
        self.answer("local", &self.local, &self.last_local).await
    }
}

/// A recorded render call.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    Status { satellite_points: usize, local_points: u64 },
    InitMap,
    AttachCluster { len: usize },
    TeardownCluster,
    LocalMarkers { count: usize },
    Recenter { lat: f64, lon: f64 },
    List { entries: Vec<String> },
    TeardownChart,
    DrawChart { values: Vec<u64> },
    Totals { satellite_points: usize, local_points: u64 },
}

/// A [`DisplaySurface`] that records everything it is asked to draw.
pub struct RecordingSurface {
    mounted: Mutex<HashSet<View>>,
    renders: Mutex<Vec<Render>>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            mounted: Mutex::new(View::ALL.into_iter().collect()),
            renders: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unmount(&self, view: View) {
        lock(&self.mounted).remove(&view);
    }

    pub fn renders(&self) -> Vec<Render> {
        lock(&self.renders).clone()
    }

    pub fn clear(&self) {
        lock(&self.renders).clear();
    }

    pub fn count(&self, pred: impl Fn(&Render) -> bool) -> usize {
        lock(&self.renders).iter().filter(|r| pred(r)).count()
    }

    fn record(&self, render: Render) {
        lock(&self.renders).push(render);
    }
}

impl DisplaySurface for RecordingSurface {
    fn is_mounted(&self, view: View) -> bool {
        lock(&self.mounted).contains(&view)
    }

    fn render_status(&self, report: &StatusReport) {
        self.record(Render::Status {
            satellite_points: report.satellite_points,
            local_points: report.local_points,
        });
    }

    fn init_map(&self) {
        self.record(Render::InitMap);
    }

    fn attach_cluster(&self, cluster: &SpatialCluster) {
        self.record(Render::AttachCluster { len: cluster.len() });
    }

    fn teardown_cluster(&self) {
        self.record(Render::TeardownCluster);
    }

    fn replace_local_markers(&self, events: &[FireEvent]) {
        self.record(Render::LocalMarkers { count: events.len() });
    }

    fn recenter(&self, lat: f64, lon: f64) {
        self.record(Render::Recenter { lat, lon });
    }

    fn replace_list(&self, entries: &[String]) {
        self.record(Render::List {
            entries: entries.to_vec(),
        });
    }

    fn teardown_chart(&self) {
        self.record(Render::TeardownChart);
    }

    fn draw_chart(&self, values: &[u64]) {
        self.record(Render::DrawChart {
            values: values.to_vec(),
        });
    }

    fn render_totals(&self, satellite_points: usize, local_points: u64) {
        self.record(Render::Totals {
            satellite_points,
            local_points,
        });
    }
}
