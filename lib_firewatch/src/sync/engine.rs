//! # Client Sync Engine
//!
//! Drives every view of one viewer: a periodic trigger per view, a shared
//! [`PollGate`] in front of each read, a [`RequestSequencer`] per view so a
//! late response never overwrites newer state, and the reconcile step that
//! decides what to redraw.
//!
//! ## Views
//! - **status**: redraw the status cards.
//! - **local**: full replace of the local markers and the list with the last
//!   [`LOCAL_WINDOW`] events; recentre on the newest event only when the server
//!   total moved past the view watermark.
//! - **analytics**: push the local total into the [`TrendBuffer`], tear the
//!   chart down and rebuild it from the buffer; redraw the totals.
//! - **satellite**: build the cluster layer once per dataset load, inserting in
//!   batches of [`SATELLITE_BATCH_SIZE`] with a yield between batches.
//!
//! A failed poll is logged and leaves the view at its last render.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::time::{interval, interval_at, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::core::{PollGate, RequestSequencer, SpatialCluster, TrendBuffer};
use crate::model::{FirmsReport, View};
use crate::retrieve::FireFeed;
use crate::sync::surface::{format_list_entry, DisplaySurface};

/// Satellite records inserted into the cluster between two yields.
pub const SATELLITE_BATCH_SIZE: usize = 300;

/// Local events drawn on the map and in the list.
pub const LOCAL_WINDOW: usize = 20;

/// Refresh cadences and gate intervals per view.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub status_every: Duration,
    pub status_gate: Duration,
    pub local_every: Duration,
    pub local_gate: Duration,
    pub analytics_every: Duration,
    pub analytics_gate: Duration,
    pub satellite_reload_every: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            status_every: Duration::from_secs(4),
            status_gate: Duration::from_secs(3),
            local_every: Duration::from_secs(3),
            local_gate: Duration::from_secs(2),
            analytics_every: Duration::from_secs(6),
            analytics_gate: Duration::from_secs(4),
            satellite_reload_every: Duration::from_secs(300),
        }
    }
}

impl SyncConfig {
    /// A gate carrying this configuration's per-view intervals.
    pub fn build_gate(&self) -> PollGate {
        PollGate::new()
            .with_interval(View::Status, self.status_gate)
            .with_interval(View::Local, self.local_gate)
            .with_interval(View::Analytics, self.analytics_gate)
    }
}

/// Lifecycle of the map subsystem. Never returns to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    /// Map and base layer exist; no satellite cluster is attached.
    ClusterAbsent,
    /// Map exists with a cluster built from the last completed load.
    ClusterPresent,
}

impl MapState {
    pub fn is_initialized(self) -> bool {
        self != MapState::Uninitialized
    }
}

/// What a refresh attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The view was redrawn.
    Rendered,
    /// Dropped by the poll gate.
    Gated,
    /// Nothing to do (satellite cluster already present).
    Unchanged,
    /// A newer response had already been applied.
    Stale,
    /// The view no longer exists.
    Unmounted,
    /// The read failed; the last render stays.
    Failed,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct LocalViewState {
    /// Server total at the last local render.
    watermark: u64,
}

/// # Client Sync Engine
pub struct ClientSyncEngine {
    feed: Arc<dyn FireFeed>,
    surface: Arc<dyn DisplaySurface>,
    gate: Arc<PollGate>,
    config: SyncConfig,
    sequencers: HashMap<View, RequestSequencer>,
    // One lock per view. Holding it is what makes "check sequence, then
    // render" a single step.
    status: Mutex<()>,
    local: Mutex<LocalViewState>,
    analytics: Mutex<TrendBuffer>,
    map: Mutex<MapState>,
    // Mirrors `map.is_initialized()` without waiting on a satellite load.
    map_ready: AtomicBool,
}

impl ClientSyncEngine {
    pub fn new(feed: Arc<dyn FireFeed>, surface: Arc<dyn DisplaySurface>, config: SyncConfig) -> Self {
        let gate = Arc::new(config.build_gate());
        Self::with_gate(feed, surface, config, gate)
    }

    /// Uses an externally owned gate, e.g. one shared with a manual trigger.
    pub fn with_gate(
        feed: Arc<dyn FireFeed>,
        surface: Arc<dyn DisplaySurface>,
        config: SyncConfig,
        gate: Arc<PollGate>,
    ) -> Self {
        Self {
            feed,
            surface,
            gate,
            config,
            sequencers: View::ALL.iter().map(|v| (*v, RequestSequencer::new())).collect(),
            status: Mutex::new(()),
            local: Mutex::new(LocalViewState { watermark: 0 }),
            analytics: Mutex::new(TrendBuffer::default()),
            map: Mutex::new(MapState::Uninitialized),
            map_ready: AtomicBool::new(false),
        }
    }

    pub fn gate(&self) -> &Arc<PollGate> {
        &self.gate
    }

    pub async fn map_state(&self) -> MapState {
        *self.map.lock().await
    }

    pub async fn watermark(&self) -> u64 {
        self.local.lock().await.watermark
    }

    pub async fn trend(&self) -> Vec<u64> {
        self.analytics.lock().await.values()
    }

    /// Manual or scheduled refresh of one view. Both triggers go through the
    /// same gate.
    pub async fn refresh(&self, view: View) -> RefreshOutcome {
        match view {
            View::Status => self.refresh_status().await,
            View::Local => self.refresh_local().await,
            View::Analytics => self.refresh_analytics().await,
            View::Satellite => self.load_satellite().await,
        }
    }

    fn sequencer(&self, view: View) -> &RequestSequencer {
        // Every view gets a sequencer at construction.
        &self.sequencers[&view]
    }

    fn enter(&self, view: View) -> bool {
        let proceed = self.gate.try_enter_now(view).is_proceed();
        if !proceed {
            debug!(view = %view, "Refresh skipped by poll gate");
        }
        proceed
    }

    /// Common post-fetch checks, run while the view's render lock is held.
    fn admit(&self, view: View, seq: u64) -> Option<RefreshOutcome> {
        if !self.surface.is_mounted(view) {
            debug!(view = %view, "View torn down, dropping response");
            return Some(RefreshOutcome::Unmounted);
        }
        if !self.sequencer(view).try_apply(seq) {
            debug!(view = %view, seq, "Dropping stale response");
            return Some(RefreshOutcome::Stale);
        }
        None
    }

    pub async fn refresh_status(&self) -> RefreshOutcome {
        if !self.enter(View::Status) {
            return RefreshOutcome::Gated;
        }
        let seq = self.sequencer(View::Status).issue();
        let report = match self.feed.status().await {
            Ok(report) => report,
            Err(e) => {
                warn!(view = %View::Status, "Error loading status: {}", e);
                return RefreshOutcome::Failed;
            }
        };

        let _render = self.status.lock().await;
        if let Some(outcome) = self.admit(View::Status, seq) {
            return outcome;
        }
        self.surface.render_status(&report);
        RefreshOutcome::Rendered
    }

    pub async fn refresh_local(&self) -> RefreshOutcome {
        if !self.enter(View::Local) {
            return RefreshOutcome::Gated;
        }
        let seq = self.sequencer(View::Local).issue();
        let fires = match self.feed.local_fires().await {
            Ok(fires) => fires,
            Err(e) => {
                warn!(view = %View::Local, "Error loading local fires: {}", e);
                return RefreshOutcome::Failed;
            }
        };

        let mut state = self.local.lock().await;
        if let Some(outcome) = self.admit(View::Local, seq) {
            return outcome;
        }

        let recent = &fires.events[fires.events.len().saturating_sub(LOCAL_WINDOW)..];
        let first_ordinal = fires.total.saturating_sub(recent.len() as u64) + 1;
        let entries: Vec<String> = recent
            .iter()
            .enumerate()
            .map(|(i, event)| format_list_entry(first_ordinal + i as u64, event))
            .collect();
        self.surface.replace_list(&entries);

        if self.map_ready.load(Ordering::Acquire) {
            self.surface.replace_local_markers(recent);
            if let Some(newest) = recent.last() {
                if state.watermark < fires.total {
                    self.surface.recenter(newest.lat, newest.lon);
                }
            }
            // Only advances once the map exists, so the first render after
            // map construction still recentres.
            state.watermark = fires.total;
        }
        debug!(view = %View::Local, total = fires.total, shown = recent.len(), "Local fires rendered");
        RefreshOutcome::Rendered
    }

    pub async fn refresh_analytics(&self) -> RefreshOutcome {
        if !self.enter(View::Analytics) {
            return RefreshOutcome::Gated;
        }
        let seq = self.sequencer(View::Analytics).issue();
        let fetched = async {
            let status = self.feed.status().await?;
            let locals = self.feed.local_fires().await?;
            Ok::<_, crate::retrieve::FeedError>((status, locals))
        }
        .await;
        let (status, locals) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                warn!(view = %View::Analytics, "Error loading analytics: {}", e);
                return RefreshOutcome::Failed;
            }
        };

        let mut trend = self.analytics.lock().await;
        if let Some(outcome) = self.admit(View::Analytics, seq) {
            return outcome;
        }
        self.surface.render_totals(status.satellite_points, locals.total);
        trend.push(locals.total);
        self.surface.teardown_chart();
        self.surface.draw_chart(&trend.values());
        RefreshOutcome::Rendered
    }

    /// Builds the satellite layer if none is present. The first successful
    /// fetch also constructs the map.
    pub async fn load_satellite(&self) -> RefreshOutcome {
        let mut map = self.map.lock().await;
        if *map == MapState::ClusterPresent {
            return RefreshOutcome::Unchanged;
        }
        let seq = self.sequencer(View::Satellite).issue();
        let report = match self.feed.firms().await {
            Ok(report) => report,
            Err(e) => {
                error!(view = %View::Satellite, "Error loading FIRMS data: {}", e);
                if *map == MapState::Uninitialized {
                    warn!("Satellite layer stays absent until the next manual load");
                }
                return RefreshOutcome::Failed;
            }
        };
        if let Some(outcome) = self.admit(View::Satellite, seq) {
            return outcome;
        }

        if *map == MapState::Uninitialized {
            self.surface.init_map();
            *map = MapState::ClusterAbsent;
            self.map_ready.store(true, Ordering::Release);
            info!("Map initialized");
        }
        self.attach_cluster(&mut map, &report).await;
        RefreshOutcome::Rendered
    }

    /// Periodic wholesale reload. Only runs when a previous load completed.
    ///
    /// The old cluster is torn down only once the new dataset has arrived, so
    /// a failed fetch leaves the last layer on the map and the next scheduled
    /// reload tries again.
    pub async fn reload_satellite(&self) -> RefreshOutcome {
        let mut map = self.map.lock().await;
        if *map != MapState::ClusterPresent {
            debug!("No satellite cluster present, skipping reload");
            return RefreshOutcome::Unchanged;
        }
        let seq = self.sequencer(View::Satellite).issue();
        let report = match self.feed.firms().await {
            Ok(report) => report,
            Err(e) => {
                warn!(view = %View::Satellite, "Error reloading FIRMS data, keeping current layer: {}", e);
                return RefreshOutcome::Failed;
            }
        };
        if let Some(outcome) = self.admit(View::Satellite, seq) {
            return outcome;
        }

        self.surface.teardown_cluster();
        *map = MapState::ClusterAbsent;
        info!("Satellite cluster removed for reload");
        self.attach_cluster(&mut map, &report).await;
        RefreshOutcome::Rendered
    }

    /// Inserts `report` into a fresh cluster in batches, yielding between
    /// them, then hands it to the surface.
    async fn attach_cluster(&self, map: &mut MapState, report: &FirmsReport) {
        let mut cluster = SpatialCluster::default();
        let mut batches = report.fires.chunks(SATELLITE_BATCH_SIZE).peekable();
        while let Some(batch) = batches.next() {
            cluster.insert_batch(batch);
            if batches.peek().is_some() {
                tokio::task::yield_now().await;
            }
        }
        self.surface.attach_cluster(&cluster);
        *map = MapState::ClusterPresent;
        info!(
            loaded = cluster.len(),
            dataset = report.count,
            cells = cluster.cell_count(),
            "Loaded satellite fires (clustered)"
        );
    }

    /// Runs every view's schedule until `shutdown` fires. Each tick spawns its
    /// refresh, so a slow read never delays another view.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let start = tokio::time::Instant::now();
        let mut status_tick = interval(self.config.status_every);
        let mut local_tick = interval(self.config.local_every);
        let mut analytics_tick = interval_at(start + self.config.analytics_every, self.config.analytics_every);
        let mut satellite_tick = interval_at(
            start + self.config.satellite_reload_every,
            self.config.satellite_reload_every,
        );
        for tick in [&mut status_tick, &mut local_tick, &mut analytics_tick, &mut satellite_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        self.spawn_refresh(View::Satellite);
        info!("Sync engine started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Sync engine received shutdown signal.");
                    break;
                }
                _ = status_tick.tick() => self.spawn_refresh(View::Status),
                _ = local_tick.tick() => self.spawn_refresh(View::Local),
                _ = analytics_tick.tick() => self.spawn_refresh(View::Analytics),
                _ = satellite_tick.tick() => {
                    let engine = Arc::clone(&self);
                    tokio::spawn(async move {
                        engine.reload_satellite().await;
                    });
                }
            }
        }
    }

    fn spawn_refresh(self: &Arc<Self>, view: View) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = engine.refresh(view).await;
            debug!(view = %view, outcome = %outcome, "Refresh finished");
        });
    }
}
