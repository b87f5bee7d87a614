//! # Firewatch Dashboard
//!
//! Headless viewer. Runs the client sync engine against a Firewatch server and
//! renders every view to the log: status cards, the local detection list,
//! map actions (cluster layer, markers, recentring) and the trend chart.

use anyhow::{Context, Result};
use clap::Parser;
use lib_firewatch::core::SpatialCluster;
use lib_firewatch::loggers::setup_logging;
use lib_firewatch::model::{FireEvent, StatusReport, View};
use lib_firewatch::retrieve::HttpFireFeed;
use lib_firewatch::sync::{ClientSyncEngine, DisplaySurface, SyncConfig};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// # Dashboard Configuration
#[derive(Parser, Debug)]
#[clap(author, version, about = "Headless Firewatch dashboard rendering to the log.")]
struct DashboardConfig {
    /// Base URL of the Firewatch server.
    #[clap(long, env = "FIREWATCH_SERVER_URL", default_value = "http://127.0.0.1:3000/")]
    server_url: String,

    #[clap(long, env = "FIREWATCH_LOG_DIR", default_value = "./logs")]
    log_dir: PathBuf,

    #[clap(long, env = "FIREWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Views to mount (status, local, analytics, satellite).
    #[clap(long, value_delimiter = ',', default_value = "status,local,analytics,satellite")]
    views: Vec<String>,

    #[clap(long, default_value_t = 4)]
    status_every_secs: u64,
    #[clap(long, default_value_t = 3)]
    status_gate_secs: u64,
    #[clap(long, default_value_t = 3)]
    local_every_secs: u64,
    #[clap(long, default_value_t = 2)]
    local_gate_secs: u64,
    #[clap(long, default_value_t = 6)]
    analytics_every_secs: u64,
    #[clap(long, default_value_t = 4)]
    analytics_gate_secs: u64,
    #[clap(long, default_value_t = 300)]
    satellite_reload_secs: u64,
}

impl DashboardConfig {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            status_every: Duration::from_secs(self.status_every_secs),
            status_gate: Duration::from_secs(self.status_gate_secs),
            local_every: Duration::from_secs(self.local_every_secs),
            local_gate: Duration::from_secs(self.local_gate_secs),
            analytics_every: Duration::from_secs(self.analytics_every_secs),
            analytics_gate: Duration::from_secs(self.analytics_gate_secs),
            satellite_reload_every: Duration::from_secs(self.satellite_reload_secs),
        }
    }

    fn mounted_views(&self) -> Result<HashSet<View>> {
        self.views
            .iter()
            .map(|name| {
                serde_json::from_value::<View>(serde_json::Value::String(name.trim().to_lowercase()))
                    .with_context(|| format!("Unknown view `{}`", name))
            })
            .collect()
    }
}

/// Renders to `tracing` under the `dashboard` target.
struct LogSurface {
    mounted: HashSet<View>,
    charts_built: AtomicU64,
}

impl DisplaySurface for LogSurface {
    fn is_mounted(&self, view: View) -> bool {
        self.mounted.contains(&view)
    }

    fn render_status(&self, report: &StatusReport) {
        info!(
            target: "dashboard",
            "System: {} | Satellite Fires: {} | Local Fires: {}",
            report.system, report.satellite_points, report.local_points
        );
    }

    fn init_map(&self) {
        info!(target: "dashboard", "Map initialized at (20, 78), zoom 5");
    }

    fn attach_cluster(&self, cluster: &SpatialCluster) {
        let top: Vec<String> = cluster
            .summaries()
            .iter()
            .take(3)
            .map(|c| format!("{} @ ({:.2}, {:.2})", c.count, c.lat, c.lon))
            .collect();
        info!(
            target: "dashboard",
            "Satellite layer: {} fires in {} clusters, largest: [{}]",
            cluster.len(),
            cluster.cell_count(),
            top.join(", ")
        );
    }

    fn teardown_cluster(&self) {
        info!(target: "dashboard", "Satellite layer removed");
    }

    fn replace_local_markers(&self, events: &[FireEvent]) {
        info!(target: "dashboard", "Local markers redrawn: {}", events.len());
    }

    fn recenter(&self, lat: f64, lon: f64) {
        info!(target: "dashboard", "Map recentred on ({:.5}, {:.5}), zoom 13", lat, lon);
    }

    fn replace_list(&self, entries: &[String]) {
        info!(target: "dashboard", "Detections list ({} entries)", entries.len());
        for entry in entries {
            info!(target: "dashboard", "  {}", entry);
        }
    }

    fn teardown_chart(&self) {}

    fn draw_chart(&self, values: &[u64]) {
        let built = self.charts_built.fetch_add(1, Ordering::Relaxed) + 1;
        info!(target: "dashboard", chart = built, "Local detections trend: {:?}", values);
    }

    fn render_totals(&self, satellite_points: usize, local_points: u64) {
        info!(
            target: "dashboard",
            "Satellite Fires: {} | Local Detections: {}",
            satellite_points, local_points
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = DashboardConfig::parse();
    let _log_guard = setup_logging(&config.log_dir, &config.log_level, "firewatch_dashboard")
        .context("Failed to initialize logging")?;

    let feed = HttpFireFeed::new(&config.server_url)
        .with_context(|| format!("Invalid server URL {}", config.server_url))?;
    let surface = LogSurface {
        mounted: config.mounted_views()?,
        charts_built: AtomicU64::new(0),
    };
    let engine = Arc::new(ClientSyncEngine::new(
        Arc::new(feed),
        Arc::new(surface),
        config.sync_config(),
    ));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let engine_handle = tokio::spawn(Arc::clone(&engine).run(shutdown_tx.subscribe()));
    info!("Dashboard polling {}", config.server_url);

    signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("Ctrl-C received, initiating shutdown.");
    let _ = shutdown_tx.send(());
    let _ = engine_handle.await;

    info!("Shutdown complete.");
    Ok(())
}
