//! # Firewatch API Server
//!
//! Boots the wildfire detection core and serves its JSON API:
//!
//! 1. Resolves configuration (defaults, `server_firewatch.conf`, env, CLI).
//! 2. Replays the trailing window of the legacy fire log into the event store.
//! 3. Loads the satellite hotspot dataset (an unreadable source yields an
//!    empty dataset, never a failed boot).
//! 4. Serves `/api/status`, `/api/firms` and `/api/local-fires` until Ctrl-C
//!    or SIGTERM, optionally reloading the dataset on a fixed cadence.

use anyhow::{Context, Result};
use lib_firewatch::core::{ConfidenceEstimator, EventStore, UniformConfidence};
use lib_firewatch::http::{build_router, AppState};
use lib_firewatch::ingestors::{
    CsvHotspotSource, FireLog, HotspotSource, IngestionEndpoint, LogHydrator, SatelliteDataset,
};
use lib_firewatch::loggers::setup_logging;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

mod fire_logic;
use fire_logic::config::{self, FileSource};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let (settings, file_source) = config::load_config();
    let _log_guard = setup_logging(&settings.log_dir, &settings.log_level, "server_firewatch")
        .context("Failed to initialize logging")?;

    match &file_source {
        FileSource::Loaded(path) => info!("Loaded config file {}", path.display()),
        FileSource::NotFound(path) => info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            path.display()
        ),
        FileSource::Invalid(path, e) => warn!(
            "Failed to parse config file {}: {}. Falling back to other sources.",
            path.display(),
            e
        ),
    }
    info!(?settings, "Starting server_firewatch");

    let estimator: Arc<dyn ConfidenceEstimator> = Arc::new(UniformConfidence::default());

    let store = Arc::new(EventStore::with_capacity(settings.store_capacity));
    LogHydrator::new(Arc::clone(&estimator))
        .with_window(settings.hydrate_lines)
        .hydrate_into(&settings.fire_log_path, &store);

    let source: Arc<dyn HotspotSource> = Arc::new(CsvHotspotSource::new(&settings.firms_path));
    let dataset = Arc::new(SatelliteDataset::load_or_empty(source.as_ref()));

    let mut ingestion = IngestionEndpoint::new(Arc::clone(&store), estimator);
    if settings.journal_ingested {
        info!(path = %settings.fire_log_path.display(), "Journaling accepted detections");
        ingestion = ingestion.with_journal(Arc::new(FireLog::new(&settings.fire_log_path)));
    }

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let reload_handle = (settings.firms_reload_secs > 0).then(|| {
        tokio::spawn(fire_logic::reload::run(
            Arc::clone(&dataset),
            source,
            Duration::from_secs(settings.firms_reload_secs),
            shutdown_tx.subscribe(),
        ))
    });

    let app = build_router(AppState::new(dataset, Arc::new(ingestion)));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    let signal_tx = shutdown_tx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signal_tx.send(());
        })
        .await
        .context("HTTP server failed")?;

    if let Some(handle) = reload_handle {
        let _ = handle.await;
    }

    info!("Shutdown complete.");
    Ok(())
}

/// Completes on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, initiating shutdown."),
        _ = terminate => info!("SIGTERM received, initiating shutdown."),
    }
}
